use serde::{Deserialize, Serialize};

use crate::{Accessor, FieldDescriptor, FieldRole, FilterSpec, Record, RecordKind};

/// Authored content: ownership is carried by the `author` role.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub contents: String,
}

static POST_FIELDS: [FieldDescriptor<Post>; 3] = [
    FieldDescriptor {
        column: "id",
        roles: &[FieldRole::Identity],
        accessor: Accessor::Integer {
            get: |post| post.id,
            set: |post, value| post.id = value,
        },
    },
    FieldDescriptor {
        column: "author_id",
        roles: &[FieldRole::Author],
        accessor: Accessor::Integer {
            get: |post| post.author_id,
            set: |post, value| post.author_id = value,
        },
    },
    FieldDescriptor {
        column: "contents",
        roles: &[],
        accessor: Accessor::Text {
            get: |post| post.contents.as_str(),
            set: |post, value| post.contents = value,
        },
    },
];

static POST_FILTERS: [FilterSpec; 2] = [
    FilterSpec::equals_any_of("byAuthorId", "author_id"),
    FilterSpec::contains("byContentContains", "contents"),
];

impl Record for Post {
    const KIND: RecordKind = RecordKind::Post;
    const TABLE: &'static str = "posts";

    fn fields() -> &'static [FieldDescriptor<Self>] {
        &POST_FIELDS
    }

    fn filters() -> &'static [FilterSpec] {
        &POST_FILTERS
    }

    fn validate(&self) -> bool {
        !self.contents.is_empty()
    }
}

use serde::{Deserialize, Serialize};

use crate::{Accessor, FieldDescriptor, FieldRole, Record, RecordKind};

/// Self-owned: the identity column doubles as the ownership column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub guid: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

static USER_FIELDS: [FieldDescriptor<User>; 5] = [
    FieldDescriptor {
        column: "id",
        roles: &[FieldRole::Identity, FieldRole::Owner],
        accessor: Accessor::Integer {
            get: |user| user.id,
            set: |user, value| user.id = value,
        },
    },
    FieldDescriptor {
        column: "guid",
        roles: &[FieldRole::ExternalKey],
        accessor: Accessor::Text {
            get: |user| user.guid.as_str(),
            set: |user, value| user.guid = value,
        },
    },
    FieldDescriptor {
        column: "name",
        roles: &[],
        accessor: Accessor::Text {
            get: |user| user.name.as_str(),
            set: |user, value| user.name = value,
        },
    },
    FieldDescriptor {
        column: "email",
        roles: &[],
        accessor: Accessor::Text {
            get: |user| user.email.as_str(),
            set: |user, value| user.email = value,
        },
    },
    FieldDescriptor {
        column: "picture",
        roles: &[],
        accessor: Accessor::Text {
            get: |user| user.picture.as_str(),
            set: |user, value| user.picture = value,
        },
    },
];

impl Record for User {
    const KIND: RecordKind = RecordKind::User;
    const TABLE: &'static str = "users";

    fn fields() -> &'static [FieldDescriptor<Self>] {
        &USER_FIELDS
    }

    fn validate(&self) -> bool {
        !self.name.is_empty() && !self.guid.is_empty()
    }
}

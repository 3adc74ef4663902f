use serde::{Deserialize, Serialize};

use crate::{Accessor, FieldDescriptor, FieldRole, FilterSpec, Record, RecordKind};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub id: i64,
    pub owner_id: i64,
    pub contents: String,
}

static NOTE_FIELDS: [FieldDescriptor<Note>; 3] = [
    FieldDescriptor {
        column: "id",
        roles: &[FieldRole::Identity],
        accessor: Accessor::Integer {
            get: |note| note.id,
            set: |note, value| note.id = value,
        },
    },
    FieldDescriptor {
        column: "owner_id",
        roles: &[FieldRole::Owner],
        accessor: Accessor::Integer {
            get: |note| note.owner_id,
            set: |note, value| note.owner_id = value,
        },
    },
    FieldDescriptor {
        column: "contents",
        roles: &[],
        accessor: Accessor::Text {
            get: |note| note.contents.as_str(),
            set: |note, value| note.contents = value,
        },
    },
];

static NOTE_FILTERS: [FilterSpec; 2] = [
    FilterSpec::equals_any_of("byOwnerId", "owner_id"),
    FilterSpec::contains("byContentContains", "contents"),
];

impl Record for Note {
    const KIND: RecordKind = RecordKind::Note;
    const TABLE: &'static str = "notes";

    fn fields() -> &'static [FieldDescriptor<Self>] {
        &NOTE_FIELDS
    }

    fn filters() -> &'static [FilterSpec] {
        &NOTE_FILTERS
    }

    fn validate(&self) -> bool {
        !self.contents.is_empty()
    }
}

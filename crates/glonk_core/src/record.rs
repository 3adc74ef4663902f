use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::records::{Note, Post, User};
use crate::{FieldDescriptor, FilterSpec, GlonkError, GlonkResult, KindMeta};

/// A persisted record kind with a static field descriptor table.
pub trait Record:
    RecordVariant
    + Clone
    + fmt::Debug
    + Default
    + PartialEq
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: RecordKind;
    const TABLE: &'static str;

    fn fields() -> &'static [FieldDescriptor<Self>];

    fn filters() -> &'static [FilterSpec] {
        &[]
    }

    /// Payload check applied before create and update.
    fn validate(&self) -> bool;
}

/// Conversions between a concrete record and [`AnyRecord`].
pub trait RecordVariant: Sized + Into<AnyRecord> {
    fn peel(record: &AnyRecord) -> Option<&Self>;
    fn peel_mut(record: &mut AnyRecord) -> Option<&mut Self>;
    fn from_any(record: AnyRecord) -> Option<Self>;
}

macro_rules! record_kinds {
    ($($variant:ident($ty:ty) => $name:literal),+ $(,)?) => {
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum RecordKind {
            $($variant),+
        }

        impl RecordKind {
            pub const ALL: &'static [RecordKind] = &[$(RecordKind::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(RecordKind::$variant => $name),+
                }
            }

            pub(crate) fn describe(self) -> GlonkResult<KindMeta> {
                match self {
                    $(RecordKind::$variant => KindMeta::describe::<$ty>()),+
                }
            }
        }

        #[derive(Clone, Debug, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum AnyRecord {
            $($variant($ty)),+
        }

        impl AnyRecord {
            pub fn kind(&self) -> RecordKind {
                match self {
                    $(AnyRecord::$variant(_) => RecordKind::$variant),+
                }
            }

            pub fn validate(&self) -> bool {
                match self {
                    $(AnyRecord::$variant(record) => record.validate()),+
                }
            }
        }

        $(
            impl From<$ty> for AnyRecord {
                fn from(record: $ty) -> Self {
                    AnyRecord::$variant(record)
                }
            }

            impl RecordVariant for $ty {
                fn peel(record: &AnyRecord) -> Option<&Self> {
                    match record {
                        AnyRecord::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn peel_mut(record: &mut AnyRecord) -> Option<&mut Self> {
                    match record {
                        AnyRecord::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_any(record: AnyRecord) -> Option<Self> {
                    match record {
                        AnyRecord::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )+
    };
}

record_kinds! {
    Note(Note) => "note",
    User(User) => "user",
    Post(Post) => "post",
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = GlonkError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| GlonkError::not_found(format!("unknown record kind '{value}'")))
    }
}

//! Record ⇄ row conversion and sparse update extraction.

use crate::{GlonkError, GlonkResult, KindMeta, Record, Value};

pub type Row = Vec<Value>;

/// Values of `record` in the canonical column order of `meta`.
///
/// A self-owned kind contributes its identity once; the collapsed ownership
/// value is not repeated.
pub fn to_row<R: Record>(meta: &KindMeta, record: &R) -> Row {
    let descriptors = R::fields();
    meta.fields()
        .iter()
        .map(|field| descriptors[field.source].read(record))
        .collect()
}

/// Scans one relational row back into a fresh `R`.
pub fn from_row<R: Record>(meta: &KindMeta, columns: &[&str], values: Row) -> GlonkResult<R> {
    if columns.len() != values.len() {
        return Err(GlonkError::decode(format!(
            "{}: {} columns but {} values",
            meta.kind(),
            columns.len(),
            values.len()
        )));
    }
    if columns.len() != meta.fields().len() {
        return Err(GlonkError::decode(format!(
            "{}: expected {} columns, got {}",
            meta.kind(),
            meta.fields().len(),
            columns.len()
        )));
    }
    let descriptors = R::fields();
    let mut record = R::default();
    for (index, (column, value)) in columns.iter().zip(values).enumerate() {
        let field = meta.field(column).ok_or_else(|| {
            GlonkError::decode(format!("{}: unknown column '{column}'", meta.kind()))
        })?;
        // Equal counts plus no repeats makes `columns` a permutation.
        if columns[..index].contains(column) {
            return Err(GlonkError::decode(format!(
                "{}: column '{column}' appears more than once",
                meta.kind()
            )));
        }
        descriptors[field.source].write(&mut record, value)?;
    }
    Ok(record)
}

/// Non-empty columns of a record, in canonical column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseUpdate {
    entries: Vec<(&'static str, Value)>,
}

impl SparseUpdate {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(column, value)| (*column, value))
    }

    /// Drops the given columns, e.g. identity and ownership before a SET clause.
    pub fn without(mut self, columns: &[&str]) -> Self {
        self.entries.retain(|(column, _)| !columns.contains(column));
        self
    }
}

pub fn sparse_fields<R: Record>(meta: &KindMeta, record: &R) -> SparseUpdate {
    let entries = meta
        .columns()
        .into_iter()
        .zip(to_row(meta, record))
        .filter(|(_, value)| !value.is_empty())
        .collect();
    SparseUpdate { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Note, Post, User};
    use crate::Registry;
    use proptest::prelude::*;

    fn registry() -> Registry {
        Registry::new().expect("registry")
    }

    #[test]
    fn note_row_is_identity_owner_then_plain() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::Note);
        let note = Note {
            id: 3,
            owner_id: 7,
            contents: "hello".into(),
        };
        assert_eq!(
            to_row(meta, &note),
            vec![Value::Integer(3), Value::Integer(7), Value::from("hello")]
        );
    }

    #[test]
    fn self_owned_row_collapses_ownership() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::User);
        let user = User {
            id: 9,
            guid: "google/1".into(),
            name: "Shane".into(),
            email: "s@example.com".into(),
            picture: String::new(),
        };
        let row = to_row(meta, &user);
        assert_eq!(row.len(), 5);
        assert_eq!(row[0], Value::Integer(9));

        let columns = meta.columns();
        let decoded: User = from_row(meta, &columns, row).expect("decode");
        assert_eq!(decoded, user);
        let any = decoded.into();
        assert_eq!(meta.owner_of(&any).expect("owner"), 9);
    }

    #[test]
    fn from_row_rejects_count_mismatch() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::Note);
        let err = from_row::<Note>(meta, &["id", "owner_id"], vec![Value::Integer(1)]).unwrap_err();
        assert!(matches!(err, GlonkError::Decode { .. }));
        let err = from_row::<Note>(
            meta,
            &["id", "owner_id"],
            vec![Value::Integer(1), Value::Integer(2)],
        )
        .unwrap_err();
        assert!(matches!(err, GlonkError::Decode { .. }));
    }

    #[test]
    fn from_row_rejects_repeated_columns() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::Note);
        let err = from_row::<Note>(
            meta,
            &["id", "id", "contents"],
            vec![Value::Integer(1), Value::Integer(2), Value::from("c")],
        )
        .unwrap_err();
        assert!(matches!(err, GlonkError::Decode { .. }));

        let shuffled: Note = from_row(
            meta,
            &["contents", "id", "owner_id"],
            vec![Value::from("c"), Value::Integer(1), Value::Integer(2)],
        )
        .expect("permuted columns decode");
        assert_eq!(shuffled.owner_id, 2);
    }

    #[test]
    fn from_row_rejects_type_mismatch() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::Note);
        let err = from_row::<Note>(
            meta,
            &["id", "owner_id", "contents"],
            vec![Value::Integer(1), Value::Float(2.0), Value::from("x")],
        )
        .unwrap_err();
        assert!(matches!(err, GlonkError::Decode { .. }));
    }

    #[test]
    fn from_row_treats_null_as_zero_value() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::User);
        let decoded: User = from_row(
            meta,
            &["id", "guid", "name", "email", "picture"],
            vec![
                Value::Integer(1),
                Value::from("g"),
                Value::from("n"),
                Value::Null,
                Value::Null,
            ],
        )
        .expect("decode");
        assert_eq!(decoded.email, "");
        assert_eq!(decoded.picture, "");
    }

    #[test]
    fn sparse_fields_of_empty_record_is_empty() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::Note);
        assert!(sparse_fields(meta, &Note::default()).is_empty());
    }

    #[test]
    fn sparse_fields_with_one_value_is_singleton() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::Post);
        let post = Post {
            contents: "only".into(),
            ..Post::default()
        };
        let sparse = sparse_fields(meta, &post);
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse.get("contents"), Some(&Value::from("only")));
        assert!(!sparse.contains("id"));
    }

    #[test]
    fn sparse_without_drops_scope_columns() {
        let registry = registry();
        let meta = registry.meta(crate::RecordKind::Note);
        let note = Note {
            id: 1,
            owner_id: 2,
            contents: "c".into(),
        };
        let sparse = sparse_fields(meta, &note).without(&["id", "owner_id"]);
        let columns: Vec<_> = sparse.iter().map(|(column, _)| column).collect();
        assert_eq!(columns, vec!["contents"]);
    }

    proptest! {
        #[test]
        fn note_roundtrips(id in any::<i64>(), owner_id in any::<i64>(), contents in ".{0,40}") {
            let registry = registry();
            let meta = registry.meta(crate::RecordKind::Note);
            let note = Note { id, owner_id, contents };
            let decoded: Note = from_row(meta, &meta.columns(), to_row(meta, &note)).unwrap();
            prop_assert_eq!(decoded, note);
        }

        #[test]
        fn post_roundtrips(id in any::<i64>(), author_id in any::<i64>(), contents in ".{0,40}") {
            let registry = registry();
            let meta = registry.meta(crate::RecordKind::Post);
            let post = Post { id, author_id, contents };
            let decoded: Post = from_row(meta, &meta.columns(), to_row(meta, &post)).unwrap();
            prop_assert_eq!(decoded, post);
        }

        #[test]
        fn user_roundtrips(
            id in any::<i64>(),
            guid in "[a-z]{1,8}/[0-9]{1,6}",
            name in ".{0,20}",
            email in ".{0,20}",
            picture in ".{0,20}",
        ) {
            let registry = registry();
            let meta = registry.meta(crate::RecordKind::User);
            let user = User { id, guid, name, email, picture };
            let decoded: User = from_row(meta, &meta.columns(), to_row(meta, &user)).unwrap();
            prop_assert_eq!(decoded, user);
        }
    }
}

//! Field descriptors and the metadata introspector.
//!
//! Every record kind declares a static table of [`FieldDescriptor`]s. A
//! descriptor names the column, carries the role tags for that field and a
//! typed accessor pair. Fields that have no descriptor are never persisted.

use serde::Serialize;

use crate::{GlonkError, GlonkResult, Value, ValueType};

/// Role tags a field can carry. A plain field carries none.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Identity,
    Owner,
    Author,
    ExternalKey,
}

/// The two boundary names for the ownership concept.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipRole {
    Owner,
    Author,
}

impl OwnershipRole {
    pub fn field_role(self) -> FieldRole {
        match self {
            OwnershipRole::Owner => FieldRole::Owner,
            OwnershipRole::Author => FieldRole::Author,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Ownership {
    pub column: &'static str,
    pub role: OwnershipRole,
}

/// Typed read/write access to one field of `R`.
pub enum Accessor<R> {
    Integer {
        get: fn(&R) -> i64,
        set: fn(&mut R, i64),
    },
    Float {
        get: fn(&R) -> f64,
        set: fn(&mut R, f64),
    },
    Text {
        get: fn(&R) -> &str,
        set: fn(&mut R, String),
    },
}

pub struct FieldDescriptor<R> {
    pub column: &'static str,
    pub roles: &'static [FieldRole],
    pub accessor: Accessor<R>,
}

impl<R> FieldDescriptor<R> {
    pub fn value_type(&self) -> ValueType {
        match self.accessor {
            Accessor::Integer { .. } => ValueType::Integer,
            Accessor::Float { .. } => ValueType::Float,
            Accessor::Text { .. } => ValueType::Text,
        }
    }

    pub fn has_role(&self, role: FieldRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn read(&self, record: &R) -> Value {
        match &self.accessor {
            Accessor::Integer { get, .. } => Value::Integer(get(record)),
            Accessor::Float { get, .. } => Value::Float(get(record)),
            Accessor::Text { get, .. } => Value::Text(get(record).to_string()),
        }
    }

    /// Stores `value` into the field. `Null` resets the field to its zero value.
    pub fn write(&self, record: &mut R, value: Value) -> GlonkResult<()> {
        match (&self.accessor, value) {
            (Accessor::Integer { set, .. }, Value::Integer(value)) => set(record, value),
            (Accessor::Integer { set, .. }, Value::Null) => set(record, 0),
            (Accessor::Float { set, .. }, Value::Float(value)) => set(record, value),
            (Accessor::Float { set, .. }, Value::Null) => set(record, 0.0),
            (Accessor::Text { set, .. }, Value::Text(value)) => set(record, value),
            (Accessor::Text { set, .. }, Value::Null) => set(record, String::new()),
            (_, other) => {
                return Err(GlonkError::decode(format!(
                    "column '{}' expects {} but got {:?}",
                    self.column,
                    self.value_type(),
                    other
                )));
            }
        }
        Ok(())
    }
}

/// Type-erased view of one persisted field.
#[derive(Clone, Debug, Serialize)]
pub struct FieldMeta {
    pub column: &'static str,
    pub roles: &'static [FieldRole],
    pub value_type: ValueType,
    #[serde(skip)]
    pub(crate) source: usize,
}

impl FieldMeta {
    pub fn has_role(&self, role: FieldRole) -> bool {
        self.roles.contains(&role)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

/// Validates the descriptor table of `kind` and returns its persisted fields in
/// canonical order: identity, ownership when distinct, then the remaining
/// fields in declaration order.
pub fn describe<R>(kind: &str, descriptors: &[FieldDescriptor<R>]) -> GlonkResult<Vec<FieldMeta>> {
    for (index, descriptor) in descriptors.iter().enumerate() {
        if !is_identifier(descriptor.column) {
            return Err(GlonkError::schema(format!(
                "{kind}: '{}' is not a valid column name",
                descriptor.column
            )));
        }
        if let Some(previous) = descriptors[..index]
            .iter()
            .position(|other| other.column == descriptor.column)
        {
            return Err(GlonkError::schema(format!(
                "{kind}: fields {previous} and {index} share the column name '{}'",
                descriptor.column
            )));
        }
    }

    let identity = single_with_role(kind, descriptors, &[FieldRole::Identity])?
        .ok_or_else(|| GlonkError::schema(format!("{kind}: no identity field")))?;
    let ownership = single_with_role(kind, descriptors, &[FieldRole::Owner, FieldRole::Author])?;
    let external_key = single_with_role(kind, descriptors, &[FieldRole::ExternalKey])?;

    expect_type(kind, &descriptors[identity], ValueType::Integer)?;
    if let Some(ownership) = ownership {
        expect_type(kind, &descriptors[ownership], ValueType::Integer)?;
    }
    if let Some(external_key) = external_key {
        expect_type(kind, &descriptors[external_key], ValueType::Text)?;
    }

    let mut order = vec![identity];
    if let Some(ownership) = ownership.filter(|ownership| *ownership != identity) {
        order.push(ownership);
    }
    let rest: Vec<usize> = (0..descriptors.len())
        .filter(|index| !order.contains(index))
        .collect();
    order.extend(rest);

    Ok(order
        .into_iter()
        .map(|source| {
            let descriptor = &descriptors[source];
            FieldMeta {
                column: descriptor.column,
                roles: descriptor.roles,
                value_type: descriptor.value_type(),
                source,
            }
        })
        .collect())
}

pub fn identity_column<R>(kind: &str, descriptors: &[FieldDescriptor<R>]) -> GlonkResult<&'static str> {
    let index = single_with_role(kind, descriptors, &[FieldRole::Identity])?
        .ok_or_else(|| GlonkError::schema(format!("{kind}: no identity field")))?;
    Ok(descriptors[index].column)
}

/// Looks for an `owner` field first and falls back to `author`.
pub fn ownership_column<R>(kind: &str, descriptors: &[FieldDescriptor<R>]) -> GlonkResult<Ownership> {
    for role in [OwnershipRole::Owner, OwnershipRole::Author] {
        if let Some(descriptor) = descriptors
            .iter()
            .find(|descriptor| descriptor.has_role(role.field_role()))
        {
            return Ok(Ownership {
                column: descriptor.column,
                role,
            });
        }
    }
    Err(GlonkError::not_found(format!("{kind}: no ownership field")))
}

fn single_with_role<R>(
    kind: &str,
    descriptors: &[FieldDescriptor<R>],
    roles: &[FieldRole],
) -> GlonkResult<Option<usize>> {
    let mut found: Option<usize> = None;
    for (index, descriptor) in descriptors.iter().enumerate() {
        if !roles.iter().any(|role| descriptor.has_role(*role)) {
            continue;
        }
        if let Some(previous) = found {
            return Err(GlonkError::schema(format!(
                "{kind}: columns '{}' and '{}' both carry role {:?}",
                descriptors[previous].column, descriptor.column, roles
            )));
        }
        found = Some(index);
    }
    Ok(found)
}

fn expect_type<R>(kind: &str, descriptor: &FieldDescriptor<R>, expected: ValueType) -> GlonkResult<()> {
    if descriptor.value_type() != expected {
        return Err(GlonkError::schema(format!(
            "{kind}: column '{}' must be {expected}, declared {}",
            descriptor.column,
            descriptor.value_type()
        )));
    }
    Ok(())
}

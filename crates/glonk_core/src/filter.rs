//! Composable filter predicates.
//!
//! Builders turn raw query-string values into a [`Filter`]; a filter renders to
//! a backend-neutral [`Clause`] with `@name` placeholders. Translating the
//! placeholders into native markers is the compiler's job.

use std::collections::HashMap;

use serde::Serialize;

use crate::{GlonkError, GlonkResult, Value};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    EqualsAnyOf,
    Contains,
}

/// A named filter builder bound to one column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct FilterSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
}

impl FilterSpec {
    pub const fn equals_any_of(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: FilterKind::EqualsAnyOf,
        }
    }

    pub const fn contains(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: FilterKind::Contains,
        }
    }

    pub fn build<S: AsRef<str>>(&self, raw: &[S]) -> GlonkResult<Filter> {
        match self.kind {
            FilterKind::EqualsAnyOf => Filter::equals_any_of(self.column, raw),
            FilterKind::Contains => Filter::contains(self.column, raw),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    EqualsAnyOf { column: &'static str, ids: Vec<i64> },
    Contains { column: &'static str, needle: String },
}

/// Rendered predicate: SQL text with `@name` placeholders and their values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clause {
    pub sql: String,
    pub args: HashMap<String, Value>,
}

impl Filter {
    /// Each raw value may hold several `|`-separated integer ids.
    pub fn equals_any_of<S: AsRef<str>>(column: &'static str, raw: &[S]) -> GlonkResult<Self> {
        if raw.is_empty() {
            return Err(GlonkError::arity(format!(
                "{column}: expected at least one value"
            )));
        }
        let mut ids = Vec::new();
        for value in raw {
            for token in value.as_ref().split('|') {
                let id = token.trim().parse::<i64>().map_err(|err| {
                    GlonkError::parse(format!("{column}: '{token}' is not an integer: {err}"))
                })?;
                ids.push(id);
            }
        }
        Ok(Filter::EqualsAnyOf { column, ids })
    }

    pub fn contains<S: AsRef<str>>(column: &'static str, raw: &[S]) -> GlonkResult<Self> {
        match raw {
            [needle] => Ok(Filter::Contains {
                column,
                needle: needle.as_ref().to_string(),
            }),
            _ => Err(GlonkError::arity(format!(
                "{column}: expected exactly one value, got {}",
                raw.len()
            ))),
        }
    }

    pub fn render(&self) -> Clause {
        match self {
            Filter::EqualsAnyOf { column, ids } => {
                let mut terms = Vec::with_capacity(ids.len());
                let mut args = HashMap::with_capacity(ids.len());
                for (index, id) in ids.iter().enumerate() {
                    let name = format!("{column}Id{index}");
                    terms.push(format!("{column} = @{name}"));
                    args.insert(name, Value::Integer(*id));
                }
                Clause {
                    sql: terms.join(" OR "),
                    args,
                }
            }
            Filter::Contains { column, needle } => {
                let name = format!("{column}Contains");
                let mut args = HashMap::with_capacity(1);
                args.insert(name.clone(), Value::Text(format!("%{needle}%")));
                Clause {
                    sql: format!("{column} LIKE @{name}"),
                    args,
                }
            }
        }
    }
}

/// Builds every filter named in `raw` that `specs` knows about.
///
/// Malformed input and unknown names are logged and skipped so the rest of the
/// query still runs.
pub fn build_filters(specs: &[FilterSpec], raw: &HashMap<String, Vec<String>>) -> Vec<Filter> {
    for name in raw.keys() {
        if !specs.iter().any(|spec| spec.name == name) {
            log::debug!("ignoring unknown filter '{name}'");
        }
    }
    let mut filters = Vec::new();
    for spec in specs {
        let Some(values) = raw.get(spec.name) else {
            continue;
        };
        match spec.build(values) {
            Ok(filter) => filters.push(filter),
            Err(err) if err.is_filter_input() => {
                log::warn!("skipping filter '{}': {err}", spec.name);
            }
            Err(err) => {
                log::error!("filter '{}' failed: {err}", spec.name);
            }
        }
    }
    filters
}

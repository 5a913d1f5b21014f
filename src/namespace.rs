//! The resolved namespace and its display forms.

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::flatten;
use crate::types::display_value;

/// One resolved value per root argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    values: IndexMap<String, Value>,
}

impl Namespace {
    pub(crate) fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// Materialize root `name` as `T`.
    ///
    /// Polymorphic fields deserialize through `#[serde(tag = "__cls__")]`
    /// enums whose variant names are the schema names.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ConfigError::RootNotFound(name.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|source| ConfigError::Materialize {
            name: name.to_string(),
            source,
        })
    }

    /// The raw resolved value of root `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values.into_iter().collect::<Map<String, Value>>())
    }

    /// Every resolved key as a dotted path, selected types included.
    pub fn listing(&self) -> Listing {
        let entries = self
            .values
            .iter()
            .flat_map(|(name, value)| flatten::flatten(name, value))
            .collect();
        Listing { entries }
    }
}

/// Flattened `key = value` view of a [`Namespace`].
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    entries: Vec<(String, Value)>,
}

impl Listing {
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match value {
                Value::Null => write!(f, "{key} = None")?,
                other => write!(f, "{key} = {}", display_value(other))?,
            }
        }
        Ok(())
    }
}

/// Result of [`TreeParser::handle`](crate::TreeParser::handle).
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveResult {
    Resolved(Namespace),
    Listing(Listing),
}

impl fmt::Display for ResolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveResult::Resolved(ns) => {
                let names: Vec<&str> = ns.names().collect();
                write!(f, "Resolved {}", names.join(", "))
            }
            ResolveResult::Listing(listing) => write!(f, "{listing}"),
        }
    }
}

//! Default cascading and instantiation of the finished parameter tree.
//!
//! The tree is walked bottom-up. Each record merges the user's values with
//! the fields of its default instance, as long as the default's type is the
//! resolved type or one of its supertypes, and then with the declared field
//! defaults. Required fields still missing are collected across the whole
//! tree and reported in one error.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::describe::{self, FieldDescriptor};
use crate::error::ConfigError;
use crate::grammar::{Grammar, join};
use crate::merge;
use crate::tree::{NodeId, Resolved, StructNode};
use crate::types::{ContainerKind, Mode, TYPE_TAG};

/// Build the value of every root.
pub(crate) fn instantiate(
    grammar: &Grammar<'_>,
    ignore_required: bool,
) -> Result<IndexMap<String, Value>, ConfigError> {
    let mut cascade = Cascade {
        grammar,
        ignore_required,
        missing: Vec::new(),
    };
    let mut values = IndexMap::new();
    for (name, &id) in grammar.tree.roots() {
        values.insert(name.clone(), cascade.node(id)?);
    }
    if !cascade.missing.is_empty() {
        return Err(ConfigError::RequiredArgument {
            flags: cascade.missing,
        });
    }
    Ok(values)
}

struct Cascade<'g, 'r> {
    grammar: &'g Grammar<'r>,
    ignore_required: bool,
    missing: Vec<String>,
}

impl Cascade<'_, '_> {
    fn node(&mut self, id: NodeId) -> Result<Value, ConfigError> {
        let grammar = self.grammar;
        let node = grammar.tree.node(id);
        match &node.resolved {
            Resolved::Null => Ok(Value::Null),
            Resolved::Pending => {
                if grammar
                    .unresolved
                    .get(&node.flag)
                    .is_some_and(|entry| !entry.override_missing)
                {
                    self.missing.push(format!("--{}", node.flag));
                }
                Ok(node.default.clone().unwrap_or(Value::Null))
            }
            Resolved::Aggregate(kind) => {
                let values = grammar.tree.collect_all_values(id, |child| self.node(child))?;
                match kind {
                    ContainerKind::Dict => Ok(Value::Object(values)),
                    _ => {
                        let mut items: Vec<Value> = Vec::with_capacity(values.len());
                        for value in values.into_values() {
                            if *kind == ContainerKind::Set && items.contains(&value) {
                                continue;
                            }
                            items.push(value);
                        }
                        Ok(Value::Array(items))
                    }
                }
            }
            Resolved::Record(ty) => self.record(id, ty),
        }
    }

    fn record(&mut self, id: NodeId, ty: &str) -> Result<Value, ConfigError> {
        let grammar = self.grammar;
        let registry = grammar.registry();
        let node = grammar.tree.node(id);
        let mut merged = grammar.tree.collect_all_values(id, |child| self.node(child))?;
        let fields = describe::describe(registry, ty, false)?;

        if let Some(Value::Object(default)) = &node.default {
            let declared = node.field.record().unwrap_or(ty);
            let default_class = default
                .get(TYPE_TAG)
                .and_then(Value::as_str)
                .and_then(|reference| registry.lookup(reference))
                .map_or(declared, |schema| schema.name());
            if registry.is_subtype(ty, default_class) {
                merge::fill_missing(&mut merged, default, |key| {
                    fields.iter().any(|f| f.name == key)
                });
            } else {
                debug!(
                    flag = %node.flag,
                    selected = ty,
                    default_type = default_class,
                    "default instance is not compatible, skipping"
                );
            }
        }

        for field in &fields {
            if merged.contains_key(&field.name) {
                continue;
            }
            if field.required || (field.meta.required && !self.ignore_required) {
                self.missing.push(format!("--{}", field_flag(node, field)));
            }
        }

        let mut out = Map::new();
        out.insert(TYPE_TAG.to_string(), Value::String(ty.to_string()));
        for field in &fields {
            if let Some(value) = merged.remove(&field.name).or_else(|| field.default.clone()) {
                out.insert(field.name.clone(), value);
            }
        }
        Ok(Value::Object(out))
    }
}

/// Flag path a field of `node` is, or would be, exposed at.
fn field_flag(node: &StructNode, field: &FieldDescriptor) -> String {
    if let Some(flag) = node.leaves.get(&field.name).and_then(|leaf| leaf.flag.clone()) {
        return flag;
    }
    match field.meta.mode {
        Mode::Flat | Mode::SSnake => field.name.clone(),
        Mode::Snake | Mode::Ignore => join(&node.prefix, field.meta.separator, &field.name),
    }
}

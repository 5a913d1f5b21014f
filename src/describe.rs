//! Schema introspection: turn a schema's declared fields into flat
//! [`FieldDescriptor`]s.
//!
//! Each declared [`TypeExpr`] is peeled in a fixed order: the optional
//! wrapper, then a list/set or dict container, then the element itself (a
//! primitive, an enum, or a record reference). Type parameters resolve to
//! their bound at every step. Combinations the engine can not expose on a
//! command line are rejected here as schema errors.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::{Field, FieldMeta, Registry};
use crate::types::{Choices, ContainerKind, EnumSpec, Mode, Primitive, TypeExpr};

/// Element type of a field once optional and container wrappers are removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Primitive(Primitive),
    Enum(Arc<EnumSpec>),
    /// Canonical (primary) schema name.
    Record(String),
}

/// Normalized view of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub element: Element,
    pub optional: bool,
    pub container: ContainerKind,
    /// Key type of a dict field.
    pub dict_key: Option<Primitive>,
    /// Literal default, or the result of the default factory.
    pub default: Option<Value>,
    /// No default exists, so a value must come from somewhere.
    pub required: bool,
    pub meta: FieldMeta,
}

impl FieldDescriptor {
    pub fn is_structured(&self) -> bool {
        matches!(self.element, Element::Record(_))
    }

    pub fn record(&self) -> Option<&str> {
        match &self.element {
            Element::Record(name) => Some(name),
            _ => None,
        }
    }
}

/// Describe every field of `schema`, inherited fields first.
///
/// With `exclude_ignored`, fields in [`Mode::Ignore`] are skipped. The
/// instantiator describes with ignored fields included so they still receive
/// their defaults.
pub fn describe(
    registry: &Registry,
    schema: &str,
    exclude_ignored: bool,
) -> Result<Vec<FieldDescriptor>, ConfigError> {
    let fields = registry.fields_of(schema)?;
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        if exclude_ignored && field.meta.mode == Mode::Ignore {
            continue;
        }
        out.push(describe_field(registry, schema, field)?);
    }
    Ok(out)
}

fn describe_field(
    registry: &Registry,
    schema: &str,
    field: &Field,
) -> Result<FieldDescriptor, ConfigError> {
    let context = format!("{schema}.{}", field.name);
    let err = |reason: &str| ConfigError::schema(&context, reason);

    let mut ty = unbind(&field.ty, &context)?;
    let mut optional = false;
    if let TypeExpr::Optional(inner) = ty {
        optional = true;
        ty = unbind(inner, &context)?;
    }

    let (container, dict_key, inner) = match ty {
        TypeExpr::List(inner) => (ContainerKind::List, None, inner.as_ref()),
        TypeExpr::Set(inner) => (ContainerKind::Set, None, inner.as_ref()),
        TypeExpr::Dict(key, value) => match unbind(key, &context)? {
            TypeExpr::Primitive(p) => (ContainerKind::Dict, Some(*p), value.as_ref()),
            _ => return Err(err("dict keys must be a primitive type")),
        },
        other => (ContainerKind::None, None, other),
    };

    let element = match unbind(inner, &context)? {
        TypeExpr::Primitive(p) => Element::Primitive(*p),
        TypeExpr::Enum(spec) => Element::Enum(spec.clone()),
        TypeExpr::Record(reference) => {
            let target = registry
                .lookup(reference)
                .ok_or_else(|| err(&format!("unknown type '{reference}'")))?;
            Element::Record(target.name().to_string())
        }
        TypeExpr::List(_) | TypeExpr::Set(_) | TypeExpr::Dict(..) => {
            return Err(err("nested containers are not supported"));
        }
        TypeExpr::Optional(_) => {
            return Err(err("optional container elements are not supported"));
        }
        TypeExpr::Param { .. } => return Err(err("unresolved type parameter")),
    };

    let meta = field.meta.clone();
    match (&element, &meta.choices) {
        (Element::Enum(_), Some(_)) => {
            return Err(err("enum fields take their choices from the enum"));
        }
        (Element::Primitive(_), Some(Choices::Types(_))) => {
            return Err(err("type choices require a structured field"));
        }
        (Element::Record(_), Some(Choices::Values(_))) => {
            return Err(err("value choices require a primitive field"));
        }
        _ => {}
    }
    if meta.fix_type && container != ContainerKind::None {
        return Err(err("fix_type is not supported on list, set or dict fields"));
    }

    let default = field.default.produce();
    Ok(FieldDescriptor {
        name: field.name.clone(),
        element,
        optional,
        container,
        dict_key,
        required: default.is_none(),
        default,
        meta,
    })
}

/// Replace a type parameter by its bound, repeatedly.
fn unbind<'a>(ty: &'a TypeExpr, context: &str) -> Result<&'a TypeExpr, ConfigError> {
    let mut current = ty;
    while let TypeExpr::Param { name, bound } = current {
        match bound {
            Some(bound) => current = bound,
            None => {
                return Err(ConfigError::schema(
                    context,
                    format!("type parameter '{name}' has no bound"),
                ));
            }
        }
    }
    Ok(current)
}

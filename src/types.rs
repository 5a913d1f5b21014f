//! Shared vocabulary for declaring configuration schemas.
//!
//! A schema field is declared with a [`TypeExpr`], the Rust-side stand-in for
//! a type annotation. The introspector (see [`describe`](crate::describe))
//! normalizes it into a flat descriptor: optional-ness, container kind, and
//! an element type that is a primitive, an enum, or a record.

use std::sync::Arc;

use serde_json::Value;

/// Key under which a resolved record names its concrete schema.
///
/// Polymorphic fields deserialize through `#[serde(tag = "__cls__")]` enums
/// whose variant names equal schema names.
pub const TYPE_TAG: &str = "__cls__";

/// Default path separator between a parent flag and a field name.
pub const DEFAULT_SEPARATOR: char = '.';

/// Separators a field may choose instead of [`DEFAULT_SEPARATOR`].
pub const SEPARATORS: &str = "/._-+";

/// Scalar types a leaf flag can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Int,
    Float,
    Str,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "str",
        }
    }
}

/// Underlying representation of an enum's member values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRepr {
    Int,
    Str,
    Float,
}

/// An enumeration: named members, each with a primitive value.
///
/// Command-line input matches either a member name or its stringified value;
/// the resolved value is always the member name, matching how serde encodes
/// unit variants.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSpec {
    pub name: String,
    pub repr: EnumRepr,
    pub members: Vec<(String, Value)>,
}

impl EnumSpec {
    pub fn new(name: &str, repr: EnumRepr) -> Self {
        Self {
            name: name.to_string(),
            repr,
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.members.push((name.to_string(), value.into()));
        self
    }

    /// All accepted spellings: member names, then stringified values.
    pub fn choices(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|(name, _)| name.clone())
            .chain(self.members.iter().map(|(_, v)| display_value(v)))
            .collect()
    }
}

/// A declared field type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(Primitive),
    Enum(Arc<EnumSpec>),
    /// Reference to a schema registered in the [`Registry`](crate::Registry).
    Record(String),
    Optional(Box<TypeExpr>),
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Dict(Box<TypeExpr>, Box<TypeExpr>),
    /// A type parameter; resolves to its bound.
    Param {
        name: String,
        bound: Option<Box<TypeExpr>>,
    },
}

impl TypeExpr {
    pub fn bool() -> Self {
        TypeExpr::Primitive(Primitive::Bool)
    }

    pub fn int() -> Self {
        TypeExpr::Primitive(Primitive::Int)
    }

    pub fn float() -> Self {
        TypeExpr::Primitive(Primitive::Float)
    }

    pub fn str() -> Self {
        TypeExpr::Primitive(Primitive::Str)
    }

    pub fn record(name: &str) -> Self {
        TypeExpr::Record(name.to_string())
    }

    pub fn enumeration(spec: EnumSpec) -> Self {
        TypeExpr::Enum(Arc::new(spec))
    }

    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }

    pub fn set(inner: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(inner))
    }

    pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Dict(Box::new(key), Box::new(value))
    }

    pub fn param(name: &str, bound: Option<TypeExpr>) -> Self {
        TypeExpr::Param {
            name: name.to_string(),
            bound: bound.map(Box::new),
        }
    }
}

/// How a field's flag path is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// `parent<sep>name`.
    #[default]
    Snake,
    /// Leaves: the bare field name. Structured fields keep their selector
    /// path but expose the selected type's fields without any prefix.
    Flat,
    /// The path restarts at the field's own name, dropping the parent prefix.
    SSnake,
    /// Not exposed on the command line at all.
    Ignore,
}

/// Container wrapping a field's element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerKind {
    #[default]
    None,
    List,
    Set,
    Dict,
}

/// Allowed values for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Choices {
    /// Schema names (primary names) a structured field may select.
    Types(Vec<String>),
    /// Literal values a primitive field may take.
    Values(Vec<Value>),
}

/// A resolve operation, independent of any CLI framework.
/// The `cli` adapter converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveAction {
    /// Resolve the tokens and hand back the namespace.
    Resolve { tokens: Vec<String> },
    /// Resolve the tokens and list every resolved key and value.
    Show { tokens: Vec<String> },
}

/// Render a JSON scalar the way a user would type it on the command line.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

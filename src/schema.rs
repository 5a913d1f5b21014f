//! Schema declaration and the static type registry.
//!
//! A [`Schema`] is the explicit, value-level description of a configuration
//! record: its fields, its parent type, and the names it answers to on the
//! command line. Schemas are collected in a [`Registry`], which is the only
//! place the engine ever looks up a type reference. Nothing is loaded
//! dynamically: a reference such as `pkg:Sub2` is matched against the
//! `module` and `name` of registered schemas.
//!
//! Single-schema problems (bad separators, duplicate fields, duplicate
//! literal choices) are rejected by [`Registry::register`]. Problems that
//! span schemas (unknown parents, inheritance cycles, colliding choice names,
//! malformed dict typing) are rejected by [`Registry::validate`], which the
//! parser builder always runs before the first parse.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::describe;
use crate::error::ConfigError;
use crate::types::{Choices, DEFAULT_SEPARATOR, Mode, SEPARATORS, TypeExpr};

/// Default of a field: absent, a literal value, or a factory called each
/// time the schema is described.
#[derive(Clone, Default)]
pub enum FieldDefault {
    #[default]
    Missing,
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    pub(crate) fn produce(&self) -> Option<Value> {
        match self {
            FieldDefault::Missing => None,
            FieldDefault::Value(v) => Some(v.clone()),
            FieldDefault::Factory(f) => Some(f()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Missing => write!(f, "Missing"),
            FieldDefault::Value(v) => write!(f, "Value({v})"),
            FieldDefault::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

/// Per-field metadata controlling how the field is exposed and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta {
    pub help: Option<String>,
    pub separator: char,
    pub mode: Mode,
    pub choices: Option<Choices>,
    /// `None` means the kind-specific default: off for type choices, on for
    /// value choices.
    pub enforce_choices: Option<bool>,
    /// Must be given explicitly even though a default exists.
    pub required: bool,
    /// The selected type of a structured field can not be changed.
    pub fix_type: bool,
    pub disable_subclass_check: bool,
}

impl Default for FieldMeta {
    fn default() -> Self {
        Self {
            help: None,
            separator: DEFAULT_SEPARATOR,
            mode: Mode::default(),
            choices: None,
            enforce_choices: None,
            required: false,
            fix_type: false,
            disable_subclass_check: false,
        }
    }
}

impl FieldMeta {
    pub fn enforces_choices(&self) -> bool {
        match &self.choices {
            None => false,
            Some(Choices::Types(_)) => self.enforce_choices.unwrap_or(false),
            Some(Choices::Values(_)) => self.enforce_choices.unwrap_or(true),
        }
    }
}

/// One declared field of a [`Schema`].
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) ty: TypeExpr,
    pub(crate) default: FieldDefault,
    pub(crate) meta: FieldMeta,
}

impl Field {
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: name.to_string(),
            ty,
            default: FieldDefault::Missing,
            meta: FieldMeta::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Default produced by `factory` every time the schema is described.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.meta.help = Some(help.to_string());
        self
    }

    /// Separator placed between the parent path and this field's name.
    /// Must be one of `/._-+`.
    pub fn separator(mut self, separator: char) -> Self {
        self.meta.separator = separator;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.meta.mode = mode;
        self
    }

    pub fn type_choices<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.choices = Some(Choices::Types(names.into_iter().map(Into::into).collect()));
        self
    }

    pub fn value_choices<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.meta.choices = Some(Choices::Values(values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn enforce_choices(mut self, enforce: bool) -> Self {
        self.meta.enforce_choices = Some(enforce);
        self
    }

    pub fn required(mut self) -> Self {
        self.meta.required = true;
        self
    }

    pub fn fix_type(mut self) -> Self {
        self.meta.fix_type = true;
        self
    }

    pub fn no_subclass_check(mut self) -> Self {
        self.meta.disable_subclass_check = true;
        self
    }
}

/// A configuration record type.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) name: String,
    pub(crate) module: Option<String>,
    pub(crate) alt_names: Vec<String>,
    pub(crate) extends: Option<String>,
    pub(crate) is_abstract: bool,
    pub(crate) fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            module: None,
            alt_names: Vec::new(),
            extends: None,
            is_abstract: false,
            fields: Vec::new(),
        }
    }

    /// Module path, so that `module:Name` references resolve to this schema.
    pub fn module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    pub fn alt_name(mut self, name: &str) -> Self {
        self.alt_names.push(name.to_string());
        self
    }

    /// Declare `parent` as the supertype. Its fields are inherited.
    pub fn extends(mut self, parent: &str) -> Self {
        self.extends = Some(parent.to_string());
        self
    }

    /// Abstract schemas can be declared as field types but never instantiated.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified reference: `module:Name`, or the bare name.
    pub fn reference(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}:{}", self.name),
            None => self.name.clone(),
        }
    }

    pub(crate) fn answers_to(&self, token: &str) -> bool {
        token == self.name || token == self.reference() || self.alt_names.iter().any(|a| a == token)
    }
}

/// The set of schemas a parser may resolve.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: IndexMap<String, Schema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with(mut self, schema: Schema) -> Result<Self, ConfigError> {
        self.register(schema)?;
        Ok(self)
    }

    pub fn register(&mut self, schema: Schema) -> Result<(), ConfigError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(ConfigError::schema(&schema.name, "type is already registered"));
        }
        let mut seen = HashSet::new();
        for field in &schema.fields {
            let context = format!("{}.{}", schema.name, field.name);
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::schema(context, "field is declared twice"));
            }
            if !SEPARATORS.contains(field.meta.separator) {
                return Err(ConfigError::schema(
                    context,
                    format!(
                        "separator '{}' must be one of '{SEPARATORS}'",
                        field.meta.separator
                    ),
                ));
            }
            match &field.meta.choices {
                Some(Choices::Values(values)) => {
                    for (i, value) in values.iter().enumerate() {
                        if values[..i].contains(value) {
                            return Err(ConfigError::schema(
                                context,
                                format!("choice {value} is declared twice"),
                            ));
                        }
                    }
                }
                Some(Choices::Types(names)) => {
                    let mut names_seen = HashSet::new();
                    for name in names {
                        if !names_seen.insert(name.as_str()) {
                            return Err(ConfigError::schema(
                                context,
                                format!("choice '{name}' is declared twice"),
                            ));
                        }
                    }
                }
                None => {}
            }
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Resolve a type reference: `module:Name`, a primary name, or an
    /// alternate name.
    pub fn lookup(&self, reference: &str) -> Option<&Schema> {
        if let Some((module, name)) = reference.split_once(':') {
            return self
                .schemas
                .values()
                .find(|s| s.name == name && s.module.as_deref().is_none_or(|m| m == module));
        }
        self.schemas
            .get(reference)
            .or_else(|| self.schemas.values().find(|s| s.alt_names.iter().any(|a| a == reference)))
    }

    /// Whether `child` equals `ancestor` or extends it, transitively.
    pub fn is_subtype(&self, child: &str, ancestor: &str) -> bool {
        let mut current = self.lookup(child);
        let mut steps = 0;
        while let Some(schema) = current {
            if schema.name == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.schemas.len() {
                return false;
            }
            current = schema.extends.as_deref().and_then(|p| self.lookup(p));
        }
        false
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Fields of `name` including inherited ones, parents first. A field
    /// redeclared in a subtype replaces the inherited one in place.
    pub(crate) fn fields_of(&self, name: &str) -> Result<Vec<&Field>, ConfigError> {
        let mut chain: Vec<&Schema> = Vec::new();
        let mut current = Some(name);
        while let Some(reference) = current {
            let schema = self
                .lookup(reference)
                .ok_or_else(|| ConfigError::schema(name, format!("unknown type '{reference}'")))?;
            if chain.iter().any(|s| s.name == schema.name) {
                return Err(ConfigError::schema(name, "inheritance cycle"));
            }
            chain.push(schema);
            current = schema.extends.as_deref();
        }

        let mut fields: Vec<&Field> = Vec::new();
        for schema in chain.iter().rev() {
            for field in &schema.fields {
                match fields.iter().position(|f| f.name == field.name) {
                    Some(i) => fields[i] = field,
                    None => fields.push(field),
                }
            }
        }
        Ok(fields)
    }

    /// Cross-schema validation. Every schema is also described once, so
    /// malformed field typing surfaces here rather than mid-parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for schema in self.schemas.values() {
            if let Some(parent) = &schema.extends
                && self.lookup(parent).is_none()
            {
                return Err(ConfigError::schema(
                    &schema.name,
                    format!("extends unknown type '{parent}'"),
                ));
            }
            for alt in &schema.alt_names {
                let clash = self
                    .schemas
                    .values()
                    .any(|other| other.name != schema.name && other.answers_to(alt));
                if clash {
                    return Err(ConfigError::schema(
                        &schema.name,
                        format!("alternate name '{alt}' is already used by another type"),
                    ));
                }
            }
            self.fields_of(&schema.name)?;
        }

        for schema in self.schemas.values() {
            for field in &schema.fields {
                let context = format!("{}.{}", schema.name, field.name);
                self.check_references(&context, &field.ty)?;
                if let Some(Choices::Types(names)) = &field.meta.choices {
                    self.check_type_choices(&context, names)?;
                }
            }
            describe::describe(self, &schema.name, false)?;
        }
        Ok(())
    }

    fn check_references(&self, context: &str, ty: &TypeExpr) -> Result<(), ConfigError> {
        match ty {
            TypeExpr::Record(name) => {
                if self.lookup(name).is_none() {
                    return Err(ConfigError::schema(context, format!("unknown type '{name}'")));
                }
                Ok(())
            }
            TypeExpr::Optional(inner) | TypeExpr::List(inner) | TypeExpr::Set(inner) => {
                self.check_references(context, inner)
            }
            TypeExpr::Dict(key, value) => {
                self.check_references(context, key)?;
                self.check_references(context, value)
            }
            TypeExpr::Param {
                bound: Some(bound), ..
            } => self.check_references(context, bound),
            _ => Ok(()),
        }
    }

    fn check_type_choices(&self, context: &str, names: &[String]) -> Result<(), ConfigError> {
        let mut taken: HashSet<&str> = HashSet::new();
        for name in names {
            let schema = self
                .lookup(name)
                .ok_or_else(|| ConfigError::schema(context, format!("unknown choice '{name}'")))?;
            let spellings =
                std::iter::once(schema.name.as_str()).chain(schema.alt_names.iter().map(String::as_str));
            for spelling in spellings {
                if !taken.insert(spelling) {
                    return Err(ConfigError::schema(
                        context,
                        format!("choice name '{spelling}' is ambiguous"),
                    ));
                }
            }
        }
        Ok(())
    }
}

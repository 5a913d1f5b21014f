use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::cascade;
use crate::driver;
use crate::error::ConfigError;
use crate::grammar::Grammar;
use crate::namespace::{Namespace, ResolveResult};
use crate::schema::Registry;
use crate::types::ResolveAction;

/// Entry point for building a parser over a schema registry.
pub struct Polyflag;

impl Polyflag {
    pub fn builder(registry: Registry) -> ParserBuilder {
        ParserBuilder::new(registry)
    }
}

/// Shared sink for the flags of several parsers.
///
/// Parsers handed the same collector publish every flag they register to it,
/// and unknown-argument suggestions are drawn from the union. Values are
/// never shared.
#[derive(Debug, Clone, Default)]
pub struct FlagCollector {
    flags: Arc<Mutex<BTreeSet<String>>>,
}

impl FlagCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, flags: impl IntoIterator<Item = String>) {
        self.flags.lock().extend(flags);
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.lock().contains(flag)
    }

    /// Snapshot of every collected flag path, sorted.
    pub fn flags(&self) -> Vec<String> {
        self.flags.lock().iter().cloned().collect()
    }
}

/// One top-level argument: a name, a schema, and an optional default
/// instance.
#[derive(Debug)]
pub struct RootSpec {
    pub(crate) name: String,
    pub(crate) schema: String,
    pub(crate) default: Option<Value>,
    pub(crate) flat: bool,
    pub(crate) ignore: Vec<String>,
    serialize_error: Option<serde_json::Error>,
}

impl RootSpec {
    pub fn new(name: &str, schema: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: schema.to_string(),
            default: None,
            flat: false,
            ignore: Vec::new(),
            serialize_error: None,
        }
    }

    /// Use a serializable value as the default instance. An object without
    /// a `__cls__` entry is taken to be of the root's schema.
    pub fn default_instance<S: Serialize>(mut self, instance: &S) -> Self {
        match serde_json::to_value(instance) {
            Ok(value) => self.default = Some(value),
            Err(e) => self.serialize_error = Some(e),
        }
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Expose the root's fields without the root name as prefix.
    pub fn flat(mut self) -> Self {
        self.flat = true;
        self
    }

    /// Hide flag paths from the command line. An entry hides that path and
    /// everything registered below it; an entry ending in a separator hides
    /// every path starting with it.
    pub fn ignore<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(paths.into_iter().map(Into::into));
        self
    }
}

/// Builder for a [`TreeParser`].
pub struct ParserBuilder {
    registry: Registry,
    roots: Vec<RootSpec>,
    ignore_required: bool,
    collector: Option<FlagCollector>,
}

impl ParserBuilder {
    fn new(registry: Registry) -> Self {
        Self {
            registry,
            roots: Vec::new(),
            ignore_required: false,
            collector: None,
        }
    }

    /// Add a root named `name` of type `schema`, without default instance.
    pub fn root(self, name: &str, schema: &str) -> Self {
        self.add_root(RootSpec::new(name, schema))
    }

    pub fn add_root(mut self, root: RootSpec) -> Self {
        self.roots.push(root);
        self
    }

    /// Skip the check of fields marked required in their metadata. Fields
    /// without any default are always required.
    pub fn ignore_required(mut self, ignore: bool) -> Self {
        self.ignore_required = ignore;
        self
    }

    /// Publish flags to `collector` (shared with other parsers).
    pub fn collector(mut self, collector: &FlagCollector) -> Self {
        self.collector = Some(collector.clone());
        self
    }

    /// Validate the registry and the roots.
    pub fn build(mut self) -> Result<TreeParser, ConfigError> {
        self.registry.validate()?;
        let mut seen = HashSet::new();
        for root in &mut self.roots {
            if let Some(source) = root.serialize_error.take() {
                return Err(ConfigError::Serialize {
                    name: root.name.clone(),
                    source,
                });
            }
            if self.registry.lookup(&root.schema).is_none() {
                return Err(ConfigError::schema(
                    &root.name,
                    format!("unknown type '{}'", root.schema),
                ));
            }
            if !seen.insert(root.name.clone()) {
                return Err(ConfigError::schema(&root.name, "root is declared twice"));
            }
        }
        Ok(TreeParser {
            registry: self.registry,
            roots: self.roots,
            ignore_required: self.ignore_required,
            collector: self.collector.unwrap_or_default(),
        })
    }
}

/// A validated parser. Every call to [`parse`](Self::parse) starts from a
/// fresh grammar.
#[derive(Debug)]
pub struct TreeParser {
    registry: Registry,
    roots: Vec<RootSpec>,
    ignore_required: bool,
    collector: FlagCollector,
}

impl TreeParser {
    /// Resolve `args` against the roots and instantiate every root.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<Namespace, ConfigError> {
        let mut grammar = Grammar::new(&self.registry);
        for root in &self.roots {
            grammar.add_root(root)?;
        }

        let leftovers = driver::run(&mut grammar, args)?;
        self.collector.extend(grammar.flags.keys().cloned());
        if !leftovers.is_empty() {
            let known = self.collector.flags();
            return Err(driver::unknown_arguments(
                leftovers,
                known.iter().map(String::as_str),
            ));
        }

        let values = cascade::instantiate(&grammar, self.ignore_required)?;
        Ok(Namespace::new(values))
    }

    /// Handle a [`ResolveAction`]: resolve, or resolve and list.
    pub fn handle(&self, action: &ResolveAction) -> Result<ResolveResult, ConfigError> {
        match action {
            ResolveAction::Resolve { tokens } => Ok(ResolveResult::Resolved(self.parse(tokens.as_slice())?)),
            ResolveAction::Show { tokens } => {
                Ok(ResolveResult::Listing(self.parse(tokens.as_slice())?.listing()))
            }
        }
    }

    /// Handle a [`ResolveAction`], printing a listing to stdout. Returns the
    /// namespace when the action asked for one.
    pub fn handle_and_print(&self, action: &ResolveAction) -> Result<Option<Namespace>, ConfigError> {
        match self.handle(action)? {
            ResolveResult::Resolved(ns) => Ok(Some(ns)),
            listing @ ResolveResult::Listing(_) => {
                println!("{listing}");
                Ok(None)
            }
        }
    }

    pub fn collector(&self) -> &FlagCollector {
        &self.collector
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

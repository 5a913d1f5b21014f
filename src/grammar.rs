//! The self-modifying command-line grammar.
//!
//! Expanding a resolved structure node registers one flag per exposed leaf
//! and one *selector* flag per structured field. A selector does not resolve
//! when it is registered: it records a [`PendingDefault`] and waits for the
//! driver to either see the flag in the user's input or inject the default
//! type. Resolving a selector expands the chosen type, which registers more
//! flags. The driver keeps parsing until that process stops producing new
//! work.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::builder::RootSpec;
use crate::coerce;
use crate::describe::{self, Element, FieldDescriptor};
use crate::error::ConfigError;
use crate::schema::{FieldMeta, Registry};
use crate::tree::{NodeId, ParamNode, ParamTree, Resolved, Slot, StructNode};
use crate::types::{Choices, ContainerKind, Mode, Primitive, SEPARATORS, TYPE_TAG, display_value};

/// How many value tokens a flag consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Nargs {
    One,
    /// Every following token up to the next flag.
    Many,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    /// Coerce the tokens into leaf `field` of `node`.
    Leaf { node: NodeId, field: String },
    /// Select the type of structured `field` of `parent` (`None` for a root).
    Select {
        parent: Option<NodeId>,
        field: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Flag {
    pub nargs: Nargs,
    pub action: Action,
}

/// An unresolved selector waiting for input or for its default.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingDefault {
    pub flag: String,
    pub declared: String,
    pub default: Option<Value>,
    /// Never reported as missing when it stays unresolved.
    pub override_missing: bool,
    pub container: ContainerKind,
}

impl PendingDefault {
    /// Tokens that select the default, or `None` when there is nothing to
    /// select and the entry has to be provided by the user.
    pub(crate) fn synthesize(&self, registry: &Registry) -> Option<Vec<String>> {
        let class_of = |value: &Value| {
            value
                .get(TYPE_TAG)
                .and_then(Value::as_str)
                .map_or_else(|| self.declared.clone(), str::to_string)
        };
        match (self.container, &self.default) {
            (_, Some(Value::Null)) => Some(vec!["None".to_string()]),
            (ContainerKind::None, Some(default)) => Some(vec![class_of(default)]),
            (ContainerKind::None, None) => registry
                .get(&self.declared)
                .filter(|s| !s.is_abstract)
                .map(|s| vec![s.name.clone()]),
            (ContainerKind::List | ContainerKind::Set, Some(Value::Array(items))) => {
                Some(items.iter().map(class_of).collect())
            }
            (ContainerKind::Dict, Some(Value::Object(entries))) => Some(
                entries
                    .iter()
                    .map(|(key, value)| format!("{key}={}", class_of(value)))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// `prefix<sep>name`, or `name` when there is no prefix.
pub(crate) fn join(prefix: &str, sep: char, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{sep}{name}")
    }
}

fn is_separator(c: char) -> bool {
    SEPARATORS.contains(c)
}

pub(crate) struct Grammar<'r> {
    registry: &'r Registry,
    pub(crate) tree: ParamTree,
    pub(crate) flags: IndexMap<String, Flag>,
    pub(crate) pending: IndexMap<String, PendingDefault>,
    /// Entries that could not be synthesized and were not given explicitly.
    pub(crate) unresolved: IndexMap<String, PendingDefault>,
    ignore: Vec<String>,
}

impl<'r> Grammar<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            tree: ParamTree::new(),
            flags: IndexMap::new(),
            pending: IndexMap::new(),
            unresolved: IndexMap::new(),
            ignore: Vec::new(),
        }
    }

    pub(crate) fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub(crate) fn add_root(&mut self, root: &RootSpec) -> Result<(), ConfigError> {
        let schema = self.registry.lookup(&root.schema).ok_or_else(|| {
            ConfigError::schema(&root.name, format!("unknown type '{}'", root.schema))
        })?;
        self.ignore.extend(root.ignore.iter().cloned());

        let mode = if root.flat { Mode::Flat } else { Mode::Snake };
        let field = FieldDescriptor {
            name: root.name.clone(),
            element: Element::Record(schema.name.clone()),
            optional: false,
            container: ContainerKind::None,
            dict_key: None,
            default: root.default.clone(),
            required: root.default.is_none(),
            meta: FieldMeta {
                mode,
                ..FieldMeta::default()
            },
        };
        let prefix = if root.flat {
            String::new()
        } else {
            root.name.clone()
        };
        let mut node = StructNode::new(
            &root.name,
            field,
            root.name.clone(),
            prefix,
            root.default.clone(),
        );
        node.override_missing = root.flat;
        node.hidden = self.is_ignored(&root.name);
        let id = self.tree.alloc(node);
        self.tree.set_slot(None, &root.name, id);
        self.offer_selector(None, id)
    }

    /// Whether a root ignore rule names `flag`: the exact path, or a rule
    /// ending in a separator that `flag` starts with.
    ///
    /// Paths below a hidden selector are not matched here; they inherit
    /// [`StructNode::hidden`] from the node that registers them.
    pub(crate) fn is_ignored(&self, flag: &str) -> bool {
        self.ignore.iter().any(|rule| {
            flag == rule || (rule.ends_with(is_separator) && flag.starts_with(rule.as_str()))
        })
    }

    pub(crate) fn nargs(&self, flag: &str) -> Option<Nargs> {
        self.flags.get(flag).map(|f| f.nargs)
    }

    /// Run the action of a recognized flag.
    pub(crate) fn apply(&mut self, flag: &str, tokens: &[String]) -> Result<(), ConfigError> {
        let Some(entry) = self.flags.get(flag) else {
            return Ok(());
        };
        match entry.action.clone() {
            Action::Leaf { node, field } => {
                let Some(leaf) = self.tree.node(node).leaves.get(&field) else {
                    return Ok(());
                };
                let value = coerce::leaf(flag, &leaf.field, tokens)?;
                trace!(flag, ?value, "set leaf");
                if let Some(leaf) = self.tree.node_mut(node).leaves.get_mut(&field) {
                    leaf.value = value;
                }
                Ok(())
            }
            Action::Select { parent, field } => self.select(parent, &field, tokens),
        }
    }

    fn register(&mut self, owner: NodeId, flag: &str, entry: Flag) -> Result<(), ConfigError> {
        if self.flags.contains_key(flag) {
            return Err(ConfigError::schema(
                format!("--{flag}"),
                "two fields map to the same flag",
            ));
        }
        trace!(flag, nargs = ?entry.nargs, "registered flag");
        self.flags.insert(flag.to_string(), entry);
        self.tree.node_mut(owner).owned_flags.push(flag.to_string());
        Ok(())
    }

    /// Expose the selector of pending node `id`, or resolve it on the spot
    /// when its type is fixed or its flag is ignored.
    fn offer_selector(&mut self, parent: Option<NodeId>, id: NodeId) -> Result<(), ConfigError> {
        let node = self.tree.node(id);
        let flag = node.flag.clone();
        let name = node.name.clone();
        let fixed = node.field.meta.fix_type;
        let hidden = node.hidden;
        let nargs = match node.field.container {
            ContainerKind::None => Nargs::One,
            _ => Nargs::Many,
        };
        let entry = PendingDefault {
            flag: flag.clone(),
            declared: node.field.record().unwrap_or_default().to_string(),
            default: node.default.clone(),
            override_missing: node.override_missing,
            container: node.field.container,
        };

        if let Some(owner) = parent {
            self.tree.node_mut(owner).owned_flags.push(flag.clone());
        }

        if fixed || hidden {
            return match entry.synthesize(self.registry) {
                Some(tokens) => {
                    trace!(flag = %flag, ?tokens, "resolving hidden selector");
                    self.select(parent, &name, &tokens)
                }
                None => {
                    self.unresolved.insert(flag, entry);
                    Ok(())
                }
            };
        }

        if self.flags.contains_key(&flag) {
            return Err(ConfigError::schema(
                format!("--{flag}"),
                "two fields map to the same flag",
            ));
        }
        trace!(flag = %flag, "registered selector");
        self.flags.insert(
            flag.clone(),
            Flag {
                nargs,
                action: Action::Select {
                    parent,
                    field: name,
                },
            },
        );
        self.pending.insert(flag, entry);
        Ok(())
    }

    /// Resolve the selector of `field` under `parent` to `tokens`, replacing
    /// whatever node filled that slot before.
    pub(crate) fn select(
        &mut self,
        parent: Option<NodeId>,
        field: &str,
        tokens: &[String],
    ) -> Result<(), ConfigError> {
        let Some(old) = self.tree.slot(parent, field) else {
            return Err(ConfigError::schema(field, "selector has no node"));
        };
        let template = self.tree.node(old);
        let descriptor = template.field.clone();
        let flag = template.flag.clone();
        let prefix = template.prefix.clone();
        let default = template.default.clone();
        let override_missing = template.override_missing;
        let hidden = template.hidden;

        self.pending.shift_remove(&flag);
        self.unresolved.shift_remove(&flag);
        self.detach(old);

        let mut node = StructNode::new(field, descriptor.clone(), flag.clone(), prefix, default.clone());
        node.override_missing = override_missing;
        node.hidden = hidden;
        let id = self.tree.alloc(node);
        self.tree.set_slot(parent, field, id);

        if let [token] = tokens
            && coerce::is_none_token(token)
        {
            if !descriptor.optional {
                return Err(ConfigError::invalid(
                    &flag,
                    "field is not optional and can not be None",
                ));
            }
            debug!(flag = %flag, "selector cleared");
            self.tree.node_mut(id).resolved = Resolved::Null;
            return Ok(());
        }

        match descriptor.container {
            ContainerKind::None => {
                let [token] = tokens else {
                    return Err(ConfigError::invalid(&flag, "expected exactly one type"));
                };
                let ty = self.resolve_type(&flag, &descriptor, token)?;
                debug!(flag = %flag, ty = %ty, "selected type");
                self.tree.node_mut(id).resolved = Resolved::Record(ty);
                self.expand(id)
            }
            ContainerKind::List | ContainerKind::Set => {
                debug!(flag = %flag, ?tokens, "selected element types");
                self.tree.node_mut(id).resolved = Resolved::Aggregate(descriptor.container);
                for (i, token) in tokens.iter().enumerate() {
                    let element_default = default.as_ref().and_then(|d| d.get(i)).cloned();
                    self.add_element(id, &i.to_string(), token, element_default)?;
                }
                Ok(())
            }
            ContainerKind::Dict => {
                debug!(flag = %flag, ?tokens, "selected dict entries");
                self.tree.node_mut(id).resolved = Resolved::Aggregate(ContainerKind::Dict);
                let key_kind = descriptor.dict_key.unwrap_or(Primitive::Str);
                for token in tokens {
                    let (key, reference) = match token.split_once('=') {
                        Some((key, reference)) => (key, Some(reference)),
                        None => (token.as_str(), None),
                    };
                    let key = display_value(&coerce::primitive(&flag, key_kind, key)?);
                    let element_default = default.as_ref().and_then(|d| d.get(&key)).cloned();
                    let reference = match reference {
                        Some(reference) => reference.to_string(),
                        None => element_default
                            .as_ref()
                            .and_then(|d| d.get(TYPE_TAG))
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| descriptor.record().unwrap_or_default().to_string()),
                    };
                    self.add_element(id, &key, &reference, element_default)?;
                }
                Ok(())
            }
        }
    }

    fn add_element(
        &mut self,
        aggregate: NodeId,
        key: &str,
        token: &str,
        default: Option<Value>,
    ) -> Result<(), ConfigError> {
        let parent = self.tree.node(aggregate);
        let descriptor = parent.field.clone();
        let flag = join(&parent.flag, descriptor.meta.separator, key);
        let hidden = parent.hidden || self.is_ignored(&flag);
        let ty = self.resolve_type(&flag, &descriptor, token)?;

        let mut node = StructNode::new(key, descriptor, flag.clone(), flag, default);
        node.resolved = Resolved::Record(ty);
        node.hidden = hidden;
        let id = self.tree.alloc(node);
        self.tree
            .node_mut(aggregate)
            .children
            .insert(key.to_string(), id);
        self.expand(id)
    }

    /// Map a type token to a registered schema, honoring the field's choices
    /// and subtype constraint.
    fn resolve_type(
        &self,
        flag: &str,
        descriptor: &FieldDescriptor,
        token: &str,
    ) -> Result<String, ConfigError> {
        let declared = descriptor.record().unwrap_or_default();
        let choices: &[String] = match &descriptor.meta.choices {
            Some(Choices::Types(names)) => names,
            _ => &[],
        };

        let chosen = choices
            .iter()
            .filter_map(|name| self.registry.lookup(name))
            .find(|schema| schema.answers_to(token));
        let schema = match chosen {
            Some(schema) => schema,
            None => self
                .registry
                .lookup(token)
                .ok_or_else(|| ConfigError::UnknownType {
                    flag: format!("--{flag}"),
                    reference: token.to_string(),
                })?,
        };

        if !descriptor.meta.disable_subclass_check && !self.registry.is_subtype(&schema.name, declared)
        {
            return Err(ConfigError::SubtypeMismatch {
                flag: format!("--{flag}"),
                selected: schema.name.clone(),
                expected: declared.to_string(),
            });
        }
        if descriptor.meta.enforces_choices()
            && !choices
                .iter()
                .filter_map(|name| self.registry.lookup(name))
                .any(|s| s.name == schema.name)
        {
            return Err(ConfigError::InvalidChoice {
                flag: format!("--{flag}"),
                value: token.to_string(),
                allowed: choices.to_vec(),
            });
        }
        if schema.is_abstract {
            return Err(ConfigError::invalid(
                flag,
                format!("type '{}' is abstract and can not be instantiated", schema.name),
            ));
        }
        Ok(schema.name.clone())
    }

    /// Register the flags of resolved record node `id`.
    fn expand(&mut self, id: NodeId) -> Result<(), ConfigError> {
        let node = self.tree.node(id);
        let ty = match &node.resolved {
            Resolved::Record(ty) => ty.clone(),
            _ => return Ok(()),
        };
        let prefix = node.prefix.clone();
        let default = node.default.clone();
        let hidden = node.hidden;

        for field in describe::describe(self.registry, &ty, true)? {
            let sep = field.meta.separator;
            let name = field.name.clone();

            if field.is_structured() {
                let field_default = default
                    .as_ref()
                    .and_then(|d| d.get(&name))
                    .cloned()
                    .or_else(|| field.default.clone());
                let (flag, child_prefix) = match field.meta.mode {
                    Mode::SSnake => (name.clone(), name.clone()),
                    Mode::Flat => (join(&prefix, sep, &name), String::new()),
                    Mode::Snake | Mode::Ignore => {
                        let path = join(&prefix, sep, &name);
                        (path.clone(), path)
                    }
                };
                let flat = field.meta.mode == Mode::Flat;
                let child_hidden = hidden || self.is_ignored(&flag);
                let mut child = StructNode::new(&name, field, flag, child_prefix, field_default);
                child.override_missing = flat;
                child.hidden = child_hidden;
                let child_id = self.tree.alloc(child);
                self.tree.node_mut(id).children.insert(name, child_id);
                self.offer_selector(Some(id), child_id)?;
            } else {
                let flag = match field.meta.mode {
                    Mode::Flat | Mode::SSnake => name.clone(),
                    Mode::Snake | Mode::Ignore => join(&prefix, sep, &name),
                };
                let exposed = !(hidden || self.is_ignored(&flag));
                if exposed {
                    let nargs = match field.container {
                        ContainerKind::None => Nargs::One,
                        _ => Nargs::Many,
                    };
                    let action = Action::Leaf {
                        node: id,
                        field: name.clone(),
                    };
                    self.register(id, &flag, Flag { nargs, action })?;
                }
                self.tree.node_mut(id).leaves.insert(
                    name,
                    ParamNode {
                        field,
                        flag: exposed.then_some(flag),
                        value: Slot::Unset,
                    },
                );
            }
        }
        Ok(())
    }

    /// Drop every flag and pending entry registered below `id`.
    fn detach(&mut self, id: NodeId) {
        for node in self.tree.subtree(id) {
            let owned = std::mem::take(&mut self.tree.node_mut(node).owned_flags);
            for flag in owned {
                self.flags.shift_remove(&flag);
                self.pending.shift_remove(&flag);
                self.unresolved.shift_remove(&flag);
            }
        }
    }
}

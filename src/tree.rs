//! The parameter tree mirrors the configuration shape discovered so far.
//!
//! Structure nodes live in an arena and are addressed by [`NodeId`]. A node
//! is never mutated into another type: selecting a new type for a field
//! allocates a fresh node and points the parent's slot at it, leaving the
//! old subtree unreachable.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::describe::FieldDescriptor;
use crate::types::ContainerKind;

pub(crate) type NodeId = usize;

/// Value held by a leaf.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Unset,
    /// Explicitly cleared with the none sentinel.
    Null,
    Value(Value),
}

impl Slot {
    pub(crate) fn value(&self) -> Option<Value> {
        match self {
            Slot::Unset => None,
            Slot::Null => Some(Value::Null),
            Slot::Value(v) => Some(v.clone()),
        }
    }
}

/// Resolution state of a structure node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolved {
    Pending,
    Null,
    Record(String),
    /// List, set or dict of structure nodes; children are the elements.
    Aggregate(ContainerKind),
}

#[derive(Debug, Clone)]
pub(crate) struct ParamNode {
    pub field: FieldDescriptor,
    /// `None` when the field is hidden by an ignore rule.
    pub flag: Option<String>,
    pub value: Slot,
}

#[derive(Debug, Clone)]
pub(crate) struct StructNode {
    pub name: String,
    /// The field this node fills. Elements of an aggregate share the
    /// aggregate's field.
    pub field: FieldDescriptor,
    /// Selector path of this node.
    pub flag: String,
    /// Path the node's own fields extend.
    pub prefix: String,
    pub resolved: Resolved,
    pub default: Option<Value>,
    pub override_missing: bool,
    /// Hidden by a root ignore rule, along with everything below it.
    pub hidden: bool,
    pub children: IndexMap<String, NodeId>,
    pub leaves: IndexMap<String, ParamNode>,
    /// Flag paths registered while expanding this node.
    pub owned_flags: Vec<String>,
}

impl StructNode {
    pub(crate) fn new(
        name: &str,
        field: FieldDescriptor,
        flag: String,
        prefix: String,
        default: Option<Value>,
    ) -> Self {
        Self {
            name: name.to_string(),
            field,
            flag,
            prefix,
            resolved: Resolved::Pending,
            default,
            override_missing: false,
            hidden: false,
            children: IndexMap::new(),
            leaves: IndexMap::new(),
            owned_flags: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ParamTree {
    nodes: Vec<StructNode>,
    roots: IndexMap<String, NodeId>,
}

impl ParamTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, node: StructNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn node(&self, id: NodeId) -> &StructNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut StructNode {
        &mut self.nodes[id]
    }

    pub(crate) fn roots(&self) -> &IndexMap<String, NodeId> {
        &self.roots
    }

    /// Node currently filling `field` of `parent`; `None` addresses a root.
    pub(crate) fn slot(&self, parent: Option<NodeId>, field: &str) -> Option<NodeId> {
        match parent {
            None => self.roots.get(field).copied(),
            Some(p) => self.nodes[p].children.get(field).copied(),
        }
    }

    pub(crate) fn set_slot(&mut self, parent: Option<NodeId>, field: &str, id: NodeId) {
        match parent {
            None => self.roots.insert(field.to_string(), id),
            Some(p) => self.nodes[p].children.insert(field.to_string(), id),
        };
    }

    /// `id` and every node below it, parents before children.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            out.extend(self.nodes[out[i]].children.values().copied());
            i += 1;
        }
        out
    }

    pub(crate) fn is_leaf_unset(&self, id: NodeId, leaf: &str) -> bool {
        self.nodes[id]
            .leaves
            .get(leaf)
            .is_none_or(|p| p.value == Slot::Unset)
    }

    /// Every set leaf value of `id`, then the value of every child computed
    /// by `child`.
    pub(crate) fn collect_all_values<E>(
        &self,
        id: NodeId,
        mut child: impl FnMut(NodeId) -> Result<Value, E>,
    ) -> Result<Map<String, Value>, E> {
        let node = &self.nodes[id];
        let mut values = Map::new();
        for (name, leaf) in &node.leaves {
            if self.is_leaf_unset(id, name) {
                continue;
            }
            values.insert(name.clone(), leaf.value.value().unwrap_or(Value::Null));
        }
        for (name, &child_id) in &node.children {
            values.insert(name.clone(), child(child_id)?);
        }
        Ok(values)
    }
}

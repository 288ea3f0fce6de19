//! The elaboration unit registry.
//!
//! Every top-level unit (module, package, interface, specialized module) is
//! registered by name while the walker runs. The registry preserves first
//! insertion order so the assembled design is deterministic; re-registering a
//! name replaces the entity but keeps its original position.

use std::collections::HashMap;

use strata_ast::NodeId;
use strata_common::Ident;

/// Insertion-ordered map from unit name to its node.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    order: Vec<Ident>,
    units: HashMap<Ident, NodeId>,
}

impl UnitRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node` under `name`, replacing any previous entity.
    pub fn insert(&mut self, name: Ident, node: NodeId) {
        if self.units.insert(name, node).is_none() {
            self.order.push(name);
        }
    }

    /// Looks up a unit by name.
    pub fn get(&self, name: Ident) -> Option<NodeId> {
        self.units.get(&name).copied()
    }

    /// Returns `true` if a unit with this name is registered.
    pub fn contains(&self, name: Ident) -> bool {
        self.units.contains_key(&name)
    }

    /// All units in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Ident, NodeId)> + '_ {
        self.order.iter().map(|name| (*name, self.units[name]))
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

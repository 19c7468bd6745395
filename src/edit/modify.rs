//! Node-level plan edits.
//!
//! A [`ModificationSpec`] maps node ids from a previously stamped plan to the
//! operator the user would rather see there. Applying it only rewrites the
//! in-memory tree for preview; getting the engine to agree is the job of the
//! directive compiler.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::plan::PlanNode;

/// Overrides requested for a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeModification {
    #[serde(
        rename = "Scan Type",
        alias = "scan_type",
        alias = "scanType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scan_type: Option<String>,

    #[serde(
        rename = "Node Type",
        alias = "node_type",
        alias = "nodeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub node_type: Option<String>,
}

impl NodeModification {
    /// Request a different scan method.
    pub fn scan(scan_type: impl Into<String>) -> Self {
        Self {
            scan_type: Some(scan_type.into()),
            node_type: None,
        }
    }

    /// Request a different operator.
    pub fn operator(node_type: impl Into<String>) -> Self {
        Self {
            scan_type: None,
            node_type: Some(node_type.into()),
        }
    }

    /// Also request a different operator.
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// The node type this modification leaves behind.
    ///
    /// The scan override is applied first and the operator override second,
    /// so `node_type` wins when both are present.
    pub fn resulting_node_type(&self) -> Option<&str> {
        self.node_type.as_deref().or(self.scan_type.as_deref())
    }
}

/// Per-node edits keyed by node id, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModificationSpec {
    entries: Vec<(u64, NodeModification)>,
}

impl ModificationSpec {
    /// Create an empty set of edits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the edit for a node, returning the one it replaced.
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, node_id: u64, modification: NodeModification) -> Option<NodeModification> {
        match self.entries.iter_mut().find(|(id, _)| *id == node_id) {
            Some((_, existing)) => Some(std::mem::replace(existing, modification)),
            None => {
                self.entries.push((node_id, modification));
                None
            }
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, node_id: u64, modification: NodeModification) -> Self {
        self.insert(node_id, modification);
        self
    }

    /// Edit requested for a node.
    pub fn get(&self, node_id: u64) -> Option<&NodeModification> {
        self.entries
            .iter()
            .find(|(id, _)| *id == node_id)
            .map(|(_, m)| m)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &NodeModification)> {
        self.entries.iter().map(|(id, m)| (*id, m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse edits from a JSON object such as `{"11": {"Scan Type": "Index Scan"}}`.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl FromIterator<(u64, NodeModification)> for ModificationSpec {
    fn from_iter<I: IntoIterator<Item = (u64, NodeModification)>>(iter: I) -> Self {
        let mut spec = ModificationSpec::new();
        for (id, modification) in iter {
            spec.insert(id, modification);
        }
        spec
    }
}

impl Serialize for ModificationSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, modification) in &self.entries {
            map.serialize_entry(&id.to_string(), modification)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ModificationSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SpecVisitor)
    }
}

struct SpecVisitor;

impl<'de> Visitor<'de> for SpecVisitor {
    type Value = ModificationSpec;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map from node id to node modification")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut spec = ModificationSpec::new();
        while let Some((key, modification)) = access.next_entry::<String, NodeModification>()? {
            let node_id = key
                .trim()
                .parse::<u64>()
                .map_err(|_| de::Error::custom(format!("invalid node id: {:?}", key)))?;
            spec.insert(node_id, modification);
        }
        Ok(spec)
    }
}

/// Return a copy of `root` with the requested node types swapped in.
///
/// Every node is visited once in pre-order. Only `node_type` changes; the
/// shape, child order and all other fields are kept. Ids with no matching
/// node are ignored.
pub fn apply_modifications(root: &PlanNode, mods: &ModificationSpec) -> PlanNode {
    let index: HashMap<u64, &NodeModification> = mods.iter().collect();
    let mut modified = root.clone();
    let mut applied = 0usize;

    let mut stack = vec![&mut modified];
    while let Some(node) = stack.pop() {
        if let Some(modification) = node.node_id.and_then(|id| index.get(&id)) {
            if let Some(ref scan_type) = modification.scan_type {
                node.node_type = scan_type.clone();
            }
            if let Some(ref node_type) = modification.node_type {
                node.node_type = node_type.clone();
            }
            applied += 1;
        }
        stack.extend(node.children.iter_mut().rev());
    }

    debug!(requested = mods.len(), applied, "applied plan modifications");
    modified
}

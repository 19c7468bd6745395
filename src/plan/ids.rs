//! Node identifier assignment.
//!
//! Every freshly retrieved plan is stamped from the root down. The default
//! scheme encodes the path from the root as decimal digits: the root is `1`
//! and child `i` of node `k` is `k * 10 + i`, so an id alone tells a viewer
//! where the node sits. Uniqueness is only guaranteed while every node has
//! fewer than ten children; [`IdScheme::PreOrder`] trades the readable path
//! for uniqueness at any fan-out. Both schemes record `parent_id` on every node.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use super::error::{PlanError, PlanResult};
use super::node::PlanNode;

/// Default bound on plan depth for tree walks.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How node ids are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdScheme {
    /// Decimal path encoding, `child = parent * 10 + index`.
    #[default]
    PathEncoded,

    /// Pre-order counter starting at 1.
    PreOrder,
}

impl fmt::Display for IdScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdScheme::PathEncoded => write!(f, "path"),
            IdScheme::PreOrder => write!(f, "preorder"),
        }
    }
}

impl std::str::FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "path" | "path-encoded" | "path_encoded" => Ok(IdScheme::PathEncoded),
            "preorder" | "pre-order" | "pre_order" | "sequential" => Ok(IdScheme::PreOrder),
            _ => Err(format!("unknown id scheme: {}", s)),
        }
    }
}

/// Outcome of stamping a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdReport {
    /// Nodes stamped.
    pub nodes: usize,
    /// Deepest level reached, the root being level 1.
    pub depth: usize,
    /// Nodes whose id was already taken by an earlier node.
    pub collisions: usize,
}

/// Stamp every node of `root` with a fresh id, replacing any previous ids.
///
/// Only `node_id` and `parent_id` are written. Fails without touching the
/// remaining nodes if the tree is deeper than `max_depth` or a path-encoded
/// id no longer fits in a `u64`.
pub fn assign_ids(root: &mut PlanNode, scheme: IdScheme, max_depth: usize) -> PlanResult<IdReport> {
    let mut report = IdReport {
        nodes: 0,
        depth: 0,
        collisions: 0,
    };
    let mut seen = HashSet::new();
    let mut counter = 0u64;

    // (node, path id, parent id, depth)
    let mut stack: Vec<(&mut PlanNode, u64, Option<u64>, usize)> = vec![(root, 1, None, 1)];

    while let Some((node, path_id, parent_id, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(PlanError::TooDeep { max_depth });
        }

        counter += 1;
        let id = match scheme {
            IdScheme::PathEncoded => path_id,
            IdScheme::PreOrder => counter,
        };

        node.node_id = Some(id);
        node.parent_id = parent_id;
        if !seen.insert(id) {
            report.collisions += 1;
        }
        report.nodes += 1;
        report.depth = report.depth.max(depth);

        let base = match scheme {
            IdScheme::PathEncoded if !node.children.is_empty() => id
                .checked_mul(10)
                .ok_or(PlanError::IdOverflow { parent_id: id })?,
            _ => 0,
        };

        for (i, child) in node.children.iter_mut().enumerate().rev() {
            let child_path = match scheme {
                IdScheme::PathEncoded => base
                    .checked_add(i as u64)
                    .ok_or(PlanError::IdOverflow { parent_id: id })?,
                IdScheme::PreOrder => 0,
            };
            stack.push((child, child_path, Some(id), depth + 1));
        }
    }

    if report.collisions > 0 {
        warn!(
            collisions = report.collisions,
            scheme = %scheme,
            "node ids collide; a node has more than ten children"
        );
    }

    Ok(report)
}

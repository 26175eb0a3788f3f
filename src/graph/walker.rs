//! Generic Graph Walker
//!
//! Visits every node reachable from one or more roots exactly once. Nodes are
//! deduplicated by identity (the address of their shared allocation), never
//! by value, so cyclic graphs terminate and shared subgraphs are visited once.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::{NodeHandle, Shape};

/// Callback verdict for record nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Walk the record's fields
    Descend,
    /// Treat the record as a leaf
    SkipFields,
}

/// Identity of a node: the address of its allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdentity(usize);

impl NodeIdentity {
    pub fn of<T: ?Sized>(node: &Arc<T>) -> Self {
        Self(Arc::as_ptr(node) as *const () as usize)
    }
}

/// Depth-first, pre-order walker with an identity visited-set.
///
/// The visited-set survives across [`GraphWalker::walk`] calls, so one walker
/// can cover several roots while still visiting shared nodes once. Visited
/// handles are retained until the walker is dropped so an address can never
/// be reused by a different node mid-walk.
#[derive(Default)]
pub struct GraphWalker {
    visited: HashSet<NodeIdentity>,
    retained: Vec<NodeHandle>,
}

impl GraphWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, node: &NodeHandle) -> bool {
        self.visited.contains(&NodeIdentity::of(node))
    }

    /// Number of distinct nodes visited so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Walk everything reachable from `root` that has not been visited yet.
    ///
    /// `visit` is called once per newly reached node. Its verdict only matters
    /// for records: sequence items and mapping keys and values are always
    /// descended into. Opaque nodes and records whose fields cannot be read are
    /// leaves. Returns the number of nodes newly visited.
    pub fn walk<F>(&mut self, root: &NodeHandle, mut visit: F) -> usize
    where
        F: FnMut(&NodeHandle) -> Visit,
    {
        let before = self.visited.len();
        let mut stack = vec![Arc::clone(root)];

        while let Some(node) = stack.pop() {
            if !self.visited.insert(NodeIdentity::of(&node)) {
                continue;
            }

            let verdict = visit(&node);
            match node.shape() {
                Shape::Sequence(items) => {
                    stack.extend(items.iter().rev().cloned());
                }
                Shape::Mapping(entries) => {
                    for (key, value) in entries.iter().rev() {
                        stack.push(Arc::clone(value));
                        stack.push(Arc::clone(key));
                    }
                }
                Shape::Record if verdict == Visit::Descend => match node.fields() {
                    Ok(fields) => {
                        stack.extend(fields.into_iter().rev().map(|(_, value)| value));
                    }
                    Err(e) => debug!("Skipping fields: {}", e),
                },
                Shape::Record | Shape::Scalar(_) | Shape::Opaque => {}
            }
            self.retained.push(node);
        }

        self.visited.len() - before
    }
}

/// Walk a single root with a fresh walker
pub fn walk<F>(root: &NodeHandle, visit: F) -> usize
where
    F: FnMut(&NodeHandle) -> Visit,
{
    GraphWalker::new().walk(root, visit)
}

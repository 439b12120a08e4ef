//! Dependency graph - THE source of truth for derived relationships.
//!
//! A directed acyclic graph of typed edges between entity ids. An edge
//! `from -> to` states that `to` derives part of its geometry from `from`.
//! The graph owns cycle prevention (`add` is the sole integrity gate),
//! bidirectional lookup indices, and topological collection of everything
//! reachable from a dirty set.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{EntityId, PathNodeId};
use crate::error::{DocumentError, Result};

/// Dependency edge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyId(pub Uuid);

impl DependencyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DependencyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DependencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which slot of the owning entity an `ObjectToPoint` edge writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKey {
    ShapeP1,
    ShapeP2,
    LineP1,
    LineP2,
    PathNode(PathNodeId),
}

/// Typed edge semantics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DependencyKind {
    /// The source Point's coordinates are copied into the named slot of the
    /// target entity (shape corner, line endpoint, path node).
    ObjectToPoint { key: SlotKey },
    /// Target Point = lerp of the source Line's endpoints by `r` (unclamped).
    PointOnLine { r: f64 },
    /// Target Point = source Shape origin + (rx * width, ry * height).
    PointOnShape { rx: f64, ry: f64 },
}

/// A directed, typed edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub from: EntityId,
    pub to: EntityId,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(from: EntityId, to: EntityId, kind: DependencyKind) -> Self {
        Self {
            id: DependencyId::new(),
            from,
            to,
            kind,
        }
    }

    /// Same edge under a fresh id, re-sourced at `from`. Used by point merge.
    pub fn resourced(&self, from: EntityId) -> Self {
        Self {
            id: DependencyId::new(),
            from,
            to: self.to,
            kind: self.kind,
        }
    }

    pub fn is_object_to_point(&self) -> bool {
        matches!(self.kind, DependencyKind::ObjectToPoint { .. })
    }
}

/// Edge store with three indices: by id, by source entity, by target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DependencyGraph {
    edges: HashMap<DependencyId, Dependency>,
    by_from: HashMap<EntityId, Vec<DependencyId>>,
    by_to: HashMap<EntityId, Vec<DependencyId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, id: DependencyId) -> Option<&Dependency> {
        self.edges.get(&id)
    }

    /// All edges sourced at `id`. Empty if none.
    pub fn get_by_from_id(&self, id: EntityId) -> Vec<&Dependency> {
        self.by_from
            .get(&id)
            .map(|ids| ids.iter().map(|d| &self.edges[d]).collect())
            .unwrap_or_default()
    }

    /// All edges targeting `id`. Empty if none.
    pub fn get_by_to_id(&self, id: EntityId) -> Vec<&Dependency> {
        self.by_to
            .get(&id)
            .map(|ids| ids.iter().map(|d| &self.edges[d]).collect())
            .unwrap_or_default()
    }

    /// Insert an edge. Fails with `Cycle` if `from` is already reachable from
    /// `to` (the new edge would close the loop). This is the only code path
    /// that may grow the edge set.
    pub fn add(&mut self, dep: Dependency) -> Result<()> {
        if dep.from == dep.to || self.is_reachable(dep.to, dep.from) {
            return Err(DocumentError::Cycle {
                from: dep.from,
                to: dep.to,
            });
        }
        debug_assert!(!self.edges.contains_key(&dep.id), "duplicate edge id");
        self.by_from.entry(dep.from).or_default().push(dep.id);
        self.by_to.entry(dep.to).or_default().push(dep.id);
        self.edges.insert(dep.id, dep);
        self.debug_check_indices();
        Ok(())
    }

    /// Remove one edge from all three indices.
    pub fn delete_by_id(&mut self, id: DependencyId) -> Result<Dependency> {
        let dep = self
            .edges
            .remove(&id)
            .ok_or(DocumentError::DependencyNotFound(id))?;
        Self::unindex(&mut self.by_from, dep.from, id);
        Self::unindex(&mut self.by_to, dep.to, id);
        self.debug_check_indices();
        Ok(dep)
    }

    /// Remove every edge touching `id` as source or target. Idempotent within
    /// one call even when an edge shows up in both unions.
    pub fn delete_by_entity_id(&mut self, id: EntityId) {
        let mut touching: Vec<DependencyId> = Vec::new();
        touching.extend(self.by_from.get(&id).into_iter().flatten());
        touching.extend(self.by_to.get(&id).into_iter().flatten());
        for dep_id in touching {
            if self.edges.contains_key(&dep_id) {
                // Cannot fail: the id came from a live index entry.
                let _ = self.delete_by_id(dep_id);
            }
        }
    }

    /// True if `to` can be reached from `from` by following edges forward.
    /// Success requires `to` to appear as an actual edge target, so a node is
    /// not considered reachable from itself unless a loop exists.
    pub fn is_reachable(&self, from: EntityId, to: EntityId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            for dep in self.get_by_from_id(id) {
                if dep.to == to {
                    return true;
                }
                stack.push(dep.to);
            }
        }
        false
    }

    /// Collect every edge transitively reachable by following outgoing edges
    /// from the given dirty entities, in a valid evaluation order: if edge B
    /// reads the entity edge A writes, A comes first. Each edge appears once
    /// even when reachable from several sources.
    pub fn collect_dependencies(&self, sources: &[EntityId]) -> Vec<Dependency> {
        let mut visited = HashSet::new();
        let mut postorder = Vec::new();
        for &src in sources {
            self.postorder_from(src, &mut visited, &mut postorder);
        }
        // Reverse postorder is a topological order over the reached entities;
        // emitting each entity's outgoing edges in that order puts every edge
        // before the edges that consume its target.
        let mut out = Vec::new();
        for &id in postorder.iter().rev() {
            for dep in self.get_by_from_id(id) {
                out.push(dep.clone());
            }
        }
        out
    }

    /// Iterative depth-first postorder over entities, shared `visited` across
    /// sources so each entity is expanded at most once.
    fn postorder_from(
        &self,
        start: EntityId,
        visited: &mut HashSet<EntityId>,
        postorder: &mut Vec<EntityId>,
    ) {
        let mut stack = vec![(start, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                postorder.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            stack.push((id, true));
            for dep in self.get_by_from_id(id) {
                if !visited.contains(&dep.to) {
                    stack.push((dep.to, false));
                }
            }
        }
    }

    fn unindex(index: &mut HashMap<EntityId, Vec<DependencyId>>, key: EntityId, id: DependencyId) {
        if let Some(ids) = index.get_mut(&key) {
            ids.retain(|d| *d != id);
            if ids.is_empty() {
                index.remove(&key);
            }
        }
    }

    /// Indices must agree with the primary map at every mutation boundary.
    fn debug_check_indices(&self) {
        #[cfg(debug_assertions)]
        {
            let from_count: usize = self.by_from.values().map(Vec::len).sum();
            let to_count: usize = self.by_to.values().map(Vec::len).sum();
            debug_assert_eq!(from_count, self.edges.len());
            debug_assert_eq!(to_count, self.edges.len());
            for (id, dep) in &self.edges {
                debug_assert_eq!(*id, dep.id);
                debug_assert!(self.by_from[&dep.from].contains(id));
                debug_assert!(self.by_to[&dep.to].contains(id));
            }
        }
    }
}

//! The immutable document snapshot.
//!
//! A `Document` is a value: entities by id, an explicit z-order, and the
//! dependency graph between them. Snapshots are never mutated after they are
//! handed out - all edits go through a `Transaction`, which clones the maps
//! once and publishes a fresh snapshot on commit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dependency::DependencyGraph;
use crate::entity::{Entity, EntityId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    /// All entities by id.
    pub(crate) objects: HashMap<EntityId, Entity>,
    /// Render/selection order, back-most first. Exactly the key set of
    /// `objects`, each id once.
    pub(crate) object_ids: Vec<EntityId>,
    /// Derived relationships between entities.
    pub(crate) dependencies: DependencyGraph,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Z-order, index 0 is back-most.
    pub fn object_ids(&self) -> &[EntityId] {
        &self.object_ids
    }

    /// Entities in z-order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.object_ids.iter().map(|id| &self.objects[id])
    }

    pub fn dependencies(&self) -> &DependencyGraph {
        &self.dependencies
    }

    /// `object_ids` and `objects` must describe the same id set. Checked at
    /// commit boundaries in debug builds.
    pub(crate) fn debug_check_order(&self) {
        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(self.object_ids.len(), self.objects.len());
            for id in &self.object_ids {
                debug_assert!(self.objects.contains_key(id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Point;

    #[test]
    fn iter_follows_z_order() {
        let mut doc = Document::new();
        let a = EntityId::new();
        let b = EntityId::new();
        doc.objects.insert(a, Entity::Point(Point::new(a, 0.0, 0.0)));
        doc.objects.insert(b, Entity::Point(Point::new(b, 1.0, 1.0)));
        doc.object_ids = vec![b, a];
        let order: Vec<EntityId> = doc.iter().map(Entity::id).collect();
        assert_eq!(order, vec![b, a]);
    }
}

//! Transactional edit pipeline - every document mutation goes through here.
//!
//! A `Transaction` buffers commands against one immutable snapshot, then
//! `commit()` applies them in order against working copies and propagates
//! derived geometry along the dependency graph, publishing the next snapshot.
//! Nothing is published on failure, so callers just drop a failed transaction
//! and keep the prior snapshot.
//!
//! Commit runs in two phases:
//! 1. apply commands in recorded order, appending changed ids to a dirty list;
//! 2. collect every dependency reachable from the dirty set in evaluation
//!    order and replay each edge's rule against the working copy, so later
//!    edges observe earlier edges' effects.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace, warn};

use crate::dependency::{Dependency, DependencyId, DependencyKind, SlotKey};
use crate::document::Document;
use crate::entity::{Entity, EntityId};
use crate::error::{DocumentError, Result};
use crate::geometry::{Position, Rect};

/// Caller-supplied pure transform for `update`. Must not rely on hidden
/// state and must return an entity with the same id.
pub type UpdateFn = Box<dyn Fn(&Entity) -> Entity>;

enum Command {
    Insert(Vec<Entity>),
    Replace(Vec<Entity>),
    Delete(Vec<EntityId>),
    Scale {
        ids: Vec<EntityId>,
        pivot: Position,
        sx: f64,
        sy: f64,
    },
    Translate {
        ids: Vec<EntityId>,
        dx: f64,
        dy: f64,
    },
    SetPointPosition {
        id: EntityId,
        pos: Position,
    },
    MergePoints {
        from: EntityId,
        to: EntityId,
    },
    Update {
        ids: Vec<EntityId>,
        f: UpdateFn,
    },
    AddDependency(Dependency),
    DeleteDependencies(Vec<DependencyId>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Insert(_) => "insert",
            Command::Replace(_) => "replace",
            Command::Delete(_) => "delete",
            Command::Scale { .. } => "scale",
            Command::Translate { .. } => "translate",
            Command::SetPointPosition { .. } => "set_point_position",
            Command::MergePoints { .. } => "merge_points",
            Command::Update { .. } => "update",
            Command::AddDependency(_) => "add_dependency",
            Command::DeleteDependencies(_) => "delete_dependencies",
        }
    }
}

/// Command batch builder over one snapshot. Single-use: `commit` consumes the
/// transaction, so a committed transaction cannot be reused.
pub struct Transaction {
    working: Document,
    commands: Vec<Command>,
}

impl Transaction {
    /// Start a transaction against a snapshot. The snapshot's maps are cloned
    /// once here; the original is never touched.
    pub fn new(doc: &Document) -> Self {
        Self {
            working: doc.clone(),
            commands: Vec::new(),
        }
    }

    fn push(mut self, cmd: Command) -> Self {
        self.commands.push(cmd);
        self
    }

    /// Insert new entities and append them to the z-order.
    pub fn insert(self, entities: Vec<Entity>) -> Self {
        self.push(Command::Insert(entities))
    }

    /// Overwrite entities at their existing ids.
    pub fn replace(self, entities: Vec<Entity>) -> Self {
        self.push(Command::Replace(entities))
    }

    /// Delete entities. Points named here are ignored; Points disappear only
    /// when their last owning dependency goes away.
    pub fn delete(self, ids: Vec<EntityId>) -> Self {
        self.push(Command::Delete(ids))
    }

    /// Scale entities about a pivot. Moves the owning Points, never the
    /// derived geometry directly.
    pub fn scale(self, ids: Vec<EntityId>, pivot: Position, sx: f64, sy: f64) -> Self {
        self.push(Command::Scale { ids, pivot, sx, sy })
    }

    /// Translate entities by a delta, through their owning Points.
    pub fn translate(self, ids: Vec<EntityId>, dx: f64, dy: f64) -> Self {
        self.push(Command::Translate { ids, dx, dy })
    }

    /// Set one Point's absolute position.
    pub fn set_point_position(self, id: EntityId, pos: Position) -> Self {
        self.push(Command::SetPointPosition { id, pos })
    }

    /// Merge Point `from` into Point `to`: everything sourced at `from` is
    /// re-created sourced at `to`, then `from` is removed.
    pub fn merge_points(self, from: EntityId, to: EntityId) -> Self {
        self.push(Command::MergePoints { from, to })
    }

    /// Run a pure transform over each targeted entity and store the result.
    pub fn update(self, ids: Vec<EntityId>, f: impl Fn(&Entity) -> Entity + 'static) -> Self {
        self.push(Command::Update {
            ids,
            f: Box::new(f),
        })
    }

    pub fn add_dependency(self, dep: Dependency) -> Self {
        self.push(Command::AddDependency(dep))
    }

    pub fn delete_dependencies(self, ids: Vec<DependencyId>) -> Self {
        self.push(Command::DeleteDependencies(ids))
    }

    /// Apply the buffered commands and propagate derived geometry, returning
    /// the next snapshot. On error nothing is published.
    pub fn commit(self) -> Result<Document> {
        let Transaction {
            mut working,
            commands,
        } = self;
        let mut dirty: Vec<EntityId> = Vec::new();

        debug!(commands = commands.len(), "commit: applying");
        for cmd in commands {
            trace!(command = cmd.name(), "apply");
            apply(&mut working, &mut dirty, cmd)?;
        }

        propagate(&mut working, &dirty)?;
        working.debug_check_order();
        debug!(
            objects = working.len(),
            edges = working.dependencies().len(),
            "commit: done"
        );
        Ok(working)
    }
}

// --- Phase 1: command application ---

fn apply(doc: &mut Document, dirty: &mut Vec<EntityId>, cmd: Command) -> Result<()> {
    match cmd {
        Command::Insert(entities) => {
            for entity in entities {
                let id = entity.id();
                debug_assert!(!doc.objects.contains_key(&id), "insert of existing id");
                doc.objects.insert(id, entity);
                doc.object_ids.push(id);
                dirty.push(id);
            }
        }
        Command::Replace(entities) => {
            for entity in entities {
                let id = entity.id();
                if !doc.objects.contains_key(&id) {
                    return Err(DocumentError::EntityNotFound(id));
                }
                doc.objects.insert(id, entity);
                dirty.push(id);
            }
        }
        Command::Delete(ids) => apply_delete(doc, dirty, ids)?,
        Command::Scale { ids, pivot, sx, sy } => {
            for pid in resolve_owning_points(doc, &ids)? {
                let point = doc.objects.get_mut(&pid).and_then(Entity::as_point_mut);
                if let Some(point) = point {
                    let moved = point.position().scaled_about(pivot, sx, sy);
                    point.set_position(moved);
                    dirty.push(pid);
                }
            }
        }
        Command::Translate { ids, dx, dy } => {
            for pid in resolve_owning_points(doc, &ids)? {
                let point = doc.objects.get_mut(&pid).and_then(Entity::as_point_mut);
                if let Some(point) = point {
                    let moved = point.position().translated(dx, dy);
                    point.set_position(moved);
                    dirty.push(pid);
                }
            }
        }
        Command::SetPointPosition { id, pos } => {
            set_point_position(doc, id, pos)?;
            dirty.push(id);
        }
        Command::MergePoints { from, to } => {
            expect_point(doc, from)?;
            expect_point(doc, to)?;
            let outgoing: Vec<Dependency> = doc
                .dependencies
                .get_by_from_id(from)
                .into_iter()
                .cloned()
                .collect();
            for dep in &outgoing {
                doc.dependencies.add(dep.resourced(to))?;
            }
            doc.dependencies.delete_by_entity_id(from);
            doc.objects.remove(&from);
            doc.object_ids.retain(|id| *id != from);
            dirty.push(to);
        }
        Command::Update { ids, f } => {
            for id in ids {
                let entity = doc
                    .objects
                    .get(&id)
                    .ok_or(DocumentError::EntityNotFound(id))?;
                let updated = f(entity);
                debug_assert_eq!(updated.id(), id, "update changed the entity id");
                doc.objects.insert(id, updated);
                dirty.push(id);
            }
        }
        Command::AddDependency(dep) => {
            let from = dep.from;
            doc.dependencies.add(dep)?;
            // Mark the source dirty so the new edge is evaluated even when no
            // coordinate changed in this batch.
            dirty.push(from);
        }
        Command::DeleteDependencies(ids) => {
            for id in ids {
                doc.dependencies.delete_by_id(id)?;
            }
        }
    }
    Ok(())
}

/// Delete entities via an explicit worklist. Direct Point targets are ignored;
/// a Point is enqueued only when the removal of an owner leaves it with zero
/// outgoing edges. Incoming edges are captured before any edge removal.
fn apply_delete(doc: &mut Document, dirty: &mut Vec<EntityId>, ids: Vec<EntityId>) -> Result<()> {
    let mut queue: VecDeque<EntityId> = VecDeque::new();
    for id in ids {
        let entity = doc
            .objects
            .get(&id)
            .ok_or(DocumentError::EntityNotFound(id))?;
        if entity.is_point() {
            continue;
        }
        queue.push_back(id);
    }

    while let Some(id) = queue.pop_front() {
        if !doc.objects.contains_key(&id) {
            continue;
        }
        let incoming: Vec<Dependency> = doc
            .dependencies
            .get_by_to_id(id)
            .into_iter()
            .cloned()
            .collect();

        doc.objects.remove(&id);
        doc.object_ids.retain(|e| *e != id);
        doc.dependencies.delete_by_entity_id(id);
        dirty.push(id);

        for dep in incoming {
            if !dep.is_object_to_point() {
                continue;
            }
            let owner = dep.from;
            let orphaned = doc
                .objects
                .get(&owner)
                .is_some_and(Entity::is_point)
                && doc.dependencies.get_by_from_id(owner).is_empty();
            if orphaned {
                queue.push_back(owner);
            }
        }
    }
    Ok(())
}

/// Resolve the Points that transitively own the given entities, following
/// `ObjectToPoint` edges backwards. A targeted Point resolves to itself.
fn resolve_owning_points(doc: &Document, ids: &[EntityId]) -> Result<Vec<EntityId>> {
    let mut points = Vec::new();
    let mut seen = HashSet::new();
    let mut queue: VecDeque<EntityId> = ids.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let entity = doc
            .objects
            .get(&id)
            .ok_or(DocumentError::EntityNotFound(id))?;
        if entity.is_point() {
            points.push(id);
            continue;
        }
        for dep in doc.dependencies.get_by_to_id(id) {
            if dep.is_object_to_point() {
                queue.push_back(dep.from);
            }
        }
    }
    Ok(points)
}

// --- Phase 2: propagation ---

fn propagate(doc: &mut Document, dirty: &[EntityId]) -> Result<()> {
    let deps = doc.dependencies.collect_dependencies(dirty);
    trace!(dirty = dirty.len(), edges = deps.len(), "propagate");
    for dep in deps {
        evaluate(doc, &dep)?;
    }
    Ok(())
}

/// Replay one edge's rule against the working copy. A missing entity is an
/// invariant violation and aborts the commit; an edge whose endpoints have the
/// wrong kinds is a caller bug that is logged and skipped, matching the
/// tolerance of point merges that carry edges between arbitrary sources.
fn evaluate(doc: &mut Document, dep: &Dependency) -> Result<()> {
    match dep.kind {
        DependencyKind::ObjectToPoint { key } => {
            let Some(pos) = point_position(doc, dep.from)? else {
                warn!(dep = %dep.id, "object-to-point edge sourced at a non-Point, skipping");
                return Ok(());
            };
            apply_slot(doc, dep, key, pos)
        }
        DependencyKind::PointOnLine { r } => {
            let line = match entity(doc, dep.from)? {
                Entity::Line(line) => line,
                other => {
                    warn!(dep = %dep.id, found = other.kind_name(), "point-on-line edge sourced at a non-Line, skipping");
                    return Ok(());
                }
            };
            let pos = line.p1().lerp(line.p2(), r);
            write_point(doc, dep, pos)
        }
        DependencyKind::PointOnShape { rx, ry } => {
            let shape = match entity(doc, dep.from)? {
                Entity::Shape(shape) => shape,
                other => {
                    warn!(dep = %dep.id, found = other.kind_name(), "point-on-shape edge sourced at a non-Shape, skipping");
                    return Ok(());
                }
            };
            let pos = Position::new(shape.x + rx * shape.width, shape.y + ry * shape.height);
            write_point(doc, dep, pos)
        }
    }
}

/// Copy a Point's position into the named slot of the target entity.
fn apply_slot(doc: &mut Document, dep: &Dependency, key: SlotKey, pos: Position) -> Result<()> {
    match (key, entity(doc, dep.to)?) {
        (SlotKey::LineP1, Entity::Line(_)) => {
            if let Some(Entity::Line(line)) = doc.objects.get_mut(&dep.to) {
                line.x1 = pos.x;
                line.y1 = pos.y;
            }
        }
        (SlotKey::LineP2, Entity::Line(_)) => {
            if let Some(Entity::Line(line)) = doc.objects.get_mut(&dep.to) {
                line.x2 = pos.x;
                line.y2 = pos.y;
            }
        }
        (SlotKey::ShapeP1 | SlotKey::ShapeP2, Entity::Shape(shape)) => {
            // Re-read both corner points and rebuild the rect normalized, so
            // the box stays valid when one corner is dragged past the other.
            let rect = shape.rect();
            let other_key = match key {
                SlotKey::ShapeP1 => SlotKey::ShapeP2,
                _ => SlotKey::ShapeP1,
            };
            let other_owner = doc
                .dependencies
                .get_by_to_id(dep.to)
                .into_iter()
                .find(|d| {
                    d.id != dep.id
                        && matches!(d.kind, DependencyKind::ObjectToPoint { key: k } if k == other_key)
                })
                .map(|d| d.from);
            let other_pos = match other_owner {
                Some(owner) => point_position(doc, owner)?.unwrap_or_else(|| {
                    fallback_corner(&rect, other_key)
                }),
                None => fallback_corner(&rect, other_key),
            };
            let rect = Rect::from_corners(pos, other_pos);
            if let Some(Entity::Shape(shape)) = doc.objects.get_mut(&dep.to) {
                shape.set_rect(rect);
            }
        }
        (SlotKey::PathNode(node_id), Entity::Path(path)) => {
            if !path.nodes.contains_key(&node_id) {
                warn!(dep = %dep.id, node = %node_id, "path node slot is gone, skipping");
                return Ok(());
            }
            if let Some(Entity::Path(path)) = doc.objects.get_mut(&dep.to) {
                if let Some(node) = path.nodes.get_mut(&node_id) {
                    node.point = pos;
                }
            }
        }
        (_, other) => {
            warn!(
                dep = %dep.id,
                found = other.kind_name(),
                "slot does not exist on target kind, skipping"
            );
        }
    }
    Ok(())
}

/// Corner used when a shape has no second owning point: keep the opposite
/// corner of the current rect fixed.
fn fallback_corner(rect: &Rect, missing: SlotKey) -> Position {
    match missing {
        SlotKey::ShapeP1 => rect.origin(),
        _ => rect.far_corner(),
    }
}

fn write_point(doc: &mut Document, dep: &Dependency, pos: Position) -> Result<()> {
    match entity(doc, dep.to)? {
        Entity::Point(_) => {
            set_point_position(doc, dep.to, pos)?;
        }
        other => {
            warn!(dep = %dep.id, found = other.kind_name(), "edge targets a non-Point, skipping");
        }
    }
    Ok(())
}

// --- Lookups ---

fn entity(doc: &Document, id: EntityId) -> Result<&Entity> {
    doc.objects.get(&id).ok_or(DocumentError::EntityNotFound(id))
}

/// Position of a Point, `None` if the entity exists but is not a Point.
fn point_position(doc: &Document, id: EntityId) -> Result<Option<Position>> {
    Ok(entity(doc, id)?.as_point().map(|p| p.position()))
}

fn expect_point(doc: &Document, id: EntityId) -> Result<()> {
    match entity(doc, id)? {
        Entity::Point(_) => Ok(()),
        other => Err(DocumentError::TypeMismatch {
            id,
            expected: "Point",
            found: other.kind_name(),
        }),
    }
}

fn set_point_position(doc: &mut Document, id: EntityId, pos: Position) -> Result<()> {
    expect_point(doc, id)?;
    if let Some(point) = doc.objects.get_mut(&id).and_then(Entity::as_point_mut) {
        point.set_position(pos);
    }
    Ok(())
}

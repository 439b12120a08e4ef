//! Graphical entity types - the value side of the document.
//!
//! Entities are plain data addressed by id; ownership lives in the
//! `Document`'s object map, never in references held elsewhere. The only
//! behavior here is per-kind bounding-rect computation and the slot accessors
//! the propagation rules write through.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Position, Rect};

/// Entity identifier - UUID for global uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a node within one Path entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathNodeId(pub Uuid);

impl PathNodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PathNodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PathNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stroke pattern for lines, shape outlines and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Stroke {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Named draw color with a neutral default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Color {
    #[default]
    Black,
    White,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

/// How a Text entity relates to its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TextSizing {
    /// Box grows to fit the content.
    #[default]
    Auto,
    /// Content wraps inside the fixed box.
    Fixed,
}

/// How a path terminates at an end node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PathEndType {
    #[default]
    Butt,
    Arrow,
}

/// A free coordinate, possibly shared by several dependents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(id: EntityId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn set_position(&mut self, pos: Position) {
        self.x = pos.x;
        self.y = pos.y;
    }
}

/// A straight segment whose endpoints are kept in sync with owning Points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: EntityId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub stroke: Stroke,
    #[serde(default)]
    pub color: Color,
}

impl Line {
    pub fn p1(&self) -> Position {
        Position::new(self.x1, self.y1)
    }

    pub fn p2(&self) -> Position {
        Position::new(self.x2, self.y2)
    }
}

/// An axis-aligned box whose corners are tracked by two owning Points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub stroke: Stroke,
    #[serde(default)]
    pub color: Color,
}

impl Shape {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }
}

/// Text at a position, either auto-sized or wrapped to a fixed box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content: String,
    #[serde(default)]
    pub sizing: TextSizing,
}

/// One node of a free-form path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub point: Position,
    #[serde(default)]
    pub end_type: PathEndType,
}

/// Free-form path: nodes by id plus an ordered edge list between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: EntityId,
    pub nodes: HashMap<PathNodeId, PathNode>,
    pub edges: Vec<(PathNodeId, PathNodeId)>,
    #[serde(default)]
    pub stroke: Stroke,
    #[serde(default)]
    pub color: Color,
}

/// A graphical primitive stored in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Point(Point),
    Line(Line),
    Shape(Shape),
    Text(Text),
    Path(Path),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Point(p) => p.id,
            Entity::Line(l) => l.id,
            Entity::Shape(s) => s.id,
            Entity::Text(t) => t.id,
            Entity::Path(p) => p.id,
        }
    }

    /// Kind name for diagnostics and type-mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::Point(_) => "Point",
            Entity::Line(_) => "Line",
            Entity::Shape(_) => "Shape",
            Entity::Text(_) => "Text",
            Entity::Path(_) => "Path",
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Entity::Point(_))
    }

    pub fn as_point(&self) -> Option<&Point> {
        match self {
            Entity::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_point_mut(&mut self) -> Option<&mut Point> {
        match self {
            Entity::Point(p) => Some(p),
            _ => None,
        }
    }

    /// Bounding rect of the entity, `None` for a Path with no nodes.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Entity::Point(p) => Some(Rect::new(p.x, p.y, 0.0, 0.0)),
            Entity::Line(l) => Some(Rect::from_corners(l.p1(), l.p2())),
            Entity::Shape(s) => Some(s.rect()),
            Entity::Text(t) => Some(Rect::new(t.x, t.y, t.width, t.height)),
            Entity::Path(p) => p
                .nodes
                .values()
                .map(|n| Rect::new(n.point.x, n.point.y, 0.0, 0.0))
                .reduce(|a, b| a.union(&b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_bounding_rect_normalizes_endpoints() {
        let line = Line {
            id: EntityId::new(),
            x1: 10.0,
            y1: 2.0,
            x2: 0.0,
            y2: 8.0,
            stroke: Stroke::Solid,
            color: Color::Black,
        };
        let rect = Entity::Line(line).bounding_rect().unwrap();
        assert_eq!(rect, Rect::new(0.0, 2.0, 10.0, 6.0));
    }

    #[test]
    fn empty_path_has_no_bounding_rect() {
        let path = Path {
            id: EntityId::new(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            stroke: Stroke::Solid,
            color: Color::Black,
        };
        assert!(Entity::Path(path).bounding_rect().is_none());
    }
}

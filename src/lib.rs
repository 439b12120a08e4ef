//! Document graph and constraint propagation engine for a 2D diagram editor.
//!
//! The crate owns three things:
//! - the entity model: Points, Lines, Shapes, Text and Paths stored by id in
//!   an immutable [`Document`] snapshot with an explicit z-order;
//! - the [`DependencyGraph`]: a directed acyclic graph of typed edges that
//!   derive one entity's geometry from another's (a point sitting 50% along a
//!   line, a point owning a shape corner);
//! - the [`Transaction`] pipeline: buffer a batch of edit commands, commit
//!   once, and every entity that depends on what changed is re-derived in
//!   dependency order before the next snapshot is published.
//!
//! Rendering, hit-testing, snapping and undo storage live in the surrounding
//! editor; they consume snapshots and the graph's query methods and issue
//! transactions back.
//!
//! ```
//! use sketchgraph::{
//!     Dependency, DependencyKind, Document, Entity, Point, Position, Transaction,
//! };
//!
//! let anchor = Point::new(sketchgraph::EntityId::new(), 0.0, 0.0);
//! let anchor_id = anchor.id;
//! let doc = Transaction::new(&Document::new())
//!     .insert(vec![Entity::Point(anchor)])
//!     .commit()
//!     .unwrap();
//! let doc = Transaction::new(&doc)
//!     .set_point_position(anchor_id, Position::new(3.0, 4.0))
//!     .commit()
//!     .unwrap();
//! assert_eq!(doc.get(anchor_id).unwrap().as_point().unwrap().x, 3.0);
//! ```

pub mod dependency;
pub mod document;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod transaction;

pub use dependency::{Dependency, DependencyGraph, DependencyId, DependencyKind, SlotKey};
pub use document::Document;
pub use entity::{
    Color, Entity, EntityId, Line, Path, PathEndType, PathNode, PathNodeId, Point, Shape, Stroke,
    Text, TextSizing,
};
pub use error::DocumentError;
pub use geometry::{Position, Rect};
pub use transaction::Transaction;

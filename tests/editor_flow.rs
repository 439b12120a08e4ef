//! End-to-end editor flows through the public API: build a small diagram,
//! drag and connect things across several commits, tear pieces down.

use std::collections::HashMap;

use sketchgraph::{
    Color, Dependency, DependencyKind, Document, Entity, EntityId, Path, PathNode, PathNodeId,
    Point, Position, Rect, Shape, SlotKey, Stroke, Transaction,
};

fn point(x: f64, y: f64) -> Point {
    Point::new(EntityId::new(), x, y)
}

fn shape(x: f64, y: f64, w: f64, h: f64) -> Shape {
    Shape {
        id: EntityId::new(),
        x,
        y,
        width: w,
        height: h,
        stroke: Stroke::Solid,
        color: Color::Black,
    }
}

fn shape_rect(doc: &Document, id: EntityId) -> Rect {
    match doc.get(id).unwrap() {
        Entity::Shape(s) => s.rect(),
        other => panic!("expected Shape, got {}", other.kind_name()),
    }
}

fn point_pos(doc: &Document, id: EntityId) -> Position {
    doc.get(id).unwrap().as_point().unwrap().position()
}

/// Two boxes connected by a line whose endpoints ride anchor points on the
/// box edges. Dragging one box re-routes the connector.
#[test]
fn connected_boxes_follow_a_dragged_box() {
    // Box A with owning corner points.
    let (a1, a2) = (point(0.0, 0.0), point(10.0, 10.0));
    let box_a = shape(0.0, 0.0, 0.0, 0.0);
    let (a1_id, a2_id, a_id) = (a1.id, a2.id, box_a.id);
    // Box B, static.
    let (b1, b2) = (point(30.0, 0.0), point(40.0, 10.0));
    let box_b = shape(0.0, 0.0, 0.0, 0.0);
    let (b1_id, b2_id, b_id) = (b1.id, b2.id, box_b.id);
    // Anchor points on the facing edges, and the connector line they own.
    let (qa, qb) = (point(0.0, 0.0), point(0.0, 0.0));
    let connector = sketchgraph::Line {
        id: EntityId::new(),
        x1: 0.0,
        y1: 0.0,
        x2: 0.0,
        y2: 0.0,
        stroke: Stroke::Dashed,
        color: Color::Blue,
    };
    let (qa_id, qb_id, conn_id) = (qa.id, qb.id, connector.id);

    let edge = |from, to, kind| Dependency::new(from, to, kind);
    let corner = |key| DependencyKind::ObjectToPoint { key };

    let doc = Transaction::new(&Document::new())
        .insert(vec![
            Entity::Point(a1),
            Entity::Point(a2),
            Entity::Shape(box_a),
            Entity::Point(b1),
            Entity::Point(b2),
            Entity::Shape(box_b),
            Entity::Point(qa),
            Entity::Point(qb),
            Entity::Line(connector),
        ])
        .add_dependency(edge(a1_id, a_id, corner(SlotKey::ShapeP1)))
        .add_dependency(edge(a2_id, a_id, corner(SlotKey::ShapeP2)))
        .add_dependency(edge(b1_id, b_id, corner(SlotKey::ShapeP1)))
        .add_dependency(edge(b2_id, b_id, corner(SlotKey::ShapeP2)))
        // Anchors ride the middle of the facing edges.
        .add_dependency(edge(a_id, qa_id, DependencyKind::PointOnShape { rx: 1.0, ry: 0.5 }))
        .add_dependency(edge(b_id, qb_id, DependencyKind::PointOnShape { rx: 0.0, ry: 0.5 }))
        // The connector's endpoints are owned by the anchors.
        .add_dependency(edge(qa_id, conn_id, corner(SlotKey::LineP1)))
        .add_dependency(edge(qb_id, conn_id, corner(SlotKey::LineP2)))
        .commit()
        .unwrap();

    assert_eq!(shape_rect(&doc, a_id), Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(point_pos(&doc, qa_id), Position::new(10.0, 5.0));
    assert_eq!(point_pos(&doc, qb_id), Position::new(30.0, 5.0));

    // Drag box A down-right; the whole chain re-derives in one commit.
    let doc = Transaction::new(&doc)
        .translate(vec![a_id], 5.0, 2.0)
        .commit()
        .unwrap();
    assert_eq!(shape_rect(&doc, a_id), Rect::new(5.0, 2.0, 10.0, 10.0));
    assert_eq!(point_pos(&doc, qa_id), Position::new(15.0, 7.0));
    match doc.get(conn_id).unwrap() {
        Entity::Line(l) => {
            assert_eq!(l.p1(), Position::new(15.0, 7.0));
            assert_eq!(l.p2(), Position::new(30.0, 5.0));
        }
        other => panic!("expected Line, got {}", other.kind_name()),
    }

    // Deleting box A takes its exclusive corner points along, but leaves the
    // shared world (box B, the connector, its anchors) in place. The anchor
    // qa loses its source and keeps its last derived position.
    let doc = Transaction::new(&doc).delete(vec![a_id]).commit().unwrap();
    assert!(!doc.contains(a_id));
    assert!(!doc.contains(a1_id));
    assert!(!doc.contains(a2_id));
    assert!(doc.contains(qa_id));
    assert!(doc.contains(conn_id));
    assert!(doc.dependencies().get_by_to_id(a_id).is_empty());
}

/// A path node owned by a point follows that point across commits.
#[test]
fn path_node_rides_its_owning_point() {
    let handle = point(1.0, 1.0);
    let handle_id = handle.id;
    let n1 = PathNodeId::new();
    let n2 = PathNodeId::new();
    let path = Path {
        id: EntityId::new(),
        nodes: HashMap::from([
            (n1, PathNode { point: Position::new(1.0, 1.0), end_type: Default::default() }),
            (n2, PathNode { point: Position::new(9.0, 1.0), end_type: Default::default() }),
        ]),
        edges: vec![(n1, n2)],
        stroke: Stroke::Dotted,
        color: Color::Red,
    };
    let path_id = path.id;

    let doc = Transaction::new(&Document::new())
        .insert(vec![Entity::Point(handle), Entity::Path(path)])
        .add_dependency(Dependency::new(
            handle_id,
            path_id,
            DependencyKind::ObjectToPoint {
                key: SlotKey::PathNode(n1),
            },
        ))
        .commit()
        .unwrap();

    let doc = Transaction::new(&doc)
        .set_point_position(handle_id, Position::new(4.0, 7.0))
        .commit()
        .unwrap();
    match doc.get(path_id).unwrap() {
        Entity::Path(p) => {
            assert_eq!(p.nodes[&n1].point, Position::new(4.0, 7.0));
            assert_eq!(p.nodes[&n2].point, Position::new(9.0, 1.0));
        }
        other => panic!("expected Path, got {}", other.kind_name()),
    }

    // Bounding rect spans the node points.
    let rect = doc.get(path_id).unwrap().bounding_rect().unwrap();
    assert_eq!(rect, Rect::new(4.0, 1.0, 5.0, 6.0));
}

/// Two transactions built against the same snapshot both commit; the second
/// result does not contain the first's effects.
#[test]
fn concurrent_transactions_against_one_snapshot_are_independent() {
    let p = point(0.0, 0.0);
    let p_id = p.id;
    let base = Transaction::new(&Document::new())
        .insert(vec![Entity::Point(p)])
        .commit()
        .unwrap();

    let tx_a = Transaction::new(&base).set_point_position(p_id, Position::new(1.0, 0.0));
    let tx_b = Transaction::new(&base).set_point_position(p_id, Position::new(0.0, 2.0));
    let a = tx_a.commit().unwrap();
    let b = tx_b.commit().unwrap();
    assert_eq!(point_pos(&a, p_id), Position::new(1.0, 0.0));
    assert_eq!(point_pos(&b, p_id), Position::new(0.0, 2.0));
    assert_eq!(point_pos(&base, p_id), Position::new(0.0, 0.0));
}

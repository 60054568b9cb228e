//! The standard rule catalogue.

use itertools::{izip, Itertools};

use crate::blueprint::Blueprint;
use crate::error::{Error, Result};
use crate::geom::{
    anchor_point, create_door, rotate_within, split, Anchor, Area, Direction, Rectangle,
};
use crate::graph::{Graph, NodeIndex};
use crate::rules::{
    area_node, inherit_edges, room_orientation, set_wall, Resolver, Rule, SlotChildren,
};

/// The standard resolver: every catalogue rule under its blueprint name,
/// with `@` as the rule-name property.
pub fn standard() -> Resolver {
    Resolver::new("@")
        .with_rule("House", House)
        .with_rule("Corridor", Corridor)
        .with_rule("RoomLine", RoomLine)
        .with_rule("Frame", Frame)
        .with_rule("Room", Room)
        .with_rule("FurnishedRoom", FurnishedRoom)
        .with_rule("Furniture", Furniture)
        .with_rule("NOP", Nop)
        .with_rule("Occupy", Occupy)
        .with_rule("Path", Path)
        .with_rule("In", In)
}

/// Demote geometric failures to an infeasible-derivation signal so the build
/// driver moves on to the next candidate.
fn recover(err: Error) -> Error {
    match err {
        Error::InvalidSplit(msg) | Error::InvalidDoor(msg) | Error::InvalidRotation(msg) => {
            Error::InvalidGraph(msg)
        }
        other => other,
    }
}

fn slot<'c>(children: &'c SlotChildren, name: &str) -> Result<&'c [NodeIndex]> {
    match children.get(name) {
        Some(nodes) if !nodes.is_empty() => Ok(nodes),
        _ => Err(Error::Preparation(format!("child slot '{name}' is empty"))),
    }
}

fn slot_node(children: &SlotChildren, name: &str) -> Result<NodeIndex> {
    Ok(slot(children, name)?[0])
}

fn required<'bp>(values: &'bp [String], property: &str) -> Result<&'bp str> {
    values
        .first()
        .map(String::as_str)
        .ok_or_else(|| Error::Preparation(format!("missing required property '{property}'")))
}

/// The outermost rule: an interior stacked on a one-tile exterior strip.
#[derive(Debug)]
pub struct House;

impl Rule for House {
    fn child_params(&self) -> Vec<String> {
        vec!["interior".into(), "exterior".into()]
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        children: &SlotChildren,
        bp: &Blueprint,
    ) -> Result<()> {
        let raw = bp.values("rect");
        let data: [i32; 4] = serde_json::from_str(required(&raw, "rect")?)
            .map_err(|err| Error::Preparation(format!("cannot read house rect: {err}")))?;
        // One extra row at the bottom leaves room for the exterior.
        let rect = Rectangle::new(data[0], data[1], data[2], data[3] + 1);

        let node = g.node_mut(nidx)?;
        node.set_rect(rect);
        node.set_walls_visible(false);

        let interior = slot_node(children, "interior")?;
        let exterior = slot_node(children, "exterior")?;
        let h = f64::from(rect.y1 - rect.y0);
        split(
            g,
            nidx,
            &[interior, exterior],
            &[(h - 1.0) / h],
            Direction::DOWN,
        )?;
        create_door(g, interior, exterior, 0.5)?;
        inherit_edges(g, nidx)
    }
}

/// A corridor flanked by two lines of rooms, doored into every room.
#[derive(Debug)]
pub struct Corridor;

impl Rule for Corridor {
    fn child_params(&self) -> Vec<String> {
        vec!["left".into(), "corridor".into(), "right".into()]
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        children: &SlotChildren,
        _bp: &Blueprint,
    ) -> Result<()> {
        let rect = area_node(g, nidx)?.rect();
        let orientation = room_orientation(g, nidx)?;
        let width = if orientation == Direction::UP || orientation == Direction::DOWN {
            rect.height()
        } else {
            rect.width()
        };
        let width = f64::from(width);

        let corridor_width = 3.0;
        let at = [
            0.5 - corridor_width / width / 2.0,
            0.5 + (corridor_width + 2.0) / width / 2.0,
        ];
        let left = slot(children, "left")?.to_vec();
        let corridor = slot_node(children, "corridor")?;
        let right = slot(children, "right")?.to_vec();
        split(
            g,
            nidx,
            &[left[0], corridor, right[0]],
            &at,
            orientation.turn(90),
        )
        .map_err(recover)?;

        for cells in [left, right] {
            let at = (1..cells.len())
                .map(|i| i as f64 / cells.len() as f64)
                .collect_vec();
            split(g, cells[0], &cells, &at, orientation).map_err(recover)?;
            for &cell in &cells {
                create_door(g, corridor, cell, 0.5).map_err(recover)?;
            }
        }
        inherit_edges(g, nidx)
    }
}

/// A line of equally sized rooms, doored in sequence.
#[derive(Debug)]
pub struct RoomLine;

impl Rule for RoomLine {
    fn child_params(&self) -> Vec<String> {
        vec!["rooms".into()]
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        children: &SlotChildren,
        _bp: &Blueprint,
    ) -> Result<()> {
        let orientation = room_orientation(g, nidx)?;
        let rooms = slot(children, "rooms")?.to_vec();
        let at = (1..rooms.len())
            .map(|i| i as f64 / rooms.len() as f64)
            .collect_vec();
        split(g, nidx, &rooms, &at, orientation).map_err(recover)?;
        for (&a, &b) in rooms.iter().tuple_windows() {
            create_door(g, a, b, 0.5).map_err(recover)?;
        }
        inherit_edges(g, nidx)
    }
}

/// Single-child pass-through; the child covers the full area.
#[derive(Debug)]
pub struct Frame;

impl Rule for Frame {
    fn child_params(&self) -> Vec<String> {
        vec!["content".into()]
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        children: &SlotChildren,
        _bp: &Blueprint,
    ) -> Result<()> {
        let content = slot_node(children, "content")?;
        split(g, nidx, &[content], &[], Direction::DOWN)?;
        inherit_edges(g, nidx)
    }
}

/// A leaf room with walls.
#[derive(Debug)]
pub struct Room;

impl Rule for Room {
    fn child_params(&self) -> Vec<String> {
        Vec::new()
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        _children: &SlotChildren,
        _bp: &Blueprint,
    ) -> Result<()> {
        set_wall(g, nidx, true)
    }
}

/// A walled room whose interior (shrunk by one tile per side) is handed to a
/// furnishing rule along with the room's orientation.
#[derive(Debug)]
pub struct FurnishedRoom;

impl Rule for FurnishedRoom {
    fn child_params(&self) -> Vec<String> {
        vec!["interior".into()]
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        children: &SlotChildren,
        _bp: &Blueprint,
    ) -> Result<()> {
        set_wall(g, nidx, true)?;
        let rect = area_node(g, nidx)?.rect();
        let inner = Rectangle::new(rect.x0 + 1, rect.y0 + 1, rect.x1 - 1, rect.y1 - 1);
        if inner.x0 > inner.x1 || inner.y0 > inner.y1 {
            return Err(Error::InvalidGraph(format!(
                "room {rect:?} is too small to furnish"
            )));
        }
        let orientation = room_orientation(g, nidx)?;
        let interior = g.node_mut(slot_node(children, "interior")?)?;
        interior.set_rect(inner);
        interior.set_orientation(orientation);
        Ok(())
    }
}

/// Places furnishing pieces into the corners of its area.
///
/// Reads the `sizes` and `anchors` lists from the blueprint; piece `i` is
/// anchored as if the room were entered from the top and then turned to the
/// room's actual orientation. A piece that does not fit marks the derivation
/// as infeasible.
#[derive(Debug)]
pub struct Furniture;

impl Rule for Furniture {
    fn child_params(&self) -> Vec<String> {
        vec!["objects".into()]
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        children: &SlotChildren,
        bp: &Blueprint,
    ) -> Result<()> {
        let node = area_node(g, nidx)?;
        let container = node.rect();
        let orientation = node
            .orientation()
            .ok_or_else(|| Error::Preparation("furniture needs an oriented area".into()))?;
        g.node_mut(nidx)?.set_walls_visible(false);

        let sizes = bp.values("sizes");
        let anchors = bp.values("anchors");
        let objects = slot(children, "objects")?;
        if sizes.len() != objects.len() || anchors.len() != objects.len() {
            return Err(Error::Preparation(format!(
                "furniture lists disagree: {} sizes, {} anchors, {} objects",
                sizes.len(),
                anchors.len(),
                objects.len()
            )));
        }

        for (raw_size, raw_anchor, &object) in izip!(&sizes, &anchors, objects) {
            let [w, h]: [i32; 2] = serde_json::from_str(raw_size)
                .map_err(|err| Error::Preparation(format!("cannot read size: {err}")))?;
            let anchor: Anchor = raw_anchor.parse()?;
            let placed = anchored(container, anchor, w, h);
            let rect = rotate_within(placed, container, Direction::DOWN, orientation, anchor)
                .map_err(recover)?;
            g.node_mut(object)?.set_rect(rect);
        }
        Ok(())
    }
}

/// A `w` by `h` rectangle touching an anchor of the container, as seen by an
/// observer entering from the top.
fn anchored(container: Rectangle, anchor: Anchor, w: i32, h: i32) -> Rectangle {
    let p = anchor_point(container, anchor, Direction::DOWN);
    match anchor {
        Anchor::NearLeft => Rectangle::new(p.x - (w - 1), p.y, p.x, p.y + h - 1),
        Anchor::NearRight => Rectangle::new(p.x, p.y, p.x + w - 1, p.y + h - 1),
        Anchor::FarLeft => Rectangle::new(p.x - (w - 1), p.y - (h - 1), p.x, p.y),
        Anchor::FarRight => Rectangle::new(p.x, p.y - (h - 1), p.x + w - 1, p.y),
        Anchor::Center => {
            let x0 = p.x - (w - 1) / 2;
            let y0 = p.y - (h - 1) / 2;
            Rectangle::new(x0, y0, x0 + w - 1, y0 + h - 1)
        }
    }
}

/// An invisible area.
#[derive(Debug)]
pub struct Nop;

impl Rule for Nop {
    fn child_params(&self) -> Vec<String> {
        Vec::new()
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        _children: &SlotChildren,
        _bp: &Blueprint,
    ) -> Result<()> {
        set_wall(g, nidx, false)
    }
}

/// Fills its area with a texture.
#[derive(Debug)]
pub struct Occupy;

impl Rule for Occupy {
    fn child_params(&self) -> Vec<String> {
        Vec::new()
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        _children: &SlotChildren,
        bp: &Blueprint,
    ) -> Result<()> {
        let raw = bp.values("texture");
        let texture: i64 = required(&raw, "texture")?
            .parse()
            .map_err(|err| Error::Preparation(format!("cannot read texture: {err}")))?;
        g.node_mut(nidx)?.properties.set("object", texture);
        set_wall(g, nidx, false)
    }
}

/// Links its steps into a chain. Used by requirement blueprints to demand
/// that areas be adjacent.
#[derive(Debug)]
pub struct Path;

impl Rule for Path {
    fn child_params(&self) -> Vec<String> {
        vec!["steps".into()]
    }

    fn prepare(
        &self,
        g: &mut Graph,
        _nidx: NodeIndex,
        children: &SlotChildren,
        _bp: &Blueprint,
    ) -> Result<()> {
        let steps = slot(children, "steps")?.to_vec();
        for (a, b) in steps.into_iter().tuple_windows() {
            g.link(a, b)?;
        }
        Ok(())
    }
}

/// Names a required feature. The node's `name` is overwritten with the
/// blueprint's `name` value so the matcher can look for it.
#[derive(Debug)]
pub struct In;

impl Rule for In {
    fn child_params(&self) -> Vec<String> {
        Vec::new()
    }

    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        _children: &SlotChildren,
        bp: &Blueprint,
    ) -> Result<()> {
        let raw = bp.values("name");
        let name = required(&raw, "name")?.to_owned();
        g.node_mut(nidx)?.properties.set("name", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oriented_room(orientation: Direction) -> (Graph, NodeIndex, SlotChildren) {
        let mut g = Graph::new();
        let room = g.add(NodeIndex::ROOT, &[]).unwrap();
        let node = g.node_mut(room).unwrap();
        node.set_rect(Rectangle::new(0, 0, 9, 9));
        node.set_orientation(orientation);
        let object = g.add(room, &[]).unwrap();
        let mut children = SlotChildren::default();
        children.insert("objects".into(), vec![object]);
        (g, room, children)
    }

    fn furniture_bp(sizes: &str, anchors: &str) -> Blueprint {
        let script = format!(
            r#"{{"@": "Furniture", "sizes": "{sizes}", "anchors": "{anchors}", "objects": {{"@": "Occupy", "texture": "0"}}}}"#
        );
        Blueprint::parse(script.as_bytes()).unwrap()
    }

    #[test]
    fn furniture_lands_in_the_rotated_corner() {
        let (mut g, room, children) = oriented_room(Direction::RIGHT);
        let bp = furniture_bp("[2,3]", "near-left");
        Furniture.prepare(&mut g, room, &children, &bp).unwrap();
        let object = children["objects"][0];
        assert_eq!(
            g.node(object).unwrap().rect(),
            Rectangle::new(0, 0, 2, 1)
        );
        assert!(!g.node(room).unwrap().walls_visible());
    }

    #[test]
    fn oversized_furniture_is_infeasible() {
        let (mut g, room, children) = oriented_room(Direction::DOWN);
        let bp = furniture_bp("[2,30]", "near-left");
        let err = Furniture.prepare(&mut g, room, &children, &bp).unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn furniture_rejects_mismatched_lists() {
        let (mut g, room, children) = oriented_room(Direction::DOWN);
        let bp = Blueprint::parse(
            br#"{"sizes": ["[2,3]", "[1,1]"], "anchors": "near-left", "objects": "x"}"#,
        )
        .unwrap();
        let err = Furniture.prepare(&mut g, room, &children, &bp).unwrap_err();
        assert!(matches!(err, Error::Preparation(_)));
    }

    #[test]
    fn occupy_stores_the_texture() {
        let mut g = Graph::new();
        let nidx = g.add(NodeIndex::ROOT, &[]).unwrap();
        let bp = Blueprint::parse(br#"{"@": "Occupy", "texture": "2"}"#).unwrap();
        Occupy
            .prepare(&mut g, nidx, &SlotChildren::default(), &bp)
            .unwrap();
        assert_eq!(g.node(nidx).unwrap().texture(), Some(2));
        assert!(!g.node(nidx).unwrap().walls_visible());
    }

    #[test]
    fn path_links_consecutive_steps() {
        let mut g = Graph::new();
        let steps: Vec<_> = (0..3).map(|_| g.add(NodeIndex::ROOT, &[]).unwrap()).collect();
        let mut children = SlotChildren::default();
        children.insert("steps".into(), steps.clone());
        let bp = Blueprint::parse(br#"{"@": "Path"}"#).unwrap();
        Path.prepare(&mut g, NodeIndex::ROOT, &children, &bp).unwrap();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.ends(0), [vec![steps[0]], vec![steps[1]]]);
        assert_eq!(g.ends(1), [vec![steps[1]], vec![steps[2]]]);
    }
}

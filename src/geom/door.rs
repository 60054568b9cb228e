//! Door placement on the shared wall of two areas.

use crate::error::{Error, Result};
use crate::geom::{Area, Direction, Door, Point, Rectangle};
use crate::graph::{EdgeIndex, Graph, NodeIndex};

/// Link two sibling areas with a door.
///
/// The door sits on the line where the two areas touch. `position` selects
/// the point on that line: seen from the first area while facing the second,
/// 0 is the left end and 1 the right end.
///
/// The areas must touch in a line of non-zero length; rectangles that are
/// apart, overlap, or touch in a single corner fail with
/// [`Error::InvalidDoor`], as do unset rectangles and positions outside
/// `[0, 1]`.
pub fn create_door(
    g: &mut Graph,
    nidx0: NodeIndex,
    nidx1: NodeIndex,
    position: f64,
) -> Result<EdgeIndex> {
    if !(0.0..=1.0).contains(&position) {
        return Err(Error::InvalidDoor(format!(
            "position must be in range [0, 1] but was {position}"
        )));
    }
    let rect0 = area_rect(g, nidx0)?;
    let rect1 = area_rect(g, nidx1)?;
    if rect0 == Rectangle::default() {
        return Err(Error::InvalidDoor("first rectangle isn't set".into()));
    }
    if rect1 == Rectangle::default() {
        return Err(Error::InvalidDoor("second rectangle isn't set".into()));
    }

    let inter = intersect(rect0, rect1)?;
    // Mirror the position when the second area lies above or to the left.
    let position = if inter.x1 == rect0.x0 || inter.y1 == rect0.y0 {
        1.0 - position
    } else {
        position
    };
    let pos = Point::new(
        inter.x0 + (f64::from(inter.x1 - inter.x0) * position).round() as i32,
        inter.y0 + (f64::from(inter.y1 - inter.y0) * position).round() as i32,
    );

    let eidx = g.link(nidx0, nidx1)?;
    g.edge_mut(eidx)?.set_pos(pos);
    Ok(eidx)
}

/// The side of an area on which one of its doors lies.
///
/// Ties at a corner resolve in the order left, right, up, down.
pub fn get_direction(g: &Graph, nidx: NodeIndex, eidx: EdgeIndex) -> Direction {
    let rect = g.node(nidx).map(|node| node.rect()).unwrap_or_default();
    let pos = g.edge(eidx).map(|edge| edge.pos()).unwrap_or_default();
    if pos.x == rect.x0 {
        Direction::LEFT
    } else if pos.x == rect.x1 {
        Direction::RIGHT
    } else if pos.y == rect.y0 {
        Direction::UP
    } else {
        Direction::DOWN
    }
}

fn area_rect(g: &Graph, nidx: NodeIndex) -> Result<Rectangle> {
    Ok(g.node(nidx)
        .ok_or_else(|| Error::IllegalAction(format!("node {nidx} does not exist")))?
        .rect())
}

/// The 1-D boundary segment shared by two touching rectangles.
fn intersect(ar: Rectangle, br: Rectangle) -> Result<Rectangle> {
    let x0 = ar.x0.max(br.x0);
    let y0 = ar.y0.max(br.y0);
    let x1 = ar.x1.min(br.x1);
    let y1 = ar.y1.min(br.y1);
    if x0 > x1 || y0 > y1 || (x0 == x1 && y0 == y1) {
        Err(Error::InvalidDoor(format!(
            "rectangles {ar:?} and {br:?} don't intersect"
        )))
    } else if x1 > x0 && y1 > y0 {
        Err(Error::InvalidDoor(format!(
            "rectangles {ar:?} and {br:?} intersect at more than one side"
        )))
    } else {
        Ok(Rectangle::new(x0, y0, x1, y1))
    }
}

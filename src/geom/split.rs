//! Partitioning an area into strips.

use crate::error::{Error, Result};
use crate::geom::{Area, Direction, Rectangle};
use crate::graph::{Graph, NodeIndex};

/// Partition `base`'s rectangle into `at.len() + 1` strips and assign them
/// to `children`.
///
/// `at` is a sorted sequence of fractions in `[0, 1]` giving the cut
/// positions along the axis perpendicular to `direction`. The first strip
/// lies opposite `direction`: splitting downward, the first child receives
/// the topmost strip. Cut coordinates are `min + trunc(span · fraction)`,
/// and adjacent strips share the cut line, so neighbours always touch.
///
/// Fails with [`Error::InvalidSplit`] when the child count does not match
/// the cut count.
pub fn split(
    g: &mut Graph,
    base: NodeIndex,
    children: &[NodeIndex],
    at: &[f64],
    direction: Direction,
) -> Result<()> {
    if children.len() != at.len() + 1 {
        return Err(Error::InvalidSplit(format!(
            "tried to split into {} nodes with {} dividers",
            children.len(),
            at.len()
        )));
    }
    let rect = g
        .node(base)
        .ok_or_else(|| Error::IllegalAction(format!("node {base} does not exist")))?
        .rect();

    let mut cuts = Vec::with_capacity(at.len() + 2);
    cuts.push(0.0);
    cuts.extend_from_slice(at);
    cuts.push(1.0);

    let flipped = flip(rect, direction);
    for (i, &cidx) in children.iter().enumerate() {
        let strip = flip(crop(flipped, cuts[i], cuts[i + 1]), direction);
        g.node_mut(cidx)?.set_rect(strip);
    }
    Ok(())
}

/// Map a rectangle into the frame in which `direction` points down, and
/// back. The mapping is its own inverse.
fn flip(rect: Rectangle, direction: Direction) -> Rectangle {
    if direction == Direction::UP {
        Rectangle::new(rect.x0, rect.y1, rect.x1, rect.y0)
    } else if direction == Direction::DOWN {
        rect
    } else if direction == Direction::LEFT {
        Rectangle::new(rect.y1, rect.x1, rect.y0, rect.x0)
    } else {
        Rectangle::new(rect.y0, rect.x0, rect.y1, rect.x1)
    }
}

/// Cut out the vertical band between two fractions of a (possibly flipped,
/// hence unnormalised) rectangle.
fn crop(rect: Rectangle, from: f64, to: f64) -> Rectangle {
    let span = f64::from(rect.y1 - rect.y0);
    Rectangle::new(
        rect.x0,
        rect.y0 + (span * from) as i32,
        rect.x1,
        rect.y0 + (span * to) as i32,
    )
}

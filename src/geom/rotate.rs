//! Rotating rectangles within a container, pinned to an anchor.

use crate::error::{Error, Result};
use crate::geom::{Anchor, Direction, Point, Rectangle};

/// The coordinate of an anchor of `rect`, as labelled by an observer facing
/// `direction`.
///
/// The labels rotate with the observer: *near* is the side the observer
/// entered through (behind them), *far* the wall ahead, *left*/*right*
/// follow their hands. `Center` is the midpoint, rounded towards the
/// minimal corner.
pub fn anchor_point(rect: Rectangle, anchor: Anchor, direction: Direction) -> Point {
    if anchor == Anchor::Center {
        return Point::new((rect.x0 + rect.x1) / 2, (rect.y0 + rect.y1) / 2);
    }
    let near = matches!(anchor, Anchor::NearLeft | Anchor::NearRight);
    let left = matches!(anchor, Anchor::NearLeft | Anchor::FarLeft);
    if direction == Direction::UP {
        Point::new(
            if left { rect.x0 } else { rect.x1 },
            if near { rect.y1 } else { rect.y0 },
        )
    } else if direction == Direction::RIGHT {
        Point::new(
            if near { rect.x0 } else { rect.x1 },
            if left { rect.y0 } else { rect.y1 },
        )
    } else if direction == Direction::LEFT {
        Point::new(
            if near { rect.x1 } else { rect.x0 },
            if left { rect.y1 } else { rect.y0 },
        )
    } else {
        Point::new(
            if left { rect.x1 } else { rect.x0 },
            if near { rect.y0 } else { rect.y1 },
        )
    }
}

/// Rotate `rect` within `container`, keeping it pinned to `anchor`.
///
/// The rectangle is re-expressed in the observer frame of `from` anchored at
/// the container's anchor point, the offsets are turned by the angle between
/// the two directions, and the result is re-applied at the anchor point as
/// labelled in the `to` frame. Rotating a rectangle onto itself
/// (`from == to`) is the identity; a quarter turn swaps width and height.
///
/// Fails with [`Error::InvalidRotation`] when the rotated rectangle no
/// longer fits inside the container.
pub fn rotate_within(
    rect: Rectangle,
    container: Rectangle,
    from: Direction,
    to: Direction,
    anchor: Anchor,
) -> Result<Rectangle> {
    let angle = to.angle_difference(from);
    let p = anchor_point(container, anchor, from);
    let q = anchor_point(container, anchor, to);

    let corner0 = rotate_offset(rect.x0 - p.x, rect.y0 - p.y, angle);
    let corner1 = rotate_offset(rect.x1 - p.x, rect.y1 - p.y, angle);
    let rotated = Rectangle::new(
        (q.x + corner0.0).min(q.x + corner1.0),
        (q.y + corner0.1).min(q.y + corner1.1),
        (q.x + corner0.0).max(q.x + corner1.0),
        (q.y + corner0.1).max(q.y + corner1.1),
    );

    if container.contains_rect(rotated) {
        Ok(rotated)
    } else {
        Err(Error::InvalidRotation(format!(
            "{rect:?} turned by {angle} degrees leaves {container:?}"
        )))
    }
}

/// Turn an offset vector clockwise by a multiple of 90 degrees.
fn rotate_offset(x: i32, y: i32, angle: i32) -> (i32, i32) {
    match angle {
        90 => (-y, x),
        180 => (-x, -y),
        -90 => (y, -x),
        _ => (x, y),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const CONTAINER: Rectangle = Rectangle {
        x0: 0,
        y0: 0,
        x1: 9,
        y1: 9,
    };

    #[rstest]
    #[case(Anchor::NearLeft, Direction::DOWN, Point::new(9, 0))]
    #[case(Anchor::NearRight, Direction::DOWN, Point::new(0, 0))]
    #[case(Anchor::FarLeft, Direction::DOWN, Point::new(9, 9))]
    #[case(Anchor::NearLeft, Direction::UP, Point::new(0, 9))]
    #[case(Anchor::NearLeft, Direction::RIGHT, Point::new(0, 0))]
    #[case(Anchor::NearLeft, Direction::LEFT, Point::new(9, 9))]
    #[case(Anchor::Center, Direction::DOWN, Point::new(4, 4))]
    fn anchor_points(#[case] anchor: Anchor, #[case] facing: Direction, #[case] expect: Point) {
        assert_eq!(anchor_point(CONTAINER, anchor, facing), expect);
    }

    #[rstest]
    #[case(Direction::UP)]
    #[case(Direction::RIGHT)]
    #[case(Direction::DOWN)]
    #[case(Direction::LEFT)]
    fn same_direction_is_identity(#[case] direction: Direction) {
        let rect = Rectangle::new(2, 1, 5, 3);
        for anchor in [
            Anchor::NearLeft,
            Anchor::FarLeft,
            Anchor::NearRight,
            Anchor::FarRight,
            Anchor::Center,
        ] {
            assert_eq!(
                rotate_within(rect, CONTAINER, direction, direction, anchor).unwrap(),
                rect
            );
        }
    }

    #[test]
    fn quarter_turn_follows_the_anchor() {
        // Furniture hugging the near-left corner of a room entered from the
        // top stays in the near-left corner when the room is entered from
        // the left instead.
        let rect = Rectangle::new(8, 0, 9, 2);
        let turned =
            rotate_within(rect, CONTAINER, Direction::DOWN, Direction::RIGHT, Anchor::NearLeft)
                .unwrap();
        assert_eq!(turned, Rectangle::new(0, 0, 2, 1));
    }

    #[test]
    fn rotation_round_trips() {
        let rect = Rectangle::new(6, 1, 9, 2);
        for to in [Direction::UP, Direction::RIGHT, Direction::LEFT] {
            let there =
                rotate_within(rect, CONTAINER, Direction::DOWN, to, Anchor::NearLeft).unwrap();
            let back =
                rotate_within(there, CONTAINER, to, Direction::DOWN, Anchor::NearLeft).unwrap();
            assert_eq!(back, rect);
        }
    }

    #[test]
    fn oversized_rotation_is_rejected() {
        // A 10-tile strip cannot stand upright in a 6 by 4 room.
        let wide = Rectangle::new(0, 8, 9, 9);
        let narrow = Rectangle::new(0, 0, 5, 3);
        let err = rotate_within(wide, narrow, Direction::DOWN, Direction::RIGHT, Anchor::NearLeft);
        assert!(matches!(err.unwrap_err(), Error::InvalidRotation(_)));
    }
}

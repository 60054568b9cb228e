//! Rectangle, point, direction and anchor algebra, plus the semantic
//! property views that turn graph nodes into areas and graph edges into
//! doors.

mod door;
mod rotate;
mod split;

pub use door::{create_door, get_direction};
pub use rotate::{anchor_point, rotate_within};
pub use split::split;

use std::str::FromStr;

use bitflags::bitflags;

use crate::error::Error;
use crate::graph::{Edge, Node, Property};

/// An axis-aligned rectangle covering all points `(x, y)` with
/// `x0 <= x <= x1 && y0 <= y <= y1`.
///
/// Both corners are inclusive: `(x0, y0)` is the minimal point, `(x1, y1)`
/// the maximal one. A freshly created area defaults to the degenerate
/// `{0, 0, 0, 0}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rectangle {
    /// Minimal x coordinate.
    pub x0: i32,
    /// Minimal y coordinate.
    pub y0: i32,
    /// Maximal x coordinate.
    pub x1: i32,
    /// Maximal y coordinate.
    pub y1: i32,
}

impl Rectangle {
    /// Create a rectangle from its min and max corners.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Number of tiles covered horizontally.
    pub fn width(&self) -> i32 {
        self.x1 - self.x0 + 1
    }

    /// Number of tiles covered vertically.
    pub fn height(&self) -> i32 {
        self.y1 - self.y0 + 1
    }

    /// Whether `point` lies inside the rectangle (borders included).
    pub fn contains(&self, point: Point) -> bool {
        self.x0 <= point.x && point.x <= self.x1 && self.y0 <= point.y && point.y <= self.y1
    }

    /// Whether `other` lies fully inside the rectangle (borders included).
    pub fn contains_rect(&self, other: Rectangle) -> bool {
        self.x0 <= other.x0 && other.x1 <= self.x1 && self.y0 <= other.y0 && other.y1 <= self.y1
    }
}

/// A 2-D point on the tile grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl Point {
    /// Create a point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

bitflags! {
    /// The four cardinal directions as a bitmask.
    ///
    /// The bits are laid out clockwise, so rotating the mask left by one bit
    /// turns every contained direction by 90 degrees clockwise. Combined
    /// values (`UP | LEFT`, ...) are used for wall-neighbour lookups; the
    /// geometric operations expect single directions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        /// Towards smaller y.
        const UP = 1;
        /// Towards larger x.
        const RIGHT = 2;
        /// Towards larger y.
        const DOWN = 4;
        /// Towards smaller x.
        const LEFT = 8;
    }
}

impl Direction {
    /// Rotate the direction by `angle` degrees, positive meaning clockwise.
    ///
    /// Rotations are done in 90 degree intervals; angles that aren't
    /// divisible by 90 are rounded to the closest valid value.
    pub fn turn(self, angle: i32) -> Self {
        let mut a = angle % 360;
        if a < 0 {
            a += 360;
        }
        let steps = ((a / 45 + 1) / 2) % 4;
        let spread = u16::from(self.bits()) << steps;
        Self::from_bits_truncate(((spread | (spread >> 4)) & 0xf) as u8)
    }

    /// The clockwise angle that turns `from` into `self`.
    ///
    /// Both directions must be single cardinals. The result lies in
    /// `(-180, 180]`.
    pub fn angle_difference(self, from: Direction) -> i32 {
        debug_assert!(self.bits().count_ones() == 1 && from.bits().count_ones() == 1);
        match (self.step() + 4 - from.step()) % 4 {
            0 => 0,
            1 => 90,
            2 => 180,
            _ => -90,
        }
    }

    /// Position of a single direction in clockwise order, starting at `UP`.
    fn step(self) -> u32 {
        self.bits().trailing_zeros()
    }
}

/// A corner (or the centre) of a container, labelled from the point of view
/// of an observer facing into the room.
///
/// `Near` is the side behind the observer, `Far` the one ahead; `Left` and
/// `Right` follow the observer's hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Behind the observer, to their left.
    NearLeft,
    /// Ahead of the observer, to their left.
    FarLeft,
    /// Behind the observer, to their right.
    NearRight,
    /// Ahead of the observer, to their right.
    FarRight,
    /// The centre of the container.
    Center,
}

impl FromStr for Anchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "near-left" => Ok(Anchor::NearLeft),
            "far-left" => Ok(Anchor::FarLeft),
            "near-right" => Ok(Anchor::NearRight),
            "far-right" => Ok(Anchor::FarRight),
            "center" => Ok(Anchor::Center),
            _ => Err(Error::Preparation(format!("unknown anchor '{s}'"))),
        }
    }
}

/// Area view of a graph node.
///
/// Areas carry a rectangle, a wall-render flag, an optional orientation and
/// an optional texture id, all stored in the node's property bag.
pub trait Area {
    /// The area's rectangle, defaulting to `{0, 0, 0, 0}` when unset.
    fn rect(&self) -> Rectangle;
    /// Assign the area's rectangle.
    fn set_rect(&mut self, rect: Rectangle);
    /// Whether the area's walls are drawn. Defaults to `true`.
    fn walls_visible(&self) -> bool;
    /// Toggle wall rendering for the area.
    fn set_walls_visible(&mut self, visible: bool);
    /// The direction an observer faces when entering the area, if recorded.
    fn orientation(&self) -> Option<Direction>;
    /// Record the direction an observer faces when entering the area.
    fn set_orientation(&mut self, direction: Direction);
    /// The texture id occupying the area, if any.
    fn texture(&self) -> Option<i64>;
}

impl Area for Node {
    fn rect(&self) -> Rectangle {
        match self.properties.get("rect") {
            Some(Property::Rect(rect)) => *rect,
            _ => Rectangle::default(),
        }
    }

    fn set_rect(&mut self, rect: Rectangle) {
        self.properties.set("rect", rect);
    }

    fn walls_visible(&self) -> bool {
        match self.properties.get("render") {
            Some(Property::Bool(visible)) => *visible,
            _ => true,
        }
    }

    fn set_walls_visible(&mut self, visible: bool) {
        self.properties.set("render", visible);
    }

    fn orientation(&self) -> Option<Direction> {
        match self.properties.get("orientation") {
            Some(Property::Direction(direction)) => Some(*direction),
            _ => None,
        }
    }

    fn set_orientation(&mut self, direction: Direction) {
        self.properties.set("orientation", direction);
    }

    fn texture(&self) -> Option<i64> {
        match self.properties.get("object") {
            Some(Property::Int(texture)) => Some(*texture),
            _ => None,
        }
    }
}

/// Door view of a graph edge.
///
/// Doors carry their position on the shared wall of the two linked areas and
/// a render flag.
pub trait Door {
    /// The door's position, defaulting to `{0, 0}` when unset.
    fn pos(&self) -> Point;
    /// Assign the door's position.
    fn set_pos(&mut self, pos: Point);
    /// Whether the door is drawn. Defaults to `true`.
    fn visible(&self) -> bool;
    /// Toggle rendering for the door.
    fn set_visible(&mut self, visible: bool);
}

impl Door for Edge {
    fn pos(&self) -> Point {
        match self.properties.get("pos") {
            Some(Property::Point(pos)) => *pos,
            _ => Point::default(),
        }
    }

    fn set_pos(&mut self, pos: Point) {
        self.properties.set("pos", pos);
    }

    fn visible(&self) -> bool {
        match self.properties.get("render") {
            Some(Property::Bool(visible)) => *visible,
            _ => true,
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.properties.set("render", visible);
    }
}

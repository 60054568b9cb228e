//! Rules: the units of geometric and graph construction logic that
//! blueprints refer to by name.

pub mod catalogue;

use fxhash::FxHashMap;

use crate::blueprint::Blueprint;
use crate::error::{Error, Result};
use crate::geom::{get_direction, Area, Direction, Door, Point, Rectangle};
use crate::graph::{Graph, Node, NodeIndex};

/// The graph children created for each of a rule's child slots, keyed by
/// slot name.
pub type SlotChildren = FxHashMap<String, Vec<NodeIndex>>;

/// A named unit of construction logic.
///
/// The build driver creates one graph node per rule invocation and one child
/// node per derivation grandchild, then hands the rule the graph to assign
/// geometry, create doors and pass edges down.
pub trait Rule: std::fmt::Debug {
    /// The ordered child slots this rule expects.
    fn child_params(&self) -> Vec<String>;

    /// Prepare the graph below `nidx`.
    ///
    /// Returning [`Error::InvalidGraph`] marks this derivation as infeasible
    /// and makes the build driver try the next one; any other error aborts
    /// the whole build. Rule authors should prefer `InvalidGraph` whenever
    /// another derivation could plausibly succeed.
    fn prepare(
        &self,
        g: &mut Graph,
        nidx: NodeIndex,
        children: &SlotChildren,
        bp: &Blueprint,
    ) -> Result<()>;
}

/// Maps rule-name strings to rule implementations.
///
/// The resolver also carries the reserved property name under which every
/// blueprint block declares its rule (`@` in the standard catalogue).
pub struct Resolver {
    key: String,
    rules: FxHashMap<String, Box<dyn Rule>>,
}

impl Resolver {
    /// Create an empty resolver whose rule-name property is `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            rules: FxHashMap::default(),
        }
    }

    /// Register a rule under `name`.
    pub fn with_rule(mut self, name: impl Into<String>, rule: impl Rule + 'static) -> Self {
        self.rules.insert(name.into(), Box::new(rule));
        self
    }

    /// The reserved property name carrying rule names.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Look up a rule, failing with [`Error::UnknownKey`] for unregistered
    /// names.
    pub fn rule(&self, name: &str) -> Result<&dyn Rule> {
        self.rules
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| Error::UnknownKey(name.to_owned()))
    }
}

/// Fetch a node that a rule expects to exist.
pub(crate) fn area_node<'g>(g: &'g Graph, nidx: NodeIndex) -> Result<&'g Node> {
    g.node(nidx)
        .ok_or_else(|| Error::Preparation(format!("node {nidx} does not exist")))
}

/// Set whether an area's walls are rendered and refresh its door flags.
///
/// A door is rendered when at least one of its two areas has visible walls;
/// a door between two wall-less areas disappears with them.
pub fn set_wall(g: &mut Graph, nidx: NodeIndex, visible: bool) -> Result<()> {
    let edges = area_node(g, nidx)?.edges().to_vec();
    g.node_mut(nidx)?.set_walls_visible(visible);
    for eidx in edges {
        let neighbour_visible = neighbour_of(g, nidx, eidx)
            .and_then(|other| g.node(other))
            .map_or(true, Area::walls_visible);
        g.edge_mut(eidx)?.set_visible(visible || neighbour_visible);
    }
    Ok(())
}

/// The deepest node on the other side of one of `nidx`'s edges.
fn neighbour_of(g: &Graph, nidx: NodeIndex, eidx: usize) -> Option<NodeIndex> {
    let ends = g.ends(eidx);
    let other = usize::from(ends[0].contains(&nidx));
    ends[other].last().copied()
}

/// The direction an observer faces when entering the area through its first
/// door.
///
/// Areas without doors cannot be oriented; rules relying on the orientation
/// must only run once an entry door exists.
pub fn room_orientation(g: &Graph, nidx: NodeIndex) -> Result<Direction> {
    let entry = area_node(g, nidx)?
        .edges()
        .first()
        .copied()
        .ok_or_else(|| Error::Preparation(format!("area {nidx} has no door to orient by")))?;
    Ok(get_direction(g, nidx, entry).turn(180))
}

/// Pass each of `nidx`'s doors down to the unique child on whose wall it
/// lies.
///
/// A door is taken by a child when its position sits on the child's boundary
/// strictly between two corners. Fails with [`Error::InvalidGraph`] when no
/// child, or more than one, takes a door.
pub fn inherit_edges(g: &mut Graph, nidx: NodeIndex) -> Result<()> {
    let edges = area_node(g, nidx)?.edges().to_vec();
    let children = g.children(nidx);
    for eidx in edges {
        let pos = g
            .edge(eidx)
            .ok_or_else(|| Error::Preparation(format!("edge {eidx} does not exist")))?
            .pos();
        let mut takers = children
            .iter()
            .copied()
            .filter(|&cidx| g.node(cidx).is_some_and(|node| takes_door(node.rect(), pos)));
        match (takers.next(), takers.next()) {
            (Some(child), None) => g.inherit_edge(nidx, child, &[eidx])?,
            _ => {
                return Err(Error::InvalidGraph(format!(
                    "no unique child of {nidx} takes the door at ({}, {})",
                    pos.x, pos.y
                )))
            }
        }
    }
    Ok(())
}

/// Whether a door at `pos` lies on the wall of `rect`, strictly between two
/// corners.
fn takes_door(rect: Rectangle, pos: Point) -> bool {
    let on_vertical_wall =
        (pos.x == rect.x0 || pos.x == rect.x1) && rect.y0 < pos.y && pos.y < rect.y1;
    let on_horizontal_wall =
        (pos.y == rect.y0 || pos.y == rect.y1) && rect.x0 < pos.x && pos.x < rect.x1;
    on_vertical_wall || on_horizontal_wall
}

#[cfg(test)]
mod tests {
    use crate::geom::create_door;

    use super::*;

    fn two_rooms() -> (Graph, NodeIndex, NodeIndex, usize) {
        let mut g = Graph::new();
        let n0 = g.add(NodeIndex::ROOT, &[]).unwrap();
        let n1 = g.add(NodeIndex::ROOT, &[]).unwrap();
        g.node_mut(n0).unwrap().set_rect(Rectangle::new(0, 0, 4, 4));
        g.node_mut(n1).unwrap().set_rect(Rectangle::new(4, 0, 8, 4));
        let eidx = create_door(&mut g, n0, n1, 0.5).unwrap();
        (g, n0, n1, eidx)
    }

    #[test]
    fn doors_follow_wall_visibility() {
        // One walled neighbour keeps the door visible.
        let (mut g, n0, n1, eidx) = two_rooms();
        set_wall(&mut g, n0, true).unwrap();
        set_wall(&mut g, n1, false).unwrap();
        assert!(g.edge(eidx).unwrap().visible());

        // Two wall-less areas lose the door as well.
        let (mut g, n0, n1, eidx) = two_rooms();
        set_wall(&mut g, n0, false).unwrap();
        set_wall(&mut g, n1, false).unwrap();
        assert!(!g.edge(eidx).unwrap().visible());
    }

    #[test]
    fn orientation_points_away_from_the_entry_door() {
        let (g, n0, n1, _) = two_rooms();
        // The door is on n0's right wall, so one enters n0 facing left.
        assert_eq!(room_orientation(&g, n0).unwrap(), Direction::LEFT);
        assert_eq!(room_orientation(&g, n1).unwrap(), Direction::RIGHT);
    }

    #[test]
    fn orientation_needs_a_door() {
        let mut g = Graph::new();
        let lone = g.add(NodeIndex::ROOT, &[]).unwrap();
        assert!(matches!(
            room_orientation(&g, lone).unwrap_err(),
            Error::Preparation(_)
        ));
    }

    #[test]
    fn doors_are_inherited_by_the_containing_child() {
        let (mut g, n0, _, eidx) = two_rooms();
        // Split n0 into an upper and a lower half; the door at (4, 2) lies
        // on the upper half's wall.
        let upper = g.add(n0, &[]).unwrap();
        let lower = g.add(n0, &[]).unwrap();
        g.node_mut(upper)
            .unwrap()
            .set_rect(Rectangle::new(0, 0, 4, 3));
        g.node_mut(lower)
            .unwrap()
            .set_rect(Rectangle::new(0, 3, 4, 4));
        inherit_edges(&mut g, n0).unwrap();
        assert_eq!(g.node(upper).unwrap().edges(), &[eidx]);
        assert!(g.node(lower).unwrap().edges().is_empty());
    }

    #[test]
    fn ambiguous_inheritance_is_infeasible() {
        let (mut g, n0, _, _) = two_rooms();
        // Both children claim the full area, so both walls contain the door.
        for _ in 0..2 {
            let child = g.add(n0, &[]).unwrap();
            g.node_mut(child)
                .unwrap()
                .set_rect(Rectangle::new(0, 0, 4, 4));
        }
        assert!(matches!(
            inherit_edges(&mut g, n0).unwrap_err(),
            Error::InvalidGraph(_)
        ));
    }

    #[test]
    fn unclaimed_doors_are_infeasible() {
        let (mut g, n0, _, _) = two_rooms();
        let child = g.add(n0, &[]).unwrap();
        g.node_mut(child)
            .unwrap()
            .set_rect(Rectangle::new(0, 0, 2, 4));
        assert!(matches!(
            inherit_edges(&mut g, n0).unwrap_err(),
            Error::InvalidGraph(_)
        ));
    }

    #[test]
    fn unknown_rules_are_reported() {
        let resolver = Resolver::new("@");
        assert!(matches!(
            resolver.rule("House").unwrap_err(),
            Error::UnknownKey(_)
        ));
    }
}

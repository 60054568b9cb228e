//! Layered undirected graph with property bags, multi-generation edges and
//! reference-counted parent chaining.
//!
//! A [`Graph`] either owns its root or wraps a finalised parent graph behind
//! an [`Rc`] handle. Everything the parent owns stays visible through the
//! wrapper, while additions made here are invisible to the parent. Reads
//! cascade local-first; writes are always local, so a wrapped parent can
//! never be mutated.

mod leaves;

use std::fmt;
use std::rc::Rc;

use derive_more::{From, Into};
use fxhash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::geom::{Anchor, Direction, Point, Rectangle};

/// Position of a node: the hierarchy layer it lives in and its offset within
/// that layer.
///
/// The root is always [`NodeIndex::ROOT`]; a child of a layer-`L` node lives
/// in layer `L + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
pub struct NodeIndex {
    /// Hierarchy layer.
    pub layer: usize,
    /// Offset within the layer, counted across the whole parent chain.
    pub index: usize,
}

impl NodeIndex {
    /// The root node of every graph.
    pub const ROOT: NodeIndex = NodeIndex { layer: 0, index: 0 };
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.layer, self.index)
    }
}

/// Identifier of an edge, monotonically increasing across the parent chain.
pub type EdgeIndex = usize;

/// A dynamically typed property value.
///
/// The engine stores only values whose concrete types it understands; rules
/// assert the expected variant at read time.
#[derive(Debug, Clone, PartialEq, From)]
pub enum Property {
    /// A boolean flag, e.g. `render`.
    Bool(bool),
    /// An integer, e.g. `object` texture ids.
    Int(i64),
    /// A string, e.g. `name`.
    Str(String),
    /// A list of strings, e.g. the `names` breadcrumb.
    List(Vec<String>),
    /// A rectangle, e.g. `rect`.
    Rect(Rectangle),
    /// A point, e.g. `pos`.
    Point(Point),
    /// A direction, e.g. `orientation`.
    Direction(Direction),
    /// An anchor.
    Anchor(Anchor),
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::Str(value.to_owned())
    }
}

/// A keyed bag of [`Property`] values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(FxHashMap<String, Property>);

impl Properties {
    /// Look up a property by key.
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.0.get(key)
    }

    /// Insert or replace a property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Property>) {
        self.0.insert(key.into(), value.into());
    }

    /// Whether a property with this key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over all key/value pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Property)> {
        self.0.iter()
    }
}

/// A node of the graph.
///
/// Owns its property bag and the list of incident edges; the parent link and
/// edge list are maintained by the graph itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// The node's property bag.
    pub properties: Properties,
    parent: Option<NodeIndex>,
    edges: Vec<EdgeIndex>,
}

impl Node {
    /// The node's parent, or `None` for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// The edges incident to this node, in insertion order.
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }
}

/// An edge of the graph. Its endpoints are stored by the graph as two side
/// chains, see [`Graph::ends`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Edge {
    /// The edge's property bag.
    pub properties: Properties,
}

/// Nodes added by one graph to one layer. `base` is how many nodes the
/// wrapped parent chain already holds in that layer.
#[derive(Debug, Clone, Default)]
struct Layer {
    base: usize,
    nodes: Vec<Node>,
}

/// A persistent layered graph of areas and doors.
///
/// Nodes and edges are only ever appended, never removed. An edge initially
/// links two siblings; descendants may inherit it, extending one of its side
/// chains by one generation at a time.
#[derive(Debug, Clone)]
pub struct Graph {
    parent: Option<Rc<Graph>>,
    layers: Vec<Layer>,
    children: FxHashMap<NodeIndex, Vec<NodeIndex>>,
    edges: Vec<Edge>,
    ends: FxHashMap<EdgeIndex, [Vec<NodeIndex>; 2]>,
    edge_base: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a graph owning a fresh root node at [`NodeIndex::ROOT`].
    pub fn new() -> Self {
        Self {
            parent: None,
            layers: vec![Layer {
                base: 0,
                nodes: vec![Node::default()],
            }],
            children: FxHashMap::default(),
            edges: Vec::new(),
            ends: FxHashMap::default(),
            edge_base: 0,
        }
    }

    /// Create a graph layered on top of `parent`.
    ///
    /// All of the parent's nodes and edges remain visible; additions made
    /// here never leak back into the parent.
    pub fn with_parent(parent: Rc<Graph>) -> Self {
        let edge_base = parent.edge_count();
        Self {
            parent: Some(parent),
            layers: Vec::new(),
            children: FxHashMap::default(),
            edges: Vec::new(),
            ends: FxHashMap::default(),
            edge_base,
        }
    }

    /// Look up a node, cascading to the wrapped parent if necessary.
    pub fn node(&self, nidx: NodeIndex) -> Option<&Node> {
        if let Some(layer) = self.layers.get(nidx.layer) {
            if nidx.index >= layer.base {
                return layer.nodes.get(nidx.index - layer.base);
            }
        }
        self.parent.as_deref().and_then(|p| p.node(nidx))
    }

    /// Mutable access to a node added by this graph.
    ///
    /// Fails with [`Error::IllegalAction`] when the node is absent or owned
    /// by a wrapped parent.
    pub fn node_mut(&mut self, nidx: NodeIndex) -> Result<&mut Node> {
        self.local_node_mut(nidx)
            .ok_or_else(|| Error::IllegalAction(format!("node {nidx} is not owned by this graph")))
    }

    fn local_node(&self, nidx: NodeIndex) -> Option<&Node> {
        let layer = self.layers.get(nidx.layer)?;
        if nidx.index < layer.base {
            return None;
        }
        layer.nodes.get(nidx.index - layer.base)
    }

    fn local_node_mut(&mut self, nidx: NodeIndex) -> Option<&mut Node> {
        let layer = self.layers.get_mut(nidx.layer)?;
        if nidx.index < layer.base {
            return None;
        }
        layer.nodes.get_mut(nidx.index - layer.base)
    }

    /// The children of a node: the parent chain's children first, then the
    /// ones added here, each in insertion order.
    pub fn children(&self, nidx: NodeIndex) -> Vec<NodeIndex> {
        let mut children = match &self.parent {
            Some(parent) => parent.children(nidx),
            None => Vec::new(),
        };
        if let Some(local) = self.children.get(&nidx) {
            children.extend_from_slice(local);
        }
        children
    }

    /// Look up an edge, cascading to the wrapped parent if necessary.
    pub fn edge(&self, eidx: EdgeIndex) -> Option<&Edge> {
        if eidx >= self.edge_base {
            self.edges.get(eidx - self.edge_base)
        } else {
            self.parent.as_deref().and_then(|p| p.edge(eidx))
        }
    }

    /// Mutable access to an edge created by this graph.
    ///
    /// Fails with [`Error::IllegalAction`] when the edge is absent or owned
    /// by a wrapped parent.
    pub fn edge_mut(&mut self, eidx: EdgeIndex) -> Result<&mut Edge> {
        if eidx >= self.edge_base {
            if let Some(edge) = self.edges.get_mut(eidx - self.edge_base) {
                return Ok(edge);
            }
        }
        Err(Error::IllegalAction(format!(
            "edge {eidx} is not owned by this graph"
        )))
    }

    /// The two side chains of an edge, concatenated across the parent chain.
    ///
    /// Each side is an unbroken parent-child chain starting at one of the two
    /// siblings the edge originally linked; the last element is the deepest
    /// node that inherited the edge on that side.
    pub fn ends(&self, eidx: EdgeIndex) -> [Vec<NodeIndex>; 2] {
        let mut ends = match &self.parent {
            Some(parent) => parent.ends(eidx),
            None => [Vec::new(), Vec::new()],
        };
        if let Some(local) = self.ends.get(&eidx) {
            for (side, chain) in ends.iter_mut().zip(local) {
                side.extend_from_slice(chain);
            }
        }
        ends
    }

    /// Total number of nodes in a layer across the whole parent chain.
    pub fn nodes_in_layer(&self, layer: usize) -> usize {
        let inherited = self
            .parent
            .as_deref()
            .map_or(0, |p| p.nodes_in_layer(layer));
        inherited + self.layers.get(layer).map_or(0, |l| l.nodes.len())
    }

    /// Total number of edges across the whole parent chain.
    pub fn edge_count(&self) -> usize {
        self.edge_base + self.edges.len()
    }

    /// Append a new child of `parent`, inheriting the given edges.
    ///
    /// Every inherited edge must currently end in `parent` on one of its
    /// sides; the new node is appended to that side. Fails with
    /// [`Error::IllegalAction`] when the parent is absent, an edge does not
    /// belong to the parent, or an edge is inherited twice.
    pub fn add(&mut self, parent: NodeIndex, inherited: &[EdgeIndex]) -> Result<NodeIndex> {
        if self.node(parent).is_none() {
            return Err(Error::IllegalAction(format!(
                "parent {parent} does not exist"
            )));
        }
        let sides = self.inheritance_sides(parent, inherited)?;

        let layer = parent.layer + 1;
        while self.layers.len() <= layer {
            let l = self.layers.len();
            let base = self.parent.as_deref().map_or(0, |p| p.nodes_in_layer(l));
            self.layers.push(Layer {
                base,
                nodes: Vec::new(),
            });
        }
        let nidx = NodeIndex {
            layer,
            index: self.nodes_in_layer(layer),
        };
        self.layers[layer].nodes.push(Node {
            properties: Properties::default(),
            parent: Some(parent),
            edges: inherited.to_vec(),
        });
        self.children.entry(parent).or_default().push(nidx);
        self.extend_ends(nidx, inherited, &sides);
        Ok(nidx)
    }

    /// Link two sibling nodes with a fresh edge.
    ///
    /// Both endpoints must have been added by this graph instance; linking
    /// across the layers of the parent chain is not allowed. Fails with
    /// [`Error::IllegalAction`] on foreign endpoints, differing parents or a
    /// pre-existing link between the two nodes.
    pub fn link(&mut self, a: NodeIndex, b: NodeIndex) -> Result<EdgeIndex> {
        let (pa, a_edges) = match self.local_node(a) {
            Some(node) => (node.parent, node.edges.clone()),
            None => {
                return Err(Error::IllegalAction(format!(
                    "node {a} was not added by this graph"
                )))
            }
        };
        let pb = match self.local_node(b) {
            Some(node) => node.parent,
            None => {
                return Err(Error::IllegalAction(format!(
                    "node {b} was not added by this graph"
                )))
            }
        };
        if pa != pb {
            return Err(Error::IllegalAction(format!(
                "nodes {a} and {b} are not siblings"
            )));
        }
        for eidx in a_edges {
            if self.ends(eidx).iter().any(|side| side.first() == Some(&b)) {
                return Err(Error::IllegalAction(format!(
                    "nodes {a} and {b} are already linked"
                )));
            }
        }

        let eidx = self.edge_base + self.edges.len();
        self.edges.push(Edge::default());
        self.ends.insert(eidx, [vec![a], vec![b]]);
        for nidx in [a, b] {
            self.local_node_mut(nidx)
                .expect("endpoint checked above")
                .edges
                .push(eidx);
        }
        Ok(eidx)
    }

    /// Pass edges of `from` down to `to`, one of its children.
    ///
    /// Each edge's side chain ending in `from` is extended by `to`. Fails
    /// with [`Error::IllegalAction`] when `to` was not added by this graph,
    /// is not a child of `from`, or an edge does not currently end in
    /// `from` (for instance because another child already inherited it).
    pub fn inherit_edge(&mut self, from: NodeIndex, to: NodeIndex, edges: &[EdgeIndex]) -> Result<()> {
        match self.local_node(to) {
            Some(node) if node.parent == Some(from) => {}
            Some(_) => {
                return Err(Error::IllegalAction(format!(
                    "node {to} is not a child of {from}"
                )))
            }
            None => {
                return Err(Error::IllegalAction(format!(
                    "node {to} was not added by this graph"
                )))
            }
        }
        let sides = self.inheritance_sides(from, edges)?;
        self.extend_ends(to, edges, &sides);
        self.local_node_mut(to)
            .expect("child checked above")
            .edges
            .extend_from_slice(edges);
        Ok(())
    }

    /// For each edge, the side whose chain currently ends in `holder`.
    fn inheritance_sides(&self, holder: NodeIndex, edges: &[EdgeIndex]) -> Result<Vec<usize>> {
        let mut seen = FxHashSet::default();
        let mut sides = Vec::with_capacity(edges.len());
        for &eidx in edges {
            if !seen.insert(eidx) {
                return Err(Error::IllegalAction(format!(
                    "edge {eidx} inherited twice in one call"
                )));
            }
            let ends = self.ends(eidx);
            let side = (0..2)
                .find(|&side| ends[side].last() == Some(&holder))
                .ok_or_else(|| {
                    Error::IllegalAction(format!("edge {eidx} does not belong to node {holder}"))
                })?;
            sides.push(side);
        }
        Ok(sides)
    }

    fn extend_ends(&mut self, nidx: NodeIndex, edges: &[EdgeIndex], sides: &[usize]) {
        for (&eidx, &side) in edges.iter().zip(sides) {
            let ends = self
                .ends
                .entry(eidx)
                .or_insert_with(|| [Vec::new(), Vec::new()]);
            ends[side].push(nidx);
        }
    }
}

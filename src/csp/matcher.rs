//! Verifying that a generated graph satisfies a required-shape graph.

use std::rc::Rc;

use fxhash::FxHashMap;

use crate::build::Matcher;
use crate::csp::{CancelToken, Constraint, Problem};
use crate::error::Result;
use crate::graph::{Graph, Node, NodeIndex};

/// Matches graphs through constraint satisfaction.
///
/// The first graph is the candidate; the direct children of the second
/// graph's root are the requirements. A match assigns every requirement to a
/// compatibly named candidate node such that required adjacencies are
/// candidate adjacencies and no two requirements land on an
/// ancestor/descendant pair.
#[derive(Debug, Clone, Default)]
pub struct CspMatcher {
    cancel: CancelToken,
}

impl CspMatcher {
    /// Create a matcher that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher watching the given cancellation token.
    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl Matcher for CspMatcher {
    fn matches(&self, graphs: &[Graph]) -> Result<Option<Vec<NodeIndex>>> {
        if graphs.len() < 2 {
            return Ok(Some(Vec::new()));
        }
        let candidates = descendants(&graphs[0]);
        let required = graphs[1].children(NodeIndex::ROOT);

        let candidate_adjacency = Rc::new(adjacency(&graphs[0], &candidates));
        let required_adjacency = adjacency(&graphs[1], &required);
        let apart = Rc::new(apartness(&graphs[0], &candidates));

        let mut problem = Problem::new();
        for &nidx in &required {
            let domain = candidates
                .iter()
                .enumerate()
                .filter(|&(_, &cidx)| compatible(graphs[0].node(cidx), graphs[1].node(nidx)))
                .map(|(j, _)| j)
                .collect();
            problem.add_variable(domain);
        }
        for i in 0..required.len() {
            for j in i + 1..required.len() {
                if required_adjacency[i][j] {
                    let adjacency = Rc::clone(&candidate_adjacency);
                    problem.add_constraint(Constraint::new(i, j, move |&a: &usize, &b: &usize| {
                        adjacency[a][b]
                    }));
                }
                let apart = Rc::clone(&apart);
                problem.add_constraint(Constraint::new(i, j, move |&a: &usize, &b: &usize| {
                    apart[a][b]
                }));
            }
        }

        let solution = problem.solve(&self.cancel)?;
        Ok(solution.map(|values| values.into_iter().map(|j| candidates[j]).collect()))
    }
}

/// Whether a candidate node can stand in for a required node.
///
/// Requirements without a name accept anything; named requirements need an
/// equally named candidate.
fn compatible(candidate: Option<&Node>, required: Option<&Node>) -> bool {
    let Some(required_name) = required.and_then(|node| node.properties.get("name")) else {
        return true;
    };
    match candidate.and_then(|node| node.properties.get("name")) {
        Some(name) => name == required_name,
        None => false,
    }
}

/// All descendants of the root in pre-order, the root included.
fn descendants(g: &Graph) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut stack = vec![NodeIndex::ROOT];
    while let Some(nidx) = stack.pop() {
        out.push(nidx);
        for &cidx in g.children(nidx).iter().rev() {
            stack.push(cidx);
        }
    }
    out
}

/// Adjacency among `nodes`: linked nodes count as adjacent, as do all deeper
/// inheritors on either side of an edge.
fn adjacency(g: &Graph, nodes: &[NodeIndex]) -> Vec<Vec<bool>> {
    let lookup: FxHashMap<NodeIndex, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let mut matrix = vec![vec![false; nodes.len()]; nodes.len()];
    for (i, &nidx) in nodes.iter().enumerate() {
        let Some(node) = g.node(nidx) else { continue };
        for &eidx in node.edges() {
            let ends = g.ends(eidx);
            let other = usize::from(ends[0].contains(&nidx));
            for onidx in &ends[other] {
                if let Some(&k) = lookup.get(onidx) {
                    matrix[i][k] = true;
                }
            }
        }
    }
    matrix
}

/// The hierarchy mask among `nodes`: `true` unless two nodes are identical
/// or stand in an ancestor/descendant relationship.
fn apartness(g: &Graph, nodes: &[NodeIndex]) -> Vec<Vec<bool>> {
    let lookup: FxHashMap<NodeIndex, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let mut apart = vec![vec![true; nodes.len()]; nodes.len()];
    for (i, &nidx) in nodes.iter().enumerate() {
        apart[i][i] = false;
        let mut cursor = nidx;
        while let Some(parent) = g.node(cursor).and_then(Node::parent) {
            if let Some(&k) = lookup.get(&parent) {
                apart[i][k] = false;
                apart[k][i] = false;
            }
            cursor = parent;
        }
    }
    apart
}

#[cfg(test)]
mod tests {
    use crate::graph::Property;

    use super::*;

    fn named_child(g: &mut Graph, parent: NodeIndex, name: &str) -> NodeIndex {
        let nidx = g.add(parent, &[]).unwrap();
        g.node_mut(nidx).unwrap().properties.set("name", name);
        nidx
    }

    /// A required linked pair `a`/`b` among unrelated candidate nodes.
    #[test]
    fn linked_pair_is_found() {
        let mut candidate = Graph::new();
        let _noise = candidate.add(NodeIndex::ROOT, &[]).unwrap();
        let a = named_child(&mut candidate, NodeIndex::ROOT, "a");
        let b = named_child(&mut candidate, NodeIndex::ROOT, "b");
        candidate.link(a, b).unwrap();

        let mut required = Graph::new();
        let ra = named_child(&mut required, NodeIndex::ROOT, "a");
        let rb = named_child(&mut required, NodeIndex::ROOT, "b");
        required.link(ra, rb).unwrap();

        let matches = CspMatcher::new()
            .matches(&[candidate, required])
            .unwrap()
            .unwrap();
        assert_eq!(matches, vec![a, b]);
    }

    #[test]
    fn missing_names_fail() {
        let mut candidate = Graph::new();
        named_child(&mut candidate, NodeIndex::ROOT, "a");

        let mut required = Graph::new();
        named_child(&mut required, NodeIndex::ROOT, "z");

        assert!(CspMatcher::new()
            .matches(&[candidate, required])
            .unwrap()
            .is_none());
    }

    #[test]
    fn unnamed_requirements_accept_any_node() {
        let mut candidate = Graph::new();
        candidate.add(NodeIndex::ROOT, &[]).unwrap();

        let mut required = Graph::new();
        required.add(NodeIndex::ROOT, &[]).unwrap();

        assert!(CspMatcher::new()
            .matches(&[candidate, required])
            .unwrap()
            .is_some());
    }

    #[test]
    fn requirements_never_share_an_ancestor_chain() {
        let mut candidate = Graph::new();
        let a = named_child(&mut candidate, NodeIndex::ROOT, "a");
        named_child(&mut candidate, a, "b");

        let mut required = Graph::new();
        named_child(&mut required, NodeIndex::ROOT, "a");
        named_child(&mut required, NodeIndex::ROOT, "b");

        // The only a/b pair in the candidate is parent and child.
        assert!(CspMatcher::new()
            .matches(&[candidate, required])
            .unwrap()
            .is_none());
    }

    #[test]
    fn requirements_land_on_distinct_nodes() {
        let mut candidate = Graph::new();
        named_child(&mut candidate, NodeIndex::ROOT, "a");

        let mut required = Graph::new();
        named_child(&mut required, NodeIndex::ROOT, "a");
        named_child(&mut required, NodeIndex::ROOT, "a");

        assert!(CspMatcher::new()
            .matches(&[candidate, required])
            .unwrap()
            .is_none());
    }

    #[test]
    fn adjacency_reaches_through_inherited_edges() {
        let mut candidate = Graph::new();
        let a = named_child(&mut candidate, NodeIndex::ROOT, "hall");
        let b = candidate.add(NodeIndex::ROOT, &[]).unwrap();
        let eidx = candidate.link(a, b).unwrap();
        // The deeper room inherits the hall door; it must still count as
        // adjacent to the hall.
        let room = candidate.add(b, &[eidx]).unwrap();
        candidate
            .node_mut(room)
            .unwrap()
            .properties
            .set("name", "room");

        let mut required = Graph::new();
        let ra = named_child(&mut required, NodeIndex::ROOT, "hall");
        let rb = named_child(&mut required, NodeIndex::ROOT, "room");
        required.link(ra, rb).unwrap();

        let matches = CspMatcher::new()
            .matches(&[candidate, required])
            .unwrap()
            .unwrap();
        assert_eq!(
            matches,
            vec![a, room],
            "expected the requirement to land on the inheriting room"
        );
    }

    #[test]
    fn single_graph_matches_trivially() {
        let candidate = Graph::new();
        assert_eq!(
            CspMatcher::new().matches(&[candidate]).unwrap(),
            Some(Vec::new())
        );
    }

    #[test]
    fn cancellation_surfaces() {
        let mut candidate = Graph::new();
        named_child(&mut candidate, NodeIndex::ROOT, "a");
        let mut required = Graph::new();
        named_child(&mut required, NodeIndex::ROOT, "a");

        let cancel = CancelToken::new();
        cancel.cancel();
        let matcher = CspMatcher::with_cancel(cancel);
        assert!(matches!(
            matcher.matches(&[candidate, required]).unwrap_err(),
            crate::error::Error::Cancelled
        ));
    }

    #[test]
    fn names_are_plain_string_properties() {
        let mut g = Graph::new();
        let nidx = named_child(&mut g, NodeIndex::ROOT, "a");
        assert_eq!(
            g.node(nidx).unwrap().properties.get("name"),
            Some(&Property::Str("a".into()))
        );
    }
}

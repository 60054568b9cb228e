//! Collapsed view of a graph: only its leaves remain.

use fxhash::FxHashMap;

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeIndex};

impl Graph {
    /// Build a new graph whose root's children are exactly the leaves of
    /// this graph, visited in pre-order.
    ///
    /// Node properties are shallow-copied. Every edge is translated to link
    /// the deepest node of each of its sides; if such a node is not a leaf,
    /// the view cannot be built and [`Error::NotLeafable`] is returned.
    ///
    /// The CSP matcher uses this view when hierarchy constraints are not
    /// wanted.
    pub fn leaves(&self) -> Result<Graph> {
        let mut out = Graph::new();
        let mut mapping = FxHashMap::default();
        self.collect_leaves(NodeIndex::ROOT, &mut out, &mut mapping)?;

        for eidx in 0..self.edge_count() {
            let ends = self.ends(eidx);
            let mut translated = [NodeIndex::ROOT; 2];
            for (side, chain) in translated.iter_mut().zip(&ends) {
                *side = *chain
                    .last()
                    .and_then(|deepest| mapping.get(deepest))
                    .ok_or(Error::NotLeafable)?;
            }
            let oeidx = out.link(translated[0], translated[1])?;
            out.edge_mut(oeidx)?.properties = self
                .edge(eidx)
                .map(|edge| edge.properties.clone())
                .unwrap_or_default();
        }
        Ok(out)
    }

    fn collect_leaves(
        &self,
        nidx: NodeIndex,
        out: &mut Graph,
        mapping: &mut FxHashMap<NodeIndex, NodeIndex>,
    ) -> Result<()> {
        let children = self.children(nidx);
        if children.is_empty() {
            let oidx = out.add(NodeIndex::ROOT, &[])?;
            if let Some(node) = self.node(nidx) {
                out.node_mut(oidx)?.properties = node.properties.clone();
            }
            mapping.insert(nidx, oidx);
        } else {
            for cidx in children {
                self.collect_leaves(cidx, out, mapping)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::Property;

    use super::*;

    #[test]
    fn leaves_flatten_the_hierarchy() {
        let mut g = Graph::new();
        let n0 = g.add(NodeIndex::ROOT, &[]).unwrap();
        let n1 = g.add(NodeIndex::ROOT, &[]).unwrap();
        let eidx = g.link(n0, n1).unwrap();
        let c0 = g.add(n0, &[]).unwrap();
        g.inherit_edge(n0, c0, &[eidx]).unwrap();
        g.node_mut(c0).unwrap().properties.set("name", "a");
        g.node_mut(n1).unwrap().properties.set("name", "b");

        let flat = g.leaves().unwrap();
        let leaves = flat.children(NodeIndex::ROOT);
        assert_eq!(leaves.len(), 2);
        assert_eq!(
            flat.node(leaves[0]).unwrap().properties.get("name"),
            Some(&Property::Str("a".into()))
        );
        assert_eq!(
            flat.node(leaves[1]).unwrap().properties.get("name"),
            Some(&Property::Str("b".into()))
        );
        assert_eq!(flat.ends(0), [vec![leaves[0]], vec![leaves[1]]]);
    }

    #[test]
    fn edge_properties_survive_translation() {
        let mut g = Graph::new();
        let n0 = g.add(NodeIndex::ROOT, &[]).unwrap();
        let n1 = g.add(NodeIndex::ROOT, &[]).unwrap();
        let eidx = g.link(n0, n1).unwrap();
        g.edge_mut(eidx).unwrap().properties.set("render", false);

        let flat = g.leaves().unwrap();
        assert_eq!(
            flat.edge(0).unwrap().properties.get("render"),
            Some(&Property::Bool(false))
        );
    }

    #[test]
    fn uninherited_edge_is_not_leafable() {
        let mut g = Graph::new();
        let n0 = g.add(NodeIndex::ROOT, &[]).unwrap();
        let n1 = g.add(NodeIndex::ROOT, &[]).unwrap();
        g.link(n0, n1).unwrap();
        // n0 gains children, but the edge stays with n0 itself.
        g.add(n0, &[]).unwrap();

        assert!(matches!(g.leaves().unwrap_err(), Error::NotLeafable));
    }
}

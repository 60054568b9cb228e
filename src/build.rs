//! The build driver: enumerates derivation tuples, realises them into
//! graphs and asks the matcher whether they go together.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::blueprint::Blueprint;
use crate::error::{Error, Result};
use crate::expand::{Derivation, Space};
use crate::graph::{Graph, NodeIndex};
use crate::rules::{Resolver, SlotChildren};

/// Decides whether a tuple of realised graphs belongs together.
///
/// Returns the assignment of required nodes to candidate nodes on success,
/// `None` when the graphs don't match.
pub trait Matcher {
    /// Check the given graphs; `graphs[0]` is the candidate.
    fn matches(&self, graphs: &[Graph]) -> Result<Option<Vec<NodeIndex>>>;
}

/// The order in which derivation index tuples are tried.
///
/// Both orders enumerate every tuple exactly once, so for fixed inputs (and
/// a fixed seed) the build is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Little-endian lexicographic order: the first blueprint varies
    /// fastest.
    Lexicographic,
    /// A seeded global shuffle of the lexicographic order.
    Shuffled(u64),
}

impl Order {
    /// Materialise the tuple sequence for spaces of the given sizes.
    pub fn tuples(&self, ns: &[usize]) -> Vec<Vec<usize>> {
        let total = ns.iter().product();
        let mut tuples: Vec<Vec<usize>> = (0..total)
            .map(|i| {
                let mut rest = i;
                ns.iter()
                    .map(|&n| {
                        let digit = rest % n;
                        rest /= n;
                        digit
                    })
                    .collect()
            })
            .collect();
        if let Order::Shuffled(seed) = self {
            tuples.shuffle(&mut StdRng::seed_from_u64(*seed));
        }
        tuples
    }
}

/// Build a graph satisfying all blueprints at once.
///
/// Every blueprint is expanded into its choice space; for each index tuple,
/// all derivations are realised into fresh graphs and handed to the matcher.
/// A derivation that turns out infeasible ([`Error::InvalidGraph`]) merely
/// advances to the next tuple. The first accepted tuple's first graph is
/// returned; exhaustion yields [`Error::NoSolution`].
pub fn build(
    bps: &[Blueprint],
    matcher: &dyn Matcher,
    resolver: &Resolver,
    order: Order,
) -> Result<Graph> {
    if bps.is_empty() {
        return Err(Error::InvalidBlueprint("no blueprints given".into()));
    }
    let spaces = bps
        .iter()
        .map(|bp| Space::new(bp, resolver))
        .collect::<Result<Vec<_>>>()?;
    let ns: Vec<usize> = spaces.iter().map(Space::len).collect();
    debug!(spaces = ?ns, "expanded choice spaces");

    'tuples: for tuple in order.tuples(&ns) {
        let mut graphs = Vec::with_capacity(spaces.len());
        for (space, &i) in spaces.iter().zip(&tuple) {
            let derivation = space.derivation(i);
            let mut g = Graph::new();
            match realise(&mut g, NodeIndex::ROOT, &derivation, resolver, &[]) {
                Ok(()) => graphs.push(g),
                Err(err) if err.is_recoverable() => {
                    trace!(?tuple, %err, "derivation rejected");
                    continue 'tuples;
                }
                Err(err) => return Err(err),
            }
        }
        if matcher.matches(&graphs)?.is_some() {
            debug!(?tuple, "derivation accepted");
            return Ok(graphs.swap_remove(0));
        }
    }
    Err(Error::NoSolution)
}

/// Realise a derivation below `nidx`: name the node, create one child per
/// derivation grandchild, let the rule prepare the geometry, then recurse.
///
/// `trail` is the breadcrumb of rule and slot names leading to `nidx`.
fn realise(
    g: &mut Graph,
    nidx: NodeIndex,
    derivation: &Derivation,
    resolver: &Resolver,
    trail: &[String],
) -> Result<()> {
    let mut names = trail.to_vec();
    names.push(derivation.name().to_owned());
    {
        let node = g.node_mut(nidx)?;
        node.properties.set("name", derivation.name());
        node.properties.set("names", names.clone());
    }

    let rule = resolver.rule(derivation.name())?;
    let mut children = SlotChildren::default();
    let mut pending = Vec::new();
    for (slot, grandchildren) in derivation.slots() {
        let mut slot_nodes = Vec::with_capacity(grandchildren.len());
        for grandchild in grandchildren {
            let cidx = g.add(nidx, &[])?;
            slot_nodes.push(cidx);
            pending.push((cidx, grandchild, slot));
        }
        children.insert(slot.clone(), slot_nodes);
    }

    rule.prepare(g, nidx, &children, derivation.blueprint())?;

    for (cidx, grandchild, slot) in pending {
        let mut trail = names.clone();
        trail.push(slot.clone());
        realise(g, cidx, grandchild, resolver, &trail)?;
    }
    Ok(())
}

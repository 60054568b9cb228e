//! Expansion of a blueprint into its choice space.
//!
//! Under a rule resolver, every blueprint spans a finite space of concrete
//! derivations: each block contributes one slot per child parameter of its
//! rule, each slot holds all values of the corresponding property
//! (conjunction), and every plain value reference opens a disjunction over
//! the referenced property's values. The space is indexed by a deterministic
//! bijection with `[0, n)`.

use crate::blueprint::Blueprint;
use crate::error::{Error, Result};
use crate::rules::Resolver;

/// The indexed space of derivations of one blueprint.
#[derive(Debug)]
pub struct Space {
    root: Alternatives,
}

impl Space {
    /// Expand the blueprint's `Root` property under the given resolver.
    pub fn new(bp: &Blueprint, resolver: &Resolver) -> Result<Space> {
        Ok(Space {
            root: Alternatives::build(bp, "Root", resolver)?,
        })
    }

    /// The number of derivations in the space.
    pub fn len(&self) -> usize {
        self.root.n()
    }

    /// Whether the space is empty. It never is: every expanded blueprint has
    /// at least one derivation.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `i`-th derivation. Panics when `i` is out of range.
    pub fn derivation(&self, i: usize) -> Derivation {
        self.root.get(i)
    }
}

/// One concrete choice at every branching point of the space: a tree of rule
/// invocations, ready to be realised into a graph.
#[derive(Debug, Clone)]
pub struct Derivation {
    bp: Blueprint,
    name: String,
    slots: Vec<(String, Vec<Derivation>)>,
}

impl Derivation {
    /// The blueprint block this derivation instantiates.
    pub fn blueprint(&self) -> &Blueprint {
        &self.bp
    }

    /// The name of the rule to invoke.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The chosen children, one entry per child slot of the rule.
    pub fn slots(&self) -> &[(String, Vec<Derivation>)] {
        &self.slots
    }
}

/// A block or a nested disjunction.
#[derive(Debug)]
enum Choice {
    Block(Block),
    OneOf(Alternatives),
}

impl Choice {
    fn build(bp: &Blueprint, value: &str, resolver: &Resolver) -> Result<Choice> {
        if value.starts_with('*') {
            let child = bp.child(value).ok_or_else(|| {
                Error::InvalidBlueprint(format!("dangling block reference '{value}'"))
            })?;
            Ok(Choice::Block(Block::build(&child, resolver)?))
        } else {
            Ok(Choice::OneOf(Alternatives::build(bp, value, resolver)?))
        }
    }

    fn n(&self) -> usize {
        match self {
            Choice::Block(block) => block.n(),
            Choice::OneOf(alternatives) => alternatives.n(),
        }
    }

    fn get(&self, i: usize) -> Derivation {
        match self {
            Choice::Block(block) => block.get(i),
            Choice::OneOf(alternatives) => alternatives.get(i),
        }
    }
}

/// A rule invocation: one slot per child parameter.
#[derive(Debug)]
struct Block {
    bp: Blueprint,
    name: String,
    slots: Vec<Slot>,
}

impl Block {
    fn build(bp: &Blueprint, resolver: &Resolver) -> Result<Block> {
        let names = bp.values(resolver.key());
        if names.len() != 1 {
            return Err(Error::InvalidBlueprint(format!(
                "a block must name its rule exactly once under '{}'",
                resolver.key()
            )));
        }
        let name = names.into_iter().next().unwrap_or_default();
        let rule = resolver.rule(&name)?;
        let slots = rule
            .child_params()
            .into_iter()
            .map(|param| Slot::build(bp, param, resolver))
            .collect::<Result<_>>()?;
        Ok(Block {
            bp: bp.clone(),
            name,
            slots,
        })
    }

    fn n(&self) -> usize {
        self.slots.iter().map(Slot::n).product()
    }

    fn get(&self, mut i: usize) -> Derivation {
        let mut slots = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let n = slot.n();
            slots.push((slot.name.clone(), slot.get(i % n)));
            i /= n;
        }
        Derivation {
            bp: self.bp.clone(),
            name: self.name.clone(),
            slots,
        }
    }
}

/// All values of one child slot, instantiated together.
#[derive(Debug)]
struct Slot {
    name: String,
    parts: Vec<Choice>,
}

impl Slot {
    fn build(bp: &Blueprint, name: String, resolver: &Resolver) -> Result<Slot> {
        let values = bp.values(&name);
        if values.is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "property '{name}' has no values"
            )));
        }
        let parts = values
            .iter()
            .map(|value| Choice::build(bp, value, resolver))
            .collect::<Result<_>>()?;
        Ok(Slot { name, parts })
    }

    fn n(&self) -> usize {
        self.parts.iter().map(Choice::n).product()
    }

    fn get(&self, mut i: usize) -> Vec<Derivation> {
        let mut children = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let n = part.n();
            children.push(part.get(i % n));
            i /= n;
        }
        children
    }
}

/// The alternatives a referenced property offers, exactly one of which is
/// chosen per derivation.
#[derive(Debug)]
struct Alternatives {
    alts: Vec<Choice>,
}

impl Alternatives {
    fn build(bp: &Blueprint, property: &str, resolver: &Resolver) -> Result<Alternatives> {
        let values = bp.values(property);
        if values.is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "property '{property}' has no values"
            )));
        }
        let alts = values
            .iter()
            .map(|value| Choice::build(bp, value, resolver))
            .collect::<Result<_>>()?;
        Ok(Alternatives { alts })
    }

    fn n(&self) -> usize {
        self.alts.iter().map(Choice::n).sum()
    }

    fn get(&self, mut i: usize) -> Derivation {
        for alt in &self.alts {
            let n = alt.n();
            if i < n {
                return alt.get(i);
            }
            i -= n;
        }
        unreachable!("derivation index out of range")
    }
}

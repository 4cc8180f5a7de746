//! Structural queries over a world's entities.
//!
//! A [`Query`] is an ordered list of [`Term`]s evaluated against every
//! live slot. Most queries are pure presence filters that dozens of
//! systems re-run every tick, so their results are cached per world and
//! served in O(1) until the next structural mutation clears the cache.
//! A query containing a [`Term::Changed`] carries mutable comparison
//! state and is never cached — sharing a cache entry would make its
//! answer depend on who asked last.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::EcsError;
use crate::world::World;

/// One predicate within a query, dispatched by explicit matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// The entity has this component attached, and the system reads or
    /// writes its fields.
    With(String),
    /// The entity does not have this component attached.
    Without(String),
    /// The entity has this component attached. Matches exactly like
    /// [`Term::With`]; call sites use it to mark filter-only components
    /// whose fields the system never touches.
    Has(String),
    /// The entity has this component attached and at least one of its
    /// field values differs from the last time *this query* observed it.
    ///
    /// The first observation of an entity snapshots its values and
    /// reports it as changed. Snapshots are keyed by entity id and are
    /// deliberately not cleared on detach: re-attaching the component
    /// with values equal to the stale snapshot reports "unchanged".
    Changed(String),
}

impl Term {
    fn component(&self) -> &str {
        match self {
            Term::With(c) | Term::Without(c) | Term::Has(c) | Term::Changed(c) => c,
        }
    }

    fn cacheable(&self) -> bool {
        !matches!(self, Term::Changed(_))
    }

    fn tag(&self) -> u8 {
        match self {
            Term::With(_) => b'w',
            Term::Without(_) => b'n',
            Term::Has(_) => b'h',
            Term::Changed(_) => b'c',
        }
    }
}

/// FNV-1a 64-bit, the engine's canonical stable hash for cache keys.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Per-`Changed`-term comparison state: world id → entity → last-seen
/// flattened field values.
type ShadowMap = HashMap<Entity, Vec<f64>>;

/// A reusable, possibly stateful entity filter.
///
/// Construct once (typically per system) and call [`Query::run`] each
/// tick. Queries with only structural terms hit the world's cache;
/// anything else rescans every live slot, O(capacity × terms).
#[derive(Debug)]
pub struct Query {
    terms: Vec<Term>,
    key: Option<u64>,
    shadows: Vec<HashMap<String, ShadowMap>>,
}

impl Query {
    /// Build a query from an ordered term list. Terms are evaluated in
    /// order with short-circuit, so a `Changed` term placed after a
    /// presence term only observes entities that passed the earlier test.
    #[must_use]
    pub fn new(terms: Vec<Term>) -> Self {
        let key = if terms.iter().all(Term::cacheable) {
            let mut bytes = Vec::new();
            for term in &terms {
                bytes.push(term.tag());
                bytes.extend_from_slice(term.component().as_bytes());
                bytes.push(0);
            }
            Some(fnv1a(&bytes))
        } else {
            None
        };
        let shadows = terms.iter().map(|_| HashMap::new()).collect();
        Self {
            terms,
            key,
            shadows,
        }
    }

    /// Builder: add a [`Term::With`].
    #[must_use]
    pub fn with(self, component: impl Into<String>) -> Self {
        self.push(Term::With(component.into()))
    }

    /// Builder: add a [`Term::Without`].
    #[must_use]
    pub fn without(self, component: impl Into<String>) -> Self {
        self.push(Term::Without(component.into()))
    }

    /// Builder: add a [`Term::Has`].
    #[must_use]
    pub fn has(self, component: impl Into<String>) -> Self {
        self.push(Term::Has(component.into()))
    }

    /// Builder: add a [`Term::Changed`].
    #[must_use]
    pub fn changed(self, component: impl Into<String>) -> Self {
        self.push(Term::Changed(component.into()))
    }

    fn push(mut self, term: Term) -> Self {
        self.terms.push(term);
        Self::new(self.terms)
    }

    /// The query's terms.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Whether results may be served from the per-world cache.
    #[must_use]
    pub fn cacheable(&self) -> bool {
        self.key.is_some()
    }

    /// Evaluate against a world, returning matching entities in ascending
    /// id order. The returned vector is always a fresh copy.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownComponent`] if any term names a component that
    /// is not registered in this world.
    pub fn run(&mut self, world: &mut World) -> Result<Vec<Entity>, EcsError> {
        // Check every term up front so an unregistered component fails
        // immediately, cached or not.
        for term in &self.terms {
            world.store(term.component())?;
        }

        if let Some(key) = self.key
            && let Some(hit) = world.cache_get(key)
        {
            return Ok(hit.to_vec());
        }

        // Pull each Changed term's per-world shadow map out for the scan.
        let world_id = world.name().to_string();
        let mut scan_shadows: Vec<Option<ShadowMap>> = self
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| match t {
                Term::Changed(_) => {
                    Some(self.shadows[i].remove(&world_id).unwrap_or_default())
                }
                _ => None,
            })
            .collect();

        let mut matches = Vec::new();
        for entity in world.slot_table().iter_live() {
            let mut ok = true;
            for (i, term) in self.terms.iter().enumerate() {
                let component = term.component();
                let hit = match term {
                    Term::With(_) | Term::Has(_) => world.has(entity, component)?,
                    Term::Without(_) => !world.has(entity, component)?,
                    Term::Changed(_) => {
                        let attached = world.has(entity, component)?;
                        match scan_shadows[i].as_mut() {
                            Some(shadow) if attached => {
                                let current = world.store(component)?.snapshot(entity.index());
                                match shadow.get_mut(&entity) {
                                    None => {
                                        shadow.insert(entity, current);
                                        true
                                    }
                                    Some(last) if *last != current => {
                                        *last = current;
                                        true
                                    }
                                    Some(_) => false,
                                }
                            }
                            _ => false,
                        }
                    }
                };
                if !hit {
                    ok = false;
                    break;
                }
            }
            if ok {
                matches.push(entity);
            }
        }

        // Put the shadow maps back.
        for (i, map) in scan_shadows.into_iter().enumerate() {
            if let Some(map) = map {
                self.shadows[i].insert(world_id.clone(), map);
            }
        }

        if let Some(key) = self.key {
            world.cache_put(key, matches.clone());
        }
        Ok(matches)
    }
}

//! Per-call-site specialization state.
//!
//! A site holds an immutable [`SiteState`] behind an [`ArcSwap`]. Calls load
//! the current snapshot and scan it; growing the entry list or generalizing
//! builds a complete replacement and publishes it with compare-and-swap, so
//! a concurrent reader sees either the old list or the new one.
//!
//! Lifecycle of one site:
//!
//! ```text
//! uninitialized ──first shape──▶ 1 entry ──new shape──▶ … ──▶ K entries
//!                                                                │
//!                                               (K+1)-th shape   ▼
//!                                                           generalized
//! ```
//!
//! Generalization is permanent: the entries are dropped and every later
//! call goes straight to the generic implementation.

use super::shape::{ShapePair, classify};
use crate::interpreter::{PropertyKey, to_property_key};
use crate::types::JsValue;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Default degree of polymorphism per site.
pub const DEFAULT_POLYMORPHISM_LIMIT: usize = 4;

/// An operation whose implementations are a closed set of guarded variants.
///
/// The variant type doubles as the cache entry: a site stores the variants
/// it has installed, in order.
pub trait Specialization: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Site configuration fixed at creation (strictness and the like).
    type Config: fmt::Debug + Send + Sync;
    type Output;
    type Error;

    fn guard(self, shapes: ShapePair, config: &Self::Config) -> bool;

    /// The most specific variant whose guard accepts `shapes`.
    fn narrowest(shapes: ShapePair, config: &Self::Config) -> Self;

    fn invoke(
        self,
        config: &Self::Config,
        target: &JsValue,
        key: &PropertyKey,
    ) -> Result<Self::Output, Self::Error>;

    /// Shape-complete implementation with no site memory.
    fn generic(
        config: &Self::Config,
        target: &JsValue,
        key: &PropertyKey,
    ) -> Result<Self::Output, Self::Error>;

    /// Host execution budget, consulted once per call before any path runs.
    fn check_budget(_config: &Self::Config) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// One published snapshot of a site.
#[derive(Debug)]
pub struct SiteState<S> {
    entries: Vec<S>,
    generalized: bool,
    version: u64,
}

impl<S: Specialization> SiteState<S> {
    fn uninitialized() -> Self {
        Self {
            entries: Vec::new(),
            generalized: false,
            version: 0,
        }
    }

    fn with_entry(&self, entry: S) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.extend_from_slice(&self.entries);
        entries.push(entry);
        Self {
            entries,
            generalized: false,
            version: self.version + 1,
        }
    }

    fn to_generalized(&self) -> Self {
        Self {
            entries: Vec::new(),
            generalized: true,
            version: self.version + 1,
        }
    }

    pub fn entries(&self) -> &[S] {
        &self.entries
    }

    pub fn is_generalized(&self) -> bool {
        self.generalized
    }

    /// Number of publications that led to this snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn lookup(&self, shapes: ShapePair, config: &S::Config) -> Option<S> {
        self.entries
            .iter()
            .copied()
            .find(|entry| entry.guard(shapes, config))
    }
}

pub struct ExecutionSite<S: Specialization> {
    config: S::Config,
    limit: usize,
    state: ArcSwap<SiteState<S>>,
}

impl<S: Specialization> ExecutionSite<S> {
    /// A `limit` of zero is treated as one.
    pub fn new(config: S::Config, limit: usize) -> Self {
        Self {
            config,
            limit: limit.max(1),
            state: ArcSwap::from_pointee(SiteState::uninitialized()),
        }
    }

    pub fn config(&self) -> &S::Config {
        &self.config
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn state(&self) -> Arc<SiteState<S>> {
        self.state.load_full()
    }

    pub fn is_generalized(&self) -> bool {
        self.state.load().generalized
    }

    /// Drop all entries and route every later call to the generic path.
    pub fn generalize(&self) {
        self.state.rcu(|current| {
            if current.generalized {
                Arc::clone(current)
            } else {
                Arc::new(current.to_generalized())
            }
        });
    }

    pub fn execute(&self, target: &JsValue, key: &JsValue) -> Result<S::Output, S::Error> {
        S::check_budget(&self.config)?;
        let key = to_property_key(key);

        let state = self.state.load();
        if state.generalized {
            return S::generic(&self.config, target, &key);
        }
        let shapes = ShapePair::new(classify(target), key.shape());
        if let Some(entry) = state.lookup(shapes, &self.config) {
            return entry.invoke(&self.config, target, &key);
        }
        drop(state);

        match self.specialize(shapes) {
            Some(entry) => entry.invoke(&self.config, target, &key),
            None => S::generic(&self.config, target, &key),
        }
    }

    /// Install an entry for `shapes`, or generalize when the site is full.
    /// Returns the entry to run, `None` for the generic path.
    fn specialize(&self, shapes: ShapePair) -> Option<S> {
        let mut current = self.state.load_full();
        loop {
            if current.generalized {
                return None;
            }
            // A racing writer may already have covered this shape pair.
            if let Some(entry) = current.lookup(shapes, &self.config) {
                return Some(entry);
            }

            let (next, entry) = if current.entries.len() < self.limit {
                let entry = S::narrowest(shapes, &self.config);
                debug_assert!(entry.guard(shapes, &self.config));
                (current.with_entry(entry), Some(entry))
            } else {
                (current.to_generalized(), None)
            };
            let next = Arc::new(next);

            let prev = self.state.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*prev, &current) {
                match entry {
                    Some(entry) => debug!(
                        ?entry,
                        ?shapes,
                        entries = next.entries.len(),
                        version = next.version,
                        "installed specialization"
                    ),
                    None => debug!(
                        ?shapes,
                        limit = self.limit,
                        version = next.version,
                        "site generalized"
                    ),
                }
                return entry;
            }
            trace!(?shapes, "lost site publication race, retrying");
            current = Arc::clone(&*prev);
        }
    }
}

impl<S: Specialization> fmt::Debug for ExecutionSite<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("ExecutionSite")
            .field("config", &self.config)
            .field("limit", &self.limit)
            .field("entries", &state.entries)
            .field("generalized", &state.generalized)
            .field("version", &state.version)
            .finish()
    }
}

/// Index of a site inside its [`SiteArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SiteId(u32);

impl SiteId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owner of the execution sites of one program. Syntax nodes refer to their
/// site by [`SiteId`]; the node itself never changes.
pub struct SiteArena<S: Specialization> {
    sites: Vec<ExecutionSite<S>>,
}

impl<S: Specialization> SiteArena<S> {
    pub fn new() -> Self {
        Self { sites: Vec::new() }
    }

    pub fn alloc(&mut self, config: S::Config, limit: usize) -> SiteId {
        let id = SiteId(self.sites.len() as u32);
        self.sites.push(ExecutionSite::new(config, limit));
        id
    }

    pub fn get(&self, id: SiteId) -> Option<&ExecutionSite<S>> {
        self.sites.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SiteId, &ExecutionSite<S>)> {
        self.sites
            .iter()
            .enumerate()
            .map(|(i, site)| (SiteId(i as u32), site))
    }
}

impl<S: Specialization> Default for SiteArena<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialize::{KeyShape, OperandShape};

    /// Records which path served a call; the output is the shape pair seen
    /// by the implementation, so transparency is easy to check.
    #[derive(Clone, Copy, Debug, PartialEq)]
    struct ByTarget(OperandShape);

    impl Specialization for ByTarget {
        type Config = ();
        type Output = (OperandShape, KeyShape, bool);
        type Error = ();

        fn guard(self, shapes: ShapePair, _config: &()) -> bool {
            self.0 == shapes.target
        }

        fn narrowest(shapes: ShapePair, _config: &()) -> Self {
            ByTarget(shapes.target)
        }

        fn invoke(self, _: &(), target: &JsValue, key: &PropertyKey) -> Result<Self::Output, ()> {
            Ok((classify(target), key.shape(), false))
        }

        fn generic(_: &(), target: &JsValue, key: &PropertyKey) -> Result<Self::Output, ()> {
            Ok((classify(target), key.shape(), true))
        }
    }

    fn values() -> Vec<JsValue> {
        use crate::interpreter::JsObjectData;
        use crate::types::{JsObject, JsSymbol};
        vec![
            JsValue::Object(JsObject::new(JsObjectData::new())),
            JsValue::string("s"),
            JsValue::Number(1.0),
            JsValue::Symbol(JsSymbol::new(None)),
            JsValue::Boolean(true),
            JsValue::Object(JsObject::new(JsObjectData::new_array(vec![]))),
        ]
    }

    #[test]
    fn installs_in_order() {
        let site = ExecutionSite::<ByTarget>::new((), 4);
        let vals = values();
        let key = JsValue::string("k");
        site.execute(&vals[0], &key).unwrap();
        site.execute(&vals[1], &key).unwrap();
        site.execute(&vals[0], &key).unwrap();
        let state = site.state();
        assert_eq!(
            state.entries(),
            &[
                ByTarget(OperandShape::OrdinaryObject),
                ByTarget(OperandShape::PrimitiveString)
            ]
        );
        assert_eq!(state.version(), 2);
        assert!(!state.is_generalized());
    }

    #[test]
    fn key_is_normalized_before_dispatch() {
        let site = ExecutionSite::<ByTarget>::new((), 4);
        let out = site.execute(&JsValue::Null, &JsValue::string("12")).unwrap();
        assert_eq!(out.1, KeyShape::Index);
        let out = site.execute(&JsValue::Null, &JsValue::Number(2.5)).unwrap();
        assert_eq!(out.1, KeyShape::String);
    }

    #[test]
    fn generalizes_past_limit() {
        let site = ExecutionSite::<ByTarget>::new((), 4);
        let vals = values();
        let key = JsValue::string("k");
        for v in &vals[..4] {
            let (_, _, generic) = site.execute(v, &key).unwrap();
            assert!(!generic);
            assert!(site.state().entries().len() <= 4);
        }
        let (_, _, generic) = site.execute(&vals[4], &key).unwrap();
        assert!(generic);
        assert!(site.is_generalized());
        assert!(site.state().entries().is_empty());

        // Previously cached shapes now take the generic path too.
        let (_, _, generic) = site.execute(&vals[0], &key).unwrap();
        assert!(generic);
        assert!(site.is_generalized());
    }

    #[test]
    fn zero_limit_is_clamped() {
        let site = ExecutionSite::<ByTarget>::new((), 0);
        assert_eq!(site.limit(), 1);
        let vals = values();
        let key = JsValue::string("k");
        assert!(!site.execute(&vals[0], &key).unwrap().2);
        assert!(site.execute(&vals[1], &key).unwrap().2);
    }

    #[test]
    fn forced_generalization_is_permanent() {
        let site = ExecutionSite::<ByTarget>::new((), 4);
        site.generalize();
        let version = site.state().version();
        site.generalize();
        assert_eq!(site.state().version(), version);
        let vals = values();
        assert!(site.execute(&vals[0], &JsValue::string("k")).unwrap().2);
        assert!(site.state().entries().is_empty());
    }

    #[test]
    fn concurrent_growth_stays_bounded() {
        let site = ExecutionSite::<ByTarget>::new((), 3);
        let keys = ["a", "0", "b"];
        std::thread::scope(|s| {
            for t in 0..4 {
                let site = &site;
                s.spawn(move || {
                    // Values are built per thread; only the site is shared.
                    let vals = values();
                    for round in 0..50 {
                        let v = &vals[(t + round) % 3];
                        let k = JsValue::string(keys[round % keys.len()]);
                        let (shape, _, _) = site.execute(v, &k).unwrap();
                        assert_eq!(shape, classify(v));
                        assert!(site.state().entries().len() <= 3);
                    }
                });
            }
        });
        let state = site.state();
        assert!(!state.is_generalized());
        assert_eq!(state.entries().len(), 3);
    }

    #[test]
    fn arena_hands_out_stable_ids() {
        let mut arena = SiteArena::<ByTarget>::new();
        let a = arena.alloc((), 2);
        let b = arena.alloc((), 4);
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).unwrap().limit(), 2);
        assert_eq!(arena.get(b).unwrap().limit(), 4);
        assert_eq!(arena.iter().count(), 2);
    }
}

//! Process-lifetime dedup cache keyed by URL fingerprint.
//!
//! Completed triples and in-flight computations live under one lock, so a
//! lookup either sees the finished triple or joins the computation already
//! running for that fingerprint. At most one computation is started per
//! fingerprint, even across runs sharing the cache. Each parked URL keeps
//! the result channel of the run it came from.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::model::{ColorReport, ColorTriple, Fingerprint, WorkItem};

/// Outcome of [`DedupCache::lookup_or_claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Already computed.
    Hit(ColorTriple),
    /// The caller now owns the computation and must call
    /// [`DedupCache::complete`] when done.
    Claimed,
    /// Another computation is running; the URL was parked and will be
    /// returned by [`DedupCache::complete`].
    Coalesced,
}

/// A URL parked on another computation, with the sink its report goes to.
#[derive(Debug, Clone)]
pub struct Waiter {
    pub url: String,
    pub reply: mpsc::Sender<ColorReport>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Fingerprint, ColorTriple>,
    /// Fingerprint -> URLs waiting on the running computation.
    in_flight: HashMap<Fingerprint, Vec<Waiter>>,
}

/// Shared fingerprint -> color triple map. Pass it around in an `Arc`.
#[derive(Default)]
pub struct DedupCache {
    inner: Mutex<Inner>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves the maps consistent, so a poisoned
        // lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<ColorTriple> {
        self.lock().entries.get(fingerprint).cloned()
    }

    /// Store a triple directly, e.g. to seed a cache before a run.
    pub fn insert(&self, fingerprint: Fingerprint, colors: ColorTriple) {
        self.lock().entries.insert(fingerprint, colors);
    }

    /// Check the cache for `item` and, on a miss, either claim the
    /// computation or join the one in flight. A joined URL is answered on
    /// `reply` when the computation completes.
    pub fn lookup_or_claim(&self, item: &WorkItem, reply: &mpsc::Sender<ColorReport>) -> Lookup {
        let mut inner = self.lock();
        if let Some(colors) = inner.entries.get(&item.fingerprint) {
            return Lookup::Hit(colors.clone());
        }
        match inner.in_flight.get_mut(&item.fingerprint) {
            Some(waiters) => {
                waiters.push(Waiter {
                    url: item.url.clone(),
                    reply: reply.clone(),
                });
                Lookup::Coalesced
            }
            None => {
                inner.in_flight.insert(item.fingerprint, Vec::new());
                Lookup::Claimed
            }
        }
    }

    /// Store the result of a claimed computation and hand back the
    /// waiters parked on it.
    pub fn complete(&self, fingerprint: Fingerprint, colors: ColorTriple) -> Vec<Waiter> {
        let mut inner = self.lock();
        inner.entries.insert(fingerprint, colors);
        inner.in_flight.remove(&fingerprint).unwrap_or_default()
    }

    /// Number of cached triples.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of computations currently claimed.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }
}

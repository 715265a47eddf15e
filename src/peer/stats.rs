use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-peer exchange counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeStats {
    pub offers_created: u64,
    pub answers_created: u64,
    pub local_descriptions_applied: u64,
    pub remote_descriptions_applied: u64,
    pub descriptions_forwarded: u64,
    pub candidates_relayed: u64,
    pub candidates_applied: u64,
    pub tracks_announced: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub offers_created: AtomicU64,
    pub answers_created: AtomicU64,
    pub local_descriptions_applied: AtomicU64,
    pub remote_descriptions_applied: AtomicU64,
    pub descriptions_forwarded: AtomicU64,
    pub candidates_relayed: AtomicU64,
    pub candidates_applied: AtomicU64,
    pub tracks_announced: AtomicU64,
}

impl StatsCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ExchangeStats {
        ExchangeStats {
            offers_created: self.offers_created.load(Ordering::Relaxed),
            answers_created: self.answers_created.load(Ordering::Relaxed),
            local_descriptions_applied: self.local_descriptions_applied.load(Ordering::Relaxed),
            remote_descriptions_applied: self.remote_descriptions_applied.load(Ordering::Relaxed),
            descriptions_forwarded: self.descriptions_forwarded.load(Ordering::Relaxed),
            candidates_relayed: self.candidates_relayed.load(Ordering::Relaxed),
            candidates_applied: self.candidates_applied.load(Ordering::Relaxed),
            tracks_announced: self.tracks_announced.load(Ordering::Relaxed),
        }
    }
}

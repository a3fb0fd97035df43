//! Forward and reverse transfer index.
//!
//! Building runs in two passes. The forward pass prices and deduplicates the
//! candidates of each stop; stops are independent, so the pass can fan out
//! over worker threads, each writing only the output slots of its own stops.
//! The reverse pass is sequential: many source stops feed the same
//! destination's reverse list.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::thread;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::TransferIndexConfig;
use crate::domain::StopIndex;

use super::{CandidateTransfer, SearchDirection, TransferCostModel, TransferEdge};

/// Error from building the transfer index.
///
/// These indicate a broken upstream invariant and abort the build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferIndexError {
    /// A candidate points at a stop that does not exist
    #[error("transfer from stop {from} targets stop {to}, but the network has {stop_count} stops")]
    StopIndexOutOfRange {
        from: StopIndex,
        to: StopIndex,
        stop_count: usize,
    },
}

type EdgeLists = Box<[Box<[TransferEdge]>]>;

/// Immutable transfer graph, shared read-only by all searches.
///
/// For any stop pair there is at most one forward and one reverse edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIndex {
    forward: EdgeLists,
    reverse: EdgeLists,
}

impl TransferIndex {
    /// An index over `stop_count` stops with no transfers.
    pub fn empty(stop_count: usize) -> Self {
        Self {
            forward: freeze(vec![Vec::new(); stop_count]),
            reverse: freeze(vec![Vec::new(); stop_count]),
        }
    }

    /// Build the index from per-stop candidate lists.
    ///
    /// `candidates_by_stop[i]` holds the candidates leaving stop `i`. Every
    /// destination must be a valid stop index.
    pub fn build<M: TransferCostModel>(
        candidates_by_stop: &[Vec<CandidateTransfer>],
        cost_model: &M,
        config: &TransferIndexConfig,
    ) -> Result<Self, TransferIndexError> {
        let started = Instant::now();
        let stop_count = candidates_by_stop.len();

        validate(candidates_by_stop)?;

        let workers = config.effective_workers(stop_count);
        let forward = if workers > 1 {
            forward_pass_parallel(candidates_by_stop, cost_model, workers)
        } else {
            forward_pass_serial(candidates_by_stop, cost_model)
        };

        let reverse = reverse_pass(&forward);

        let index = Self {
            forward: freeze(forward),
            reverse: freeze(reverse),
        };

        info!(
            stops = stop_count,
            edges = index.edge_count(),
            workers,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transfer index built"
        );

        Ok(index)
    }

    /// Transfers leaving `stop`, for forward searches.
    ///
    /// Unknown stops have no transfers.
    pub fn forward_edges(&self, stop: StopIndex) -> &[TransferEdge] {
        self.forward.get(stop.0).map(|v| &**v).unwrap_or(&[])
    }

    /// Transfers arriving at `stop`, reversed, for arrive-by searches.
    pub fn reverse_edges(&self, stop: StopIndex) -> &[TransferEdge] {
        self.reverse.get(stop.0).map(|v| &**v).unwrap_or(&[])
    }

    /// Number of stops covered.
    pub fn stop_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of forward edges (equal to the number of reverse edges).
    pub fn edge_count(&self) -> usize {
        self.forward.iter().map(|edges| edges.len()).sum()
    }
}

fn validate(candidates_by_stop: &[Vec<CandidateTransfer>]) -> Result<(), TransferIndexError> {
    let stop_count = candidates_by_stop.len();

    for (from, candidates) in candidates_by_stop.iter().enumerate() {
        if let Some(bad) = candidates.iter().find(|c| c.to.0 >= stop_count) {
            return Err(TransferIndexError::StopIndexOutOfRange {
                from: StopIndex(from),
                to: bad.to,
                stop_count,
            });
        }
    }

    Ok(())
}

/// Price the candidates of one stop, keeping the cheapest edge per
/// destination.
///
/// A later candidate replaces an earlier one only if strictly cheaper, so the
/// first one seen wins a tie. Edges come out ordered by destination.
fn edges_from_stop<M: TransferCostModel>(
    candidates: &[CandidateTransfer],
    cost_model: &M,
) -> Vec<TransferEdge> {
    let mut best: BTreeMap<StopIndex, TransferEdge> = BTreeMap::new();

    for candidate in candidates {
        let Some(cost) = cost_model.cost(candidate, SearchDirection::Forward) else {
            continue;
        };
        let edge = TransferEdge::new(candidate.to, cost);

        match best.entry(candidate.to) {
            Entry::Vacant(slot) => {
                slot.insert(edge);
            }
            Entry::Occupied(mut slot) => {
                if edge.c1 < slot.get().c1 {
                    slot.insert(edge);
                }
            }
        }
    }

    best.into_values().collect()
}

fn forward_pass_serial<M: TransferCostModel>(
    candidates_by_stop: &[Vec<CandidateTransfer>],
    cost_model: &M,
) -> Vec<Vec<TransferEdge>> {
    candidates_by_stop
        .iter()
        .map(|candidates| edges_from_stop(candidates, cost_model))
        .collect()
}

/// Forward pass split into contiguous stop ranges, one per worker.
///
/// Each worker owns a disjoint `chunks_mut` range of the output slots, so no
/// two workers ever write the same slot and no locking is needed.
fn forward_pass_parallel<M: TransferCostModel>(
    candidates_by_stop: &[Vec<CandidateTransfer>],
    cost_model: &M,
    workers: usize,
) -> Vec<Vec<TransferEdge>> {
    let mut slots: Vec<Vec<TransferEdge>> = vec![Vec::new(); candidates_by_stop.len()];
    let chunk_size = candidates_by_stop.len().div_ceil(workers).max(1);

    thread::scope(|scope| {
        for (outputs, inputs) in slots
            .chunks_mut(chunk_size)
            .zip(candidates_by_stop.chunks(chunk_size))
        {
            scope.spawn(move || {
                for (slot, candidates) in outputs.iter_mut().zip(inputs) {
                    *slot = edges_from_stop(candidates, cost_model);
                }
            });
        }
    });

    debug!(workers, chunk_size, "Parallel forward pass complete");

    slots
}

fn reverse_pass(forward: &[Vec<TransferEdge>]) -> Vec<Vec<TransferEdge>> {
    let mut reverse: Vec<Vec<TransferEdge>> = vec![Vec::new(); forward.len()];

    for (from, edges) in forward.iter().enumerate() {
        for edge in edges {
            reverse[edge.stop.0].push(TransferEdge::reverse_of(StopIndex(from), edge));
        }
    }

    reverse
}

fn freeze(lists: Vec<Vec<TransferEdge>>) -> EdgeLists {
    lists.into_iter().map(Vec::into_boxed_slice).collect()
}

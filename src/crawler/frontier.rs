//! Crawl frontier: the FIFO work queue plus the visited set
//!
//! The frontier is the only mutable crawl state. It is owned by the
//! coordinator and synchronized with the checkpoint file only at explicit
//! checkpoint points.

use crate::storage::CheckpointState;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// A URL waiting to be processed, together with its crawl depth
///
/// Serialized as a `[url, depth]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, u32)", into = "(String, u32)")]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

impl From<(String, u32)> for FrontierEntry {
    fn from((url, depth): (String, u32)) -> Self {
        Self { url, depth }
    }
}

impl From<FrontierEntry> for (String, u32) {
    fn from(entry: FrontierEntry) -> Self {
        (entry.url, entry.depth)
    }
}

/// FIFO queue of pending entries with permanent visited-set deduplication
///
/// # Invariants
///
/// - A URL is queued at most once while unvisited
/// - Once a URL is marked visited, pushing it again is a no-op
/// - Entries pop in insertion order, which gives breadth-first traversal
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier holding the seeds at depth 0, in list order
    pub fn from_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frontier = Self::new();
        for seed in seeds {
            frontier.push(seed, 0);
        }
        frontier
    }

    /// Rebuilds a frontier from a checkpoint
    ///
    /// Queue order is preserved. If the same URL appears more than once in
    /// the stored queue, or is also in the visited set, only its first
    /// admissible occurrence is kept.
    pub fn from_checkpoint(state: CheckpointState) -> Self {
        let mut frontier = Self {
            visited: state.visited.into_iter().collect(),
            ..Self::default()
        };
        for entry in state.queue {
            frontier.push(entry.url, entry.depth);
        }
        frontier
    }

    /// Produces a serializable snapshot
    ///
    /// The visited list is sorted so two snapshots of the same state are
    /// byte-identical.
    pub fn to_checkpoint(&self) -> CheckpointState {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();

        CheckpointState::new(visited, self.queue.iter().cloned().collect())
    }

    /// Enqueues a URL unless it is already visited or queued
    ///
    /// Returns true if the entry was added.
    pub fn push(&mut self, url: impl Into<String>, depth: u32) -> bool {
        let url = url.into();
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }

        self.queued.insert(url.clone());
        self.queue.push_back(FrontierEntry { url, depth });
        true
    }

    /// Removes and returns the oldest entry
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.queued.remove(&entry.url);
        Some(entry)
    }

    /// Records a URL as visited
    ///
    /// Returns false if it had already been visited.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_queued(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

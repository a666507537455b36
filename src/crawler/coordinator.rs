//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Loading the checkpoint or seeding the frontier
//! - Draining the frontier breadth-first, one entry at a time
//! - Coordinating fetching, classification, extraction and link discovery
//! - Periodic and final checkpoints
//! - Cooperative interruption between entries

use crate::config::Config;
use crate::crawler::extractor::{extract, ExtractionOutcome};
use crate::crawler::fetcher::RetryingFetcher;
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::parser::parse_links;
use crate::output::{CrawlStats, Document, DocumentSink, FsDocumentSink, OutputError};
use crate::policy::{EncodingPolicy, UrlPolicy};
use crate::state::CrawlPhase;
use crate::storage::{CheckpointStore, JsonCheckpointStore};
use crate::url::normalize_url;
use crate::{FetchError, LexError};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use url::Url;

/// Result of a finished (drained or interrupted) crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Terminal phase the run ended in
    pub phase: CrawlPhase,
    pub stats: CrawlStats,
    pub elapsed: Duration,
}

/// What happened to a fetched page's content
#[derive(Debug)]
enum ArchiveStatus {
    /// Written to the output root
    Saved { path: PathBuf, fallback: bool },
    /// Navigation page, crawled for links only
    NotContent,
    /// Content page that could not be written
    Failed(OutputError),
}

/// Outcome of processing one frontier entry
#[derive(Debug)]
struct PageReport {
    archive: ArchiveStatus,
    links_enqueued: u64,
}

/// Main crawler coordinator structure
///
/// Owns the frontier and every collaborator. There is no shared state: the
/// frontier is touched only from [`Coordinator::run`].
pub struct Coordinator {
    config: Config,
    policy: UrlPolicy,
    fetcher: RetryingFetcher,
    frontier: Frontier,
    store: JsonCheckpointStore,
    sink: FsDocumentSink,
    phase: CrawlPhase,
    stats: CrawlStats,
    config_hash: Option<String>,
    resumed_hash: Option<String>,
    shutdown: Option<watch::Receiver<bool>>,
    since_checkpoint: u32,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Creates the output directory and builds the initial frontier: from
    /// the checkpoint when one can be read (unless `fresh`), from the
    /// configured seeds otherwise. A corrupt checkpoint is logged and
    /// ignored.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Ignore any existing checkpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, in the `Init` phase
    /// * `Err(LexError)` - Output directory, HTTP client or source profiles
    ///   could not be set up
    pub fn new(config: Config, fresh: bool) -> Result<Self, LexError> {
        let policy = UrlPolicy::from_config(&config)?;
        let fetcher = RetryingFetcher::from_config(&config.user_agent, &config.crawler, &config.retry)?;

        let sink = FsDocumentSink::new(&config.output.output_dir);
        sink.ensure_root()?;

        let store = JsonCheckpointStore::new(&config.output.checkpoint_path);
        let (frontier, resumed_hash) = initial_frontier(&config, &store, fresh)?;

        Ok(Self {
            config,
            policy,
            fetcher,
            frontier,
            store,
            sink,
            phase: CrawlPhase::Init,
            stats: CrawlStats::new(),
            config_hash: None,
            resumed_hash,
            shutdown: None,
            since_checkpoint: 0,
        })
    }

    /// Records the configuration hash in every checkpoint written
    ///
    /// Warns when the checkpoint being resumed was written under a
    /// different configuration.
    pub fn with_config_hash(mut self, hash: String) -> Self {
        if let Some(previous) = &self.resumed_hash {
            if *previous != hash {
                tracing::warn!(
                    "Configuration changed since the checkpoint was written ({} -> {}); resuming anyway",
                    previous,
                    hash
                );
            }
        }
        self.config_hash = Some(hash);
        self
    }

    /// Watches a channel for a stop request
    ///
    /// The coordinator checks it between entries; once it reads `true` the
    /// run writes a final checkpoint and ends as `Interrupted`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Pops the oldest entry, ending as `Drained` when none is left
    /// 2. Marks it visited
    /// 3. Skips entries deeper than `max-depth`
    /// 4. Fetches, archives content pages and enqueues discovered links
    /// 5. Checkpoints every `checkpoint-interval` entries
    /// 6. Sleeps the politeness delay
    ///
    /// The periodic checkpoint is taken only once the entry's links are in
    /// the queue, so a snapshot never lists a page as visited without also
    /// holding everything discovered from it.
    ///
    /// A failing page is logged and skipped. Only a stop request or an
    /// empty frontier ends the run.
    pub async fn run(&mut self) -> Result<CrawlReport, LexError> {
        self.transition(CrawlPhase::Running)?;
        tracing::info!(
            "Starting crawl: {} queued, {} already visited",
            self.frontier.len(),
            self.frontier.visited_count()
        );

        let start_time = Instant::now();
        let max_depth = self.config.crawler.max_depth;

        loop {
            if self.stop_requested() {
                tracing::info!(
                    "Stop requested, saving progress ({} entries still queued)",
                    self.frontier.len()
                );
                self.transition(CrawlPhase::Interrupted)?;
                self.save_checkpoint();
                break;
            }

            let entry = match self.frontier.pop() {
                Some(entry) => entry,
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    self.transition(CrawlPhase::Drained)?;
                    self.save_checkpoint();
                    break;
                }
            };

            if !self.frontier.mark_visited(&entry.url) {
                tracing::debug!("Already visited: {}", entry.url);
                continue;
            }
            self.stats.visited += 1;
            self.since_checkpoint += 1;

            let fetched = if entry.depth > max_depth {
                tracing::debug!(
                    "Skipping {} (depth {} exceeds {})",
                    entry.url,
                    entry.depth,
                    max_depth
                );
                self.stats.depth_skipped += 1;
                false
            } else {
                match self.process_entry(&entry).await {
                    Ok(report) => self.record(&entry, report),
                    Err(e) => {
                        tracing::warn!("Skipping {}: {}", entry.url, e);
                        self.stats.fetch_failures += 1;
                    }
                }
                true
            };

            if self.since_checkpoint >= self.config.crawler.checkpoint_interval {
                self.checkpoint()?;
            }

            if !fetched {
                continue;
            }

            if self.stats.visited % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = self.stats.visited as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} visited, {} archived, {} in frontier, {:.2} pages/sec",
                    self.stats.visited,
                    self.stats.archived,
                    self.frontier.len(),
                    rate
                );
            }

            tokio::time::sleep(Duration::from_millis(self.config.crawler.politeness_delay)).await;
        }

        let elapsed = start_time.elapsed();
        self.stats.log_summary(elapsed);

        Ok(CrawlReport {
            phase: self.phase,
            stats: self.stats.clone(),
            elapsed,
        })
    }

    /// Processes a single frontier entry
    ///
    /// This method:
    /// 1. Fetches the page and rejects non-success statuses
    /// 2. Decodes it with the source's encoding policy
    /// 3. Extracts and writes it if it is a content page
    /// 4. Enqueues its links if it is above the depth limit
    async fn process_entry(&mut self, entry: &FrontierEntry) -> Result<PageReport, FetchError> {
        let page = self
            .fetcher
            .fetch(&entry.url)
            .await?
            .ensure_success(&entry.url)?;

        let url = Url::parse(&entry.url).map_err(|e| FetchError::Fatal {
            url: entry.url.clone(),
            reason: format!("malformed URL: {}", e),
        })?;

        let encoding = self
            .policy
            .profile_for(&url)
            .map(|profile| profile.encoding)
            .unwrap_or(EncodingPolicy::Transport);
        let text = page.text(encoding);

        let archive = if self.policy.is_content(&entry.url) {
            self.archive(&url, &text)
        } else {
            ArchiveStatus::NotContent
        };

        let links_enqueued = if entry.depth < self.config.crawler.max_depth {
            self.discover_links(&text, &page.final_url, entry.depth + 1)
        } else {
            0
        };

        Ok(PageReport {
            archive,
            links_enqueued,
        })
    }

    /// Extracts a content page and writes it through the sink
    fn archive(&self, url: &Url, text: &str) -> ArchiveStatus {
        let extraction = extract(&self.policy, url, text);
        let fallback = extraction.is_fallback();
        if fallback {
            tracing::warn!(
                "Expected content container missing on {}, archiving whole page",
                url
            );
        } else if let ExtractionOutcome::Container(selector) = &extraction.outcome {
            tracing::debug!("Extracted {} from {}", selector, url);
        }

        let style = self
            .policy
            .profile_for(url)
            .map(|profile| profile.filename)
            .unwrap_or_default();
        let document = Document::new(url.clone(), extraction.body, style);

        match self.sink.write(&document) {
            Ok(path) => ArchiveStatus::Saved { path, fallback },
            Err(e) => ArchiveStatus::Failed(e),
        }
    }

    /// Pushes the page's valid, unseen links at `depth`
    fn discover_links(&mut self, text: &str, base_url: &Url, depth: u32) -> u64 {
        let mut enqueued = 0;

        for link in parse_links(text, base_url) {
            let normalized = match normalize_url(&link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Failed to normalize URL {}: {}", link, e);
                    continue;
                }
            };

            if !self.policy.is_valid(normalized.as_str()) {
                tracing::trace!("Rejected by policy: {}", normalized);
                continue;
            }

            if self.frontier.push(normalized.as_str(), depth) {
                enqueued += 1;
            }
        }

        enqueued
    }

    fn record(&mut self, entry: &FrontierEntry, report: PageReport) {
        match report.archive {
            ArchiveStatus::Saved { path, fallback } => {
                self.stats.archived += 1;
                if fallback {
                    self.stats.extraction_fallbacks += 1;
                }
                tracing::info!(
                    "Archived {} | {} -> {}",
                    self.stats.archived,
                    entry.url,
                    path.display()
                );
            }
            ArchiveStatus::NotContent => {
                self.stats.navigation += 1;
                tracing::debug!("Navigation page {} (depth {})", entry.url, entry.depth);
            }
            ArchiveStatus::Failed(e) => {
                self.stats.persist_failures += 1;
                tracing::warn!("Could not archive {}: {}", entry.url, e);
            }
        }
        self.stats.links_enqueued += report.links_enqueued;
    }

    /// Passes through `Checkpointing` and back to `Running`
    fn checkpoint(&mut self) -> Result<(), LexError> {
        self.transition(CrawlPhase::Checkpointing)?;
        self.save_checkpoint();
        self.transition(CrawlPhase::Running)
    }

    /// Writes the frontier to the checkpoint store
    ///
    /// A failed save is logged and counted; the crawl continues in memory.
    fn save_checkpoint(&mut self) {
        self.since_checkpoint = 0;
        let state = self
            .frontier
            .to_checkpoint()
            .with_config_hash(self.config_hash.clone());

        match self.store.save(&state) {
            Ok(()) => {
                self.stats.checkpoints_written += 1;
                tracing::info!(
                    "Checkpoint saved: {} visited, {} queued",
                    state.visited.len(),
                    state.queue.len()
                );
            }
            Err(e) => {
                self.stats.checkpoint_failures += 1;
                tracing::error!(
                    "Failed to save checkpoint to {}: {}",
                    self.store.path().display(),
                    e
                );
            }
        }
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), LexError> {
        self.phase = self.phase.transition(next)?;
        tracing::trace!("Crawl phase: {}", self.phase);
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Builds the starting frontier
///
/// Returns the frontier and, when resuming, the config hash recorded in
/// the checkpoint.
fn initial_frontier(
    config: &Config,
    store: &JsonCheckpointStore,
    fresh: bool,
) -> Result<(Frontier, Option<String>), LexError> {
    if fresh {
        tracing::info!("Starting fresh crawl, ignoring any existing checkpoint");
        return Ok((seed_frontier(config)?, None));
    }

    match store.load() {
        Ok(Some(state)) => {
            tracing::info!(
                "Resuming from {}: {} visited, {} queued",
                store.path().display(),
                state.visited.len(),
                state.queue.len()
            );
            let hash = state.config_hash.clone();
            Ok((Frontier::from_checkpoint(state), hash))
        }
        Ok(None) => {
            tracing::info!("No checkpoint found, seeding frontier");
            Ok((seed_frontier(config)?, None))
        }
        Err(e) => {
            tracing::warn!("Could not load checkpoint ({}), starting fresh from seeds", e);
            Ok((seed_frontier(config)?, None))
        }
    }
}

/// Enqueues the configured seeds at depth 0, in list order
fn seed_frontier(config: &Config) -> Result<Frontier, LexError> {
    let seeds = config
        .crawler
        .seeds
        .iter()
        .map(|seed| normalize_url(seed).map(String::from))
        .collect::<Result<Vec<_>, _>>()?;

    let frontier = Frontier::from_seeds(seeds);
    tracing::info!("Seeded frontier with {} URLs", frontier.len());
    Ok(frontier)
}

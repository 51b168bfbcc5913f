//! Per-segment asynchronous fetch + decode
//!
//! Every request spawns one task that fetches the payload bytes, decodes
//! them on the blocking pool and posts a [`LoadOutcome`] back on a channel.
//! Outcomes are applied by [`LoadPipeline::complete`] on the owner's side,
//! so the record table only ever has one writer.
//!
//! Each request is tagged with a generation number. Evicting a segment
//! aborts its task and drops the record; an outcome that was already queued
//! no longer matches any live generation and is discarded instead of
//! resurrecting the segment.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::codec::{decode, SplatPayload};
use crate::core::{Error, Result};
use crate::segment::{SegmentId, SegmentTable};
use crate::streaming::source::PayloadSource;

/// Lifecycle of a requested segment. Segments without a record are idle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

/// Raw result of one load task, before it is applied to the record table.
#[derive(Debug)]
pub struct LoadOutcome {
    pub segment: SegmentId,
    generation: u64,
    result: Result<SplatPayload>,
}

impl LoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// An outcome that was accepted by the record table
#[derive(Debug)]
pub enum Completion {
    /// Payload decoded and stored; fetch it with [`LoadPipeline::payload`]
    Ready(SegmentId),
    Failed { segment: SegmentId, error: Error },
}

impl Completion {
    pub fn segment(&self) -> SegmentId {
        match self {
            Completion::Ready(segment) => *segment,
            Completion::Failed { segment, .. } => *segment,
        }
    }
}

/// What evicting a segment did to its record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eviction {
    /// A loaded payload was dropped; the renderer must release its resources
    Disposed,
    /// An in-flight load was abandoned
    Cancelled,
    /// A failed record was cleared
    Cleared,
    /// Nothing was recorded for this segment
    Absent,
}

struct LoadRecord {
    state: LoadState,
    generation: u64,
    payload: Option<SplatPayload>,
    task: Option<JoinHandle<()>>,
}

/// Counters for pipeline activity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub requested: u64,
    pub loaded: u64,
    pub failed: u64,
    pub evicted: u64,
    /// Outcomes that arrived for a segment evicted while loading
    pub stale_discarded: u64,
}

/// Owns the load records and the tasks that fill them.
pub struct LoadPipeline<S: PayloadSource> {
    table: Arc<SegmentTable>,
    source: Arc<S>,
    limiter: Arc<Semaphore>,
    runtime: Handle,
    records: HashMap<SegmentId, LoadRecord>,
    next_generation: u64,
    outcome_tx: mpsc::UnboundedSender<LoadOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    stats: PipelineStats,
}

impl<S: PayloadSource> LoadPipeline<S> {
    /// Create a pipeline spawning onto `runtime`
    ///
    /// # Arguments
    /// * `table` - Segment table used to look up payload files
    /// * `source` - Where payload bytes come from
    /// * `max_concurrent` - Maximum number of fetch + decode tasks running at once
    pub fn new(table: Arc<SegmentTable>, source: Arc<S>, max_concurrent: usize, runtime: Handle) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        Self {
            table,
            source,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
            runtime,
            records: HashMap::new(),
            next_generation: 0,
            outcome_tx,
            outcome_rx,
            stats: PipelineStats::default(),
        }
    }

    /// Create a pipeline on the current tokio runtime
    pub fn with_current_runtime(table: Arc<SegmentTable>, source: Arc<S>, max_concurrent: usize) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(Self::new(table, source, max_concurrent, runtime))
    }

    /// Start loading a segment.
    ///
    /// Returns `Ok(false)` if the segment is already loading or loaded. A
    /// failed segment is retried only when requested again.
    pub fn request(&mut self, segment: SegmentId) -> Result<bool> {
        let file = self.table.segment(segment)?.file.clone();

        if let Some(record) = self.records.get(&segment) {
            if matches!(record.state, LoadState::Loading | LoadState::Loaded) {
                return Ok(false);
            }
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let source = Arc::clone(&self.source);
        let limiter = Arc::clone(&self.limiter);
        let outcome_tx = self.outcome_tx.clone();

        let task = self.runtime.spawn(async move {
            let result = match limiter.acquire_owned().await {
                Ok(permit) => {
                    // A panicking source must still end in a Failed outcome.
                    let mut load = AbortOnDrop(tokio::spawn(async move {
                        fetch_and_decode(source.as_ref(), &file).await
                    }));
                    let result = match (&mut load.0).await {
                        Ok(result) => result,
                        Err(e) => Err(Error::Runtime(format!("load task failed: {}", e))),
                    };
                    drop(permit);
                    result
                }
                Err(e) => Err(Error::Runtime(e.to_string())),
            };

            // The receiver lives as long as the pipeline; a send error only
            // means the pipeline is gone.
            let _ = outcome_tx.send(LoadOutcome { segment, generation, result });
        });

        self.records.insert(segment, LoadRecord {
            state: LoadState::Loading,
            generation,
            payload: None,
            task: Some(task),
        });
        self.stats.requested += 1;

        log::debug!("Requested segment {} (generation {})", segment, generation);
        Ok(true)
    }

    /// Drop a segment's record, aborting its load if still in flight.
    pub fn evict(&mut self, segment: SegmentId) -> Eviction {
        let Some(record) = self.records.remove(&segment) else {
            return Eviction::Absent;
        };

        if let Some(task) = record.task {
            task.abort();
        }
        self.stats.evicted += 1;

        match record.state {
            LoadState::Loaded => Eviction::Disposed,
            LoadState::Loading => Eviction::Cancelled,
            LoadState::Failed(_) => Eviction::Cleared,
        }
    }

    /// Apply a task outcome to the record table.
    ///
    /// Returns `None` when the outcome belongs to a request that has since
    /// been evicted or superseded.
    pub fn complete(&mut self, outcome: LoadOutcome) -> Option<Completion> {
        let LoadOutcome { segment, generation, result } = outcome;

        let record = match self.records.get_mut(&segment) {
            Some(record) if record.generation == generation && record.state == LoadState::Loading => record,
            _ => {
                self.stats.stale_discarded += 1;
                log::debug!("Discarding stale load of segment {} (generation {})", segment, generation);
                return None;
            }
        };

        record.task = None;

        match result {
            Ok(payload) => {
                record.state = LoadState::Loaded;
                record.payload = Some(payload);
                self.stats.loaded += 1;
                Some(Completion::Ready(segment))
            }
            Err(error) => {
                record.state = LoadState::Failed(error.to_string());
                self.stats.failed += 1;
                Some(Completion::Failed { segment, error })
            }
        }
    }

    /// Wait for the next task outcome. Cancel safe.
    pub async fn next_outcome(&mut self) -> Option<LoadOutcome> {
        self.outcome_rx.recv().await
    }

    /// Apply every outcome that has already arrived (non-blocking)
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(completion) = self.complete(outcome) {
                completions.push(completion);
            }
        }
        completions
    }

    pub fn state(&self, segment: SegmentId) -> Option<&LoadState> {
        self.records.get(&segment).map(|r| &r.state)
    }

    /// Decoded payload of a loaded segment
    pub fn payload(&self, segment: SegmentId) -> Option<&SplatPayload> {
        self.records.get(&segment).and_then(|r| r.payload.as_ref())
    }

    pub fn is_loading(&self, segment: SegmentId) -> bool {
        self.state(segment) == Some(&LoadState::Loading)
    }

    /// Number of loads still in flight
    pub fn in_flight(&self) -> usize {
        self.records.values().filter(|r| r.state == LoadState::Loading).count()
    }

    /// Segments with a decoded payload, ascending
    pub fn loaded_segments(&self) -> Vec<SegmentId> {
        let mut ids: Vec<_> = self
            .records
            .iter()
            .filter(|(_, r)| r.state == LoadState::Loaded)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Heap bytes held by decoded payloads
    pub fn payload_bytes(&self) -> usize {
        self.records
            .values()
            .filter_map(|r| r.payload.as_ref())
            .map(SplatPayload::memory_bytes)
            .sum()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn table(&self) -> &Arc<SegmentTable> {
        &self.table
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Abort every in-flight load and clear all records
    pub fn shutdown(&mut self) {
        for (_, record) in self.records.drain() {
            if let Some(task) = record.task {
                task.abort();
            }
        }
    }
}

impl<S: PayloadSource> Drop for LoadPipeline<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Aborts the inner fetch task when the owning load task is aborted.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn fetch_and_decode<S: PayloadSource>(source: &S, file: &str) -> Result<SplatPayload> {
    let bytes = source.fetch(file).await?;
    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| Error::Runtime(format!("decode task failed: {}", e)))?
}

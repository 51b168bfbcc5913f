//! Serialized streaming event loop
//!
//! Position updates and load completions both change streaming state. The
//! [`Streamer`] funnels them through one transition function,
//! [`Streamer::handle`], so the resident set and the load records always
//! have a single writer no matter how events are delivered.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::{Error, Result};
use crate::scene::SceneSink;
use crate::segment::{SegmentId, SegmentTable};
use crate::streaming::pipeline::{Completion, Eviction, LoadOutcome, LoadPipeline, PipelineStats};
use crate::streaming::source::PayloadSource;
use crate::streaming::window::{StreamingWindow, WindowUpdate};
use crate::streaming::StreamingConfig;

/// Input to the streaming state machine
#[derive(Debug)]
pub enum StreamEvent {
    /// New travel position, in meters
    Position(f32),
    /// A load task finished
    LoadFinished(LoadOutcome),
}

/// Statistics from streaming operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Position updates handled
    pub positions: u64,
    /// Positions that resolved to no segment
    pub off_track: u64,
    /// Active segment changes
    pub switches: u64,
    pub pipeline: PipelineStats,
}

/// Drives the window and the load pipeline and reports to a scene sink.
pub struct Streamer<S: PayloadSource, K: SceneSink> {
    table: Arc<SegmentTable>,
    window: StreamingWindow,
    pipeline: LoadPipeline<S>,
    sink: K,
    position: Option<f32>,
    stats: StreamingStats,
}

impl<S: PayloadSource, K: SceneSink> Streamer<S, K> {
    /// Create a streamer on the current tokio runtime.
    pub fn new(table: Arc<SegmentTable>, source: Arc<S>, sink: K, config: &StreamingConfig) -> Result<Self> {
        config.validate()?;

        let window = StreamingWindow::new(Arc::clone(&table), config);
        let pipeline = LoadPipeline::with_current_runtime(Arc::clone(&table), source, config.max_concurrent_loads)?;

        Ok(Self {
            table,
            window,
            pipeline,
            sink,
            position: None,
            stats: StreamingStats::default(),
        })
    }

    /// Apply one event.
    pub fn handle(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Position(position) => {
                self.update_position(position);
            }
            StreamEvent::LoadFinished(outcome) => {
                if let Some(completion) = self.pipeline.complete(outcome) {
                    self.dispatch(completion);
                }
            }
        }
    }

    /// Move to a new travel position.
    ///
    /// Returns the window delta, or `None` if the position was off track.
    pub fn update_position(&mut self, position: f32) -> Option<WindowUpdate> {
        self.stats.positions += 1;

        let update = match self.window.update(position) {
            Ok(update) => update,
            Err(Error::NotFound { .. }) => {
                self.stats.off_track += 1;
                log::debug!("Position {:.2}m is off track, keeping segment {:?}", position, self.window.active());
                return None;
            }
            Err(e) => {
                log::warn!("Window update failed at {:.2}m: {}", position, e);
                return None;
            }
        };

        self.position = Some(position);

        if update.switched() {
            self.stats.switches += 1;
            if let Ok(segment) = self.table.segment(update.active) {
                self.sink.segment_switched(update.previous, segment);
            }
        }

        for &id in &update.to_evict {
            log::info!("Unloading segment {}", id);
            match self.pipeline.evict(id) {
                // A failed segment may hold a placeholder in the scene.
                Eviction::Disposed | Eviction::Cleared => self.sink.segment_disposed(id),
                Eviction::Cancelled => log::debug!("Abandoned in-flight load of segment {}", id),
                Eviction::Absent => {}
            }
        }

        for &id in &update.to_load {
            if id != update.active {
                log::info!("Preloading segment {}", id);
            }
            if let Err(e) = self.pipeline.request(id) {
                log::warn!("Could not request segment {}: {}", id, e);
            }
        }

        self.sink.camera_moved(position, update.active);
        Some(update)
    }

    fn dispatch(&mut self, completion: Completion) {
        match completion {
            Completion::Ready(id) => {
                let (Ok(segment), Some(payload)) = (self.table.segment(id), self.pipeline.payload(id)) else {
                    return;
                };
                self.sink.segment_ready(segment, payload, segment.world_offset());
            }
            Completion::Failed { segment, error } => {
                if let Ok(segment) = self.table.segment(segment) {
                    self.sink.segment_failed(segment, &error);
                }
            }
        }
    }

    /// Apply completions that have already arrived, without waiting.
    ///
    /// Intended for frame loops that call this once per tick.
    pub fn pump(&mut self) -> usize {
        let completions = self.pipeline.poll();
        let count = completions.len();
        for completion in completions {
            self.dispatch(completion);
        }
        count
    }

    /// Wait until no load is in flight.
    pub async fn settle(&mut self) {
        while self.pipeline.in_flight() > 0 {
            match self.pipeline.next_outcome().await {
                Some(outcome) => self.handle(StreamEvent::LoadFinished(outcome)),
                None => break,
            }
        }
    }

    /// Process external events and load completions in arrival order until
    /// the event channel closes.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<StreamEvent>) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some(outcome) = self.pipeline.next_outcome() => {
                    self.handle(StreamEvent::LoadFinished(outcome));
                }
            }
        }

        log::debug!("Streaming event channel closed");
    }

    pub fn active(&self) -> Option<SegmentId> {
        self.window.active()
    }

    /// Last resolved travel position
    pub fn position(&self) -> Option<f32> {
        self.position
    }

    pub fn window(&self) -> &StreamingWindow {
        &self.window
    }

    pub fn pipeline(&self) -> &LoadPipeline<S> {
        &self.pipeline
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn table(&self) -> &Arc<SegmentTable> {
        &self.table
    }

    pub fn stats(&self) -> StreamingStats {
        StreamingStats {
            pipeline: self.pipeline.stats(),
            ..self.stats
        }
    }
}

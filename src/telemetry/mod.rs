//! Pipeline telemetry
//!
//! Collects per-phase timing and throughput events for the verbose
//! summary printed after a run.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    PhaseCompleted {
        phase: String,
        duration: Duration,
        items: usize,
    },
    QueryProcessed {
        duration: Duration,
    },
}

/// Aggregate statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub phases_completed: usize,
    pub items_processed: usize,
    pub queries_processed: usize,
}

/// Telemetry collector shared across pipeline components
#[derive(Clone)]
pub struct PipelineTelemetry {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl PipelineTelemetry {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = self.stats.lock().unwrap();
            match &event {
                TelemetryEvent::PhaseCompleted { items, .. } => {
                    stats.phases_completed += 1;
                    stats.items_processed += items;
                }
                TelemetryEvent::QueryProcessed { .. } => {
                    stats.queries_processed += 1;
                }
            }
        }

        let mut events = self.events.lock().unwrap();
        events.push(event);
    }

    /// Record a completed phase
    pub fn phase_completed(&self, phase: &str, duration: Duration, items: usize) {
        self.record(TelemetryEvent::PhaseCompleted {
            phase: phase.to_string(),
            duration,
            items,
        });
    }

    /// Get current statistics
    pub fn stats(&self) -> TelemetryStats {
        self.stats.lock().unwrap().clone()
    }

    /// Elapsed time since the collector was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of recorded events
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Formatted per-phase summary for verbose output
    pub fn summary(&self) -> String {
        let events = self.events.lock().unwrap();
        let mut lines = Vec::new();

        for event in events.iter() {
            match event {
                TelemetryEvent::PhaseCompleted {
                    phase,
                    duration,
                    items,
                } => {
                    lines.push(format!(
                        "  {phase}: {items} items in {:.2}s",
                        duration.as_secs_f64()
                    ));
                }
                TelemetryEvent::QueryProcessed { duration } => {
                    lines.push(format!(
                        "  query answered in {:.2}s",
                        duration.as_secs_f64()
                    ));
                }
            }
        }

        lines.push(format!(
            "  total elapsed: {:.2}s",
            self.start_time.elapsed().as_secs_f64()
        ));
        lines.join("\n")
    }
}

impl Default for PipelineTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

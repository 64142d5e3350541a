use mergeguard_frame::{Provenance, Table};

use crate::error::MergeError;
use crate::model::{MergeStats, ProvenanceCounts};

/// Receives diagnostics produced while a merge runs.
pub trait ReportSink {
    /// Free-form text, e.g. the caller's message.
    fn message(&mut self, text: &str);
    /// Summary for one merge: frequency table, keys, row counts, timing.
    fn stats(&mut self, stats: &MergeStats);
    /// Example rows violating the declared provenance set.
    fn violations(&mut self, examples: &Table);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn message(&mut self, _text: &str) {}
    fn stats(&mut self, _stats: &MergeStats) {}
    fn violations(&mut self, _examples: &Table) {}
}

/// Forwards reports to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn message(&mut self, text: &str) {
        log::info!("{text}");
    }

    fn stats(&mut self, stats: &MergeStats) {
        log::info!(
            "merge statistics ({} {}) on {:?}/{:?}: left_only={} right_only={} both={}; rows l={} r={} n={}; {:.3}s",
            stats.how,
            stats.mergetype,
            stats.left_keys,
            stats.right_keys,
            stats.counts.left_only,
            stats.counts.right_only,
            stats.counts.both,
            stats.left_rows,
            stats.right_rows,
            stats.result_rows,
            stats.elapsed.as_secs_f64(),
        );
    }

    fn violations(&mut self, examples: &Table) {
        log::warn!("{} example row(s) violating the provenance set", examples.len());
        for row in examples.rows() {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            log::warn!("  {}", cells.join(" | "));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Message(String),
    Stats(MergeStats),
    Violations(Table),
}

/// Records every event in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<ReportEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_stats(&self) -> Vec<&MergeStats> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Stats(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn recorded_violations(&self) -> Option<&Table> {
        self.events.iter().find_map(|e| match e {
            ReportEvent::Violations(t) => Some(t),
            _ => None,
        })
    }

    pub fn messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ReportSink for CollectingSink {
    fn message(&mut self, text: &str) {
        self.events.push(ReportEvent::Message(text.to_string()));
    }

    fn stats(&mut self, stats: &MergeStats) {
        self.events.push(ReportEvent::Stats(stats.clone()));
    }

    fn violations(&mut self, examples: &Table) {
        self.events.push(ReportEvent::Violations(examples.clone()));
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn message(&mut self, text: &str) {
        (**self).message(text);
    }

    fn stats(&mut self, stats: &MergeStats) {
        (**self).stats(stats);
    }

    fn violations(&mut self, examples: &Table) {
        (**self).violations(examples);
    }
}

/// Fail when matches are required and no row came from both tables.
pub fn check_intersection(
    counts: &ProvenanceCounts,
    matches_required: bool,
    left_keys: &[String],
    right_keys: &[String],
) -> Result<(), MergeError> {
    if matches_required && counts.get(Provenance::Both) == 0 {
        return Err(MergeError::EmptyIntersection {
            left_keys: left_keys.to_vec(),
            right_keys: right_keys.to_vec(),
        });
    }
    Ok(())
}

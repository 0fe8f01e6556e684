//! Exploration entry points.
//!
//! A test hands its program to [`trace`] (or a sibling), the harness
//! runs the DPOR search to exhaustion and returns a [`Report`]. The
//! program is re-executed from the top once per explored schedule, so it
//! must be deterministic apart from the scheduling the checker controls.

use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::explorer::Explorer;
use crate::io::{format_from_extension, write_trace_set_to_path, TraceIoError};
use crate::trace::TraceTracker;

/// Environment variable naming a file to dump every explored
/// interleaving to. Setting it implicitly enables recording.
pub const TRACE_FILE_ENV: &str = "dscheck_trace_file";

/// Knobs for one exploration.
#[derive(Debug, Clone, Default)]
pub struct TraceConfig {
    /// Collect every completed interleaving (implied by `trace_file`).
    pub record_traces: bool,

    /// Where to dump the collected interleaving set, encoded per
    /// [`format_from_extension`]. Defaults to the `dscheck_trace_file`
    /// environment variable when unset.
    pub trace_file: Option<PathBuf>,

    /// Stop after this many runs; the report is then marked incomplete.
    pub max_runs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    #[error("failed writing to the interleavings channel: {0}")]
    Channel(#[from] std::io::Error),

    #[error(transparent)]
    TraceIo(#[from] TraceIoError),
}

/// Summary of one exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Fully finished executions explored.
    pub interleavings: u64,
    /// Runs performed (one state cell each).
    pub states: u64,
    /// False when `max_runs` stopped the search early.
    pub completed: bool,
}

/// Explore every reduction-distinct interleaving of `program`.
pub fn trace(program: impl Fn()) -> Result<Report, ExploreError> {
    trace_with(None, TraceConfig::default(), program)
}

/// Like [`trace`], also printing each interleaving and a final
/// `explored N interleavings and M states` summary to `out`.
pub fn trace_to(out: &mut dyn Write, program: impl Fn()) -> Result<Report, ExploreError> {
    trace_with(Some(out), TraceConfig::default(), program)
}

/// Full-control entry point.
pub fn trace_with(
    mut out: Option<&mut dyn Write>,
    config: TraceConfig,
    program: impl Fn(),
) -> Result<Report, ExploreError> {
    let trace_file = config
        .trace_file
        .clone()
        .or_else(|| std::env::var_os(TRACE_FILE_ENV).map(PathBuf::from));
    let record = config.record_traces || trace_file.is_some();
    let mut tracker = if record { Some(TraceTracker::new()) } else { None };

    let (num_interleavings, num_runs, truncated) = {
        let out_reborrow: Option<&mut dyn Write> = match out.as_mut() {
            Some(w) => Some(&mut **w),
            None => None,
        };
        let mut explorer = Explorer::new(&program, out_reborrow, tracker.as_mut(), config.max_runs);
        explorer.run()?;
        (
            explorer.num_interleavings,
            explorer.num_runs,
            explorer.truncated,
        )
    };

    let report = Report {
        interleavings: num_interleavings,
        states: num_runs,
        completed: !truncated,
    };

    if let Some(out) = out {
        writeln!(
            out,
            "explored {} interleavings and {} states",
            report.interleavings, report.states
        )?;
    }
    info!(
        interleavings = report.interleavings,
        states = report.states,
        completed = report.completed,
        "exploration finished"
    );

    if let (Some(tracker), Some(path)) = (tracker, trace_file) {
        let format = format_from_extension(&path);
        write_trace_set_to_path(&path, &tracker.into_set(), format)?;
    }

    Ok(report)
}

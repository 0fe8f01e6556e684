//! Reading and writing recorded interleaving sets.

use std::fs;
use std::path::Path;

use crate::trace::TraceSet;

/// On-disk encoding of a [`TraceSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    Json,
    Postcard,
}

/// Choose a format from a file extension (`.json` is the default).
pub fn format_from_extension(path: impl AsRef<Path>) -> TraceFormat {
    match path.as_ref().extension().and_then(|s| s.to_str()) {
        Some("bin") | Some("postcard") => TraceFormat::Postcard,
        _ => TraceFormat::Json,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceIoError {
    #[error("failed reading interleaving file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed encoding or decoding json interleavings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed encoding postcard interleavings: {0}")]
    PostcardEncode(#[source] postcard::Error),

    #[error("failed decoding postcard interleavings: {0}")]
    PostcardDecode(#[source] postcard::Error),

    #[error("failed writing interleaving file: {0}")]
    Write(#[source] std::io::Error),
}

pub fn write_trace_set_to_path(
    path: impl AsRef<Path>,
    set: &TraceSet,
    format: TraceFormat,
) -> Result<(), TraceIoError> {
    let bytes = match format {
        TraceFormat::Json => serde_json::to_vec_pretty(set)?,
        TraceFormat::Postcard => {
            postcard::to_stdvec(set).map_err(TraceIoError::PostcardEncode)?
        }
    };

    fs::write(path, bytes).map_err(TraceIoError::Write)
}

pub fn read_trace_set_from_path(
    path: impl AsRef<Path>,
    format: TraceFormat,
) -> Result<TraceSet, TraceIoError> {
    let bytes = fs::read(path)?;

    let set = match format {
        TraceFormat::Json => serde_json::from_slice(&bytes)?,
        TraceFormat::Postcard => {
            postcard::from_bytes(&bytes).map_err(TraceIoError::PostcardDecode)?
        }
    };

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceTracker;
    use tangle_core::{OpKind, ProcessId, Step};

    fn sample_set() -> TraceSet {
        let mut tracker = TraceTracker::new();
        tracker.add(&[Step {
            process: ProcessId(0),
            op: OpKind::Start,
            target: None,
        }]);
        tracker.into_set()
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("tangle-io-{}-{name}", std::process::id()));
        path
    }

    #[test]
    fn json_round_trip_preserves_the_set() {
        let path = scratch_path("set.json");
        let set = sample_set();
        write_trace_set_to_path(&path, &set, TraceFormat::Json).unwrap();
        let back = read_trace_set_from_path(&path, TraceFormat::Json).unwrap();
        assert_eq!(set, back);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn postcard_round_trip_preserves_the_set() {
        let path = scratch_path("set.bin");
        let set = sample_set();
        write_trace_set_to_path(&path, &set, TraceFormat::Postcard).unwrap();
        let back = read_trace_set_from_path(&path, TraceFormat::Postcard).unwrap();
        assert_eq!(set, back);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn extension_picks_the_format() {
        assert_eq!(format_from_extension("t.json"), TraceFormat::Json);
        assert_eq!(format_from_extension("t.postcard"), TraceFormat::Postcard);
        assert_eq!(format_from_extension("t.bin"), TraceFormat::Postcard);
        assert_eq!(format_from_extension("t"), TraceFormat::Json);
    }
}

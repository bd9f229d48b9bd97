use std::path::PathBuf;
use thiserror::Error;

/// Per-file failures of the mapper. A `MapError` is fatal for the file that
/// produced it but never for the run; the caller records it and moves on to
/// the next country.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("no data header line detected in {}", path.display())]
    NoHeader { path: PathBuf },

    #[error("no facility type column detected in header of {}", path.display())]
    NoFacilityColumn { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

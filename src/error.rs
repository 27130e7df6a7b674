//! Engine error type.

use std::error::Error;
use std::fmt;

/// Failure modes of the path-planning pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathsError {
    /// Start or target configuration is out of limits or inside an obstacle.
    InvalidInput,
    /// No roadmap path exists between the retraction points.
    Unreachable,
    /// No safe Voronoi vertex is reachable from the start or target.
    RetractionFailed,
    /// The selected Voronoi backend is not built in.
    BackendUnavailable,
    /// A pipeline stage failed (backend error, resource exhaustion).
    Failed(String),
    /// A progress handler aborted the calculation.
    Cancelled,
}

impl fmt::Display for PathsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathsError::InvalidInput => {
                write!(f, "start or target configuration is invalid")
            }
            PathsError::Unreachable => {
                write!(f, "no path between the retraction points")
            }
            PathsError::RetractionFailed => {
                write!(f, "no safe roadmap vertex near the start or target")
            }
            PathsError::BackendUnavailable => {
                write!(f, "the selected voronoi backend is not built in")
            }
            PathsError::Failed(msg) => {
                write!(f, "calculation failed: {msg}")
            }
            PathsError::Cancelled => {
                write!(f, "the calculation was cancelled")
            }
        }
    }
}

impl Error for PathsError {}

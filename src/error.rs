//! Errors surfaced by the planners and the path worker.
//!
//! Failing to find a route is not an error: searches return the degenerate `[start]` path
//! instead (see [is_no_route](crate::is_no_route)).

use grid_util::Point;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("search start {point:?} is outside of the map")]
    StartOutOfBounds { point: Point },

    #[error("search destination {point:?} is outside of the map")]
    DestOutOfBounds { point: Point },

    #[error("path worker has shut down")]
    WorkerClosed,
}

pub type PlanResult<T> = Result<T, PlanError>;

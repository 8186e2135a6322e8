//! Error types for groupio

use thiserror::Error;

/// Result type for coordination operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for coordination operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested number of groups does not fit the communicator
    #[error("Invalid group count: {num_groups} groups requested for {comm_size} ranks")]
    Configuration {
        /// Requested number of groups
        num_groups: i32,
        /// Size of the communicator
        comm_size: i32,
    },

    /// A rank outside the communicator
    #[error("Invalid rank: {0}")]
    InvalidRank(i32),

    /// A point-to-point message in the ring could not be delivered or received
    #[error("Transport error with rank {peer} (code {code})")]
    Transport {
        /// The rank on the other side of the failed operation
        peer: i32,
        /// Transport error code
        code: i32,
    },

    /// The predecessor in the ring handed off a latched error
    #[error("Rank {predecessor} handed off an error (code {code})")]
    UpstreamFailure {
        /// Rank that sent the baton
        predecessor: i32,
        /// Transport code carried by the baton
        code: i32,
    },

    /// The handle was closed but the baton could not be passed on
    #[error("Baton hand-off failed after close returned {close_status} (code {code})")]
    HandOff {
        /// Status returned by the driver's close callback
        close_status: i32,
        /// Transport error code of the failed send
        code: i32,
    },

    /// A baton operation was called out of order
    #[error("Baton is {found}, expected {expected}")]
    InvalidState {
        /// State required by the operation
        expected: &'static str,
        /// State the baton was in
        found: &'static str,
    },

    /// Splitting the parent context did not produce a group context
    #[error("Communicator split failed for color {color}")]
    SplitFailed {
        /// Color passed to the split
        color: i32,
    },

    /// A blocking operation did not complete within the configured timeout
    #[error("Operation timed out")]
    Timeout,

    /// Checkpoint routing could not remap a path
    #[error("Routing error: {0}")]
    Routing(String),

    /// A configuration document could not be parsed or written
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Non-zero integer code for this error.
    ///
    /// Used as the transport code latched into a baton and as the abort code
    /// passed to the parallel runtime.
    pub fn code(&self) -> i32 {
        match self {
            Error::Configuration { .. } => 1,
            Error::Transport { code, .. }
            | Error::UpstreamFailure { code, .. }
            | Error::HandOff { code, .. } => {
                if *code == 0 {
                    2
                } else {
                    *code
                }
            }
            Error::InvalidState { .. } | Error::InvalidRank(_) => 3,
            Error::SplitFailed { .. } => 4,
            Error::Timeout => 5,
            Error::Routing(_) => 6,
            Error::Config(_) => 7,
        }
    }
}

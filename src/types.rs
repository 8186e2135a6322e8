//! Types

mod error_state;
mod io_flags;
mod topology;

pub use error_state::{ErrorState, RingMessage};
pub use io_flags::{BatonConfig, IoFlags};
pub use topology::ProcessTopology;

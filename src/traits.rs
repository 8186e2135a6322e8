//! Traits

mod comm;
mod driver;
mod router;

pub use comm::Comm;
pub use driver::FileDriver;
pub use router::{NoRouting, PathRouter};

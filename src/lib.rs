//! Group partitioning and file access coordination for parallel I/O
//!
//! The ranks of a communicator are divided into groups, one group per file.
//! [`mif::Baton`] serialises the members of a group so that exactly one of
//! them has the group's file open at a time. [`msf::GroupContext`] gives each
//! group its own sub-context so that its members can access a shared file
//! collectively.
#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod error;
pub mod local;
pub mod mif;
#[cfg(feature = "mpi")]
mod mpi_comm;
pub mod msf;
pub mod partition;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use local::{LocalComm, LocalUniverse};
pub use mif::{Baton, BatonState};
pub use msf::GroupContext;

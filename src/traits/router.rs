//! Checkpoint routing
use crate::error::{Error, Result};

pub trait PathRouter {
    //! Redirects a file path to a different storage tier

    /// Remapped path for `path`
    fn route_file_path(&self, path: &str) -> Result<String>;
}

/// Router used when no checkpoint routing is available.
///
/// Always fails, so callers fall back to the original path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouting;

impl PathRouter for NoRouting {
    fn route_file_path(&self, path: &str) -> Result<String> {
        Err(Error::Routing(format!("no router for {path}")))
    }
}

impl<F: Fn(&str) -> Result<String>> PathRouter for F {
    fn route_file_path(&self, path: &str) -> Result<String> {
        self(path)
    }
}

//! I/O flags and coordinator configuration
#[cfg(feature = "serde")]
use crate::error::Error;
use crate::error::Result;

/// How a group's file is accessed during one operation
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IoFlags {
    /// Writing (the first member creates the file) or reading
    pub write: bool,
    /// Resolve file names through a checkpoint router before use
    #[cfg_attr(feature = "serde", serde(default))]
    pub checkpoint_routing: bool,
}

impl IoFlags {
    /// Flags for a write operation
    pub fn write() -> Self {
        Self {
            write: true,
            checkpoint_routing: false,
        }
    }

    /// Flags for a read operation
    pub fn read() -> Self {
        Self {
            write: false,
            checkpoint_routing: false,
        }
    }

    /// Enable checkpoint routing
    pub fn with_checkpoint_routing(mut self) -> Self {
        self.checkpoint_routing = true;
        self
    }
}

/// Arguments of a coordinator `init`.
///
/// Every rank taking part in an `init` must pass an identical configuration.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatonConfig {
    /// Number of files the communicator is divided over
    pub num_groups: i32,
    /// Message tag used for hand-offs. Must be unique among live batons
    pub tag: i32,
    /// Access mode
    pub flags: IoFlags,
}

impl BatonConfig {
    /// Create new
    pub fn new(num_groups: i32, tag: i32, flags: IoFlags) -> Self {
        Self {
            num_groups,
            tag,
            flags,
        }
    }

    /// Check that the configuration can be used on a communicator of the given size
    pub fn validate(&self, comm_size: i32) -> Result<()> {
        crate::partition::validate(comm_size, self.num_groups)
    }

    /// Parse a configuration from a RON string
    #[cfg(feature = "serde")]
    pub fn from_ron_str(s: &str) -> Result<Self> {
        ron::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Write the configuration as a RON string
    #[cfg(feature = "serde")]
    pub fn to_ron_string(&self) -> Result<String> {
        ron::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a configuration from a RON file
    #[cfg(feature = "serde")]
    pub fn import_from_ron(filename: &str) -> Result<Self> {
        let content = std::fs::read_to_string(filename)
            .map_err(|e| Error::Config(format!("{filename}: {e}")))?;
        Self::from_ron_str(&content)
    }
}

//! File drivers
use crate::types::IoFlags;

pub trait FileDriver {
    //! Callbacks that create, open and close a group's file.
    //!
    //! Any state the driver needs is carried by the implementor and passed
    //! through the coordinator untouched.

    /// Open file handle
    type Handle;

    /// Create a file. Only called by the first member of a group when writing.
    fn create(&mut self, filename: &str, namespace: &str) -> Option<Self::Handle>;

    /// Open an existing file
    fn open(&mut self, filename: &str, namespace: &str, flags: IoFlags) -> Option<Self::Handle>;

    /// Close a file, returning a driver status code
    fn close(&mut self, handle: Self::Handle) -> i32;
}

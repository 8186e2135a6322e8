//! Communication context
use crate::{
    error::{Error, Result},
    types::RingMessage,
};
use tracing::error;

pub trait Comm {
    //! A collective context: a set of ranks that can exchange point-to-point
    //! messages and take part in collective operations.

    /// Context produced by [`Comm::split`]
    type Sub: Comm;

    /// Rank of the calling process
    fn rank(&self) -> i32;

    /// Number of processes
    fn size(&self) -> i32;

    /// Send a hand-off message.
    ///
    /// Does not return until `dest` has matched the message with a receive.
    fn synchronous_send(&self, dest: i32, tag: i32, message: &RingMessage) -> Result<()>;

    /// Receive a hand-off message from `source`
    fn receive(&self, source: i32, tag: i32) -> Result<RingMessage>;

    /// Split into one context per `color`, ordering members by `key` and then
    /// by rank in this context. Collective.
    fn split(&self, color: i32, key: i32) -> Result<Self::Sub>;

    /// Gather one value from every rank, in rank order. Collective.
    fn all_gather(&self, value: i32) -> Result<Vec<i32>>;

    /// Release a context created by [`Comm::split`]
    fn release(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Abort every process of the job
    fn abort(&self, code: i32) -> !;

    /// Report a fatal error and abort the job
    fn die(&self, e: &Error) -> ! {
        error!(rank = self.rank(), error = %e, "fatal");
        self.abort(e.code())
    }
}

//! Multiple independent files
//!
//! Each group owns one file. A baton is passed along the members of a group
//! in increasing order of rank in group, and only the member holding the
//! baton has the file open. Groups run independently of each other.
//!
//! Every rank calls [`Baton::wait_for_baton`] and then
//! [`Baton::hand_off_baton`], also when waiting failed: the hand-off is what
//! carries a failure on to the rest of the ring.
use crate::{
    error::{Error, Result},
    partition,
    traits::{Comm, FileDriver, PathRouter},
    types::{BatonConfig, ErrorState, ProcessTopology},
};
use tracing::{debug, warn};

/// Progress of one rank through a baton operation
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BatonState {
    /// Waiting for the predecessor to hand the baton on
    Waiting,
    /// Holding the baton
    Holding,
    /// Waiting failed. The failure still has to be handed off
    Failed,
    /// The baton has been handed off
    Done,
}

impl BatonState {
    fn name(&self) -> &'static str {
        match self {
            BatonState::Waiting => "waiting",
            BatonState::Holding => "holding",
            BatonState::Failed => "failed",
            BatonState::Done => "done",
        }
    }
}

/// Exclusive access token for a group's file
pub struct Baton<'a, C: Comm, D: FileDriver> {
    comm: &'a C,
    config: BatonConfig,
    topology: ProcessTopology,
    driver: D,
    router: Option<Box<dyn PathRouter + 'a>>,
    error_state: ErrorState,
    state: BatonState,
}

impl<'a, C: Comm, D: FileDriver> Baton<'a, C, D> {
    /// Create a baton. Every rank of `comm` must call this with the same `config`.
    pub fn init(comm: &'a C, config: BatonConfig, driver: D) -> Result<Self> {
        let topology = partition::partition(comm.size(), config.num_groups, comm.rank())?;
        debug!(
            rank = topology.rank_in_comm,
            group = topology.group_id,
            rank_in_group = topology.rank_in_group,
            group_size = topology.effective_group_size,
            tag = config.tag,
            "baton initialised"
        );
        Ok(Self {
            comm,
            config,
            topology,
            driver,
            router: None,
            error_state: ErrorState::default(),
            state: BatonState::Waiting,
        })
    }

    /// Create a baton, aborting the whole communicator on failure
    pub fn init_or_die(comm: &'a C, config: BatonConfig, driver: D) -> Self {
        match Self::init(comm, config, driver) {
            Ok(baton) => baton,
            Err(e) => comm.die(&e),
        }
    }

    /// Resolve file names through `router` when checkpoint routing is enabled
    pub fn with_router<R: PathRouter + 'a>(mut self, router: R) -> Self {
        self.router = Some(Box::new(router));
        self
    }

    /// Topology of this rank
    pub fn topology(&self) -> &ProcessTopology {
        &self.topology
    }

    /// Configuration the baton was created with
    pub fn config(&self) -> &BatonConfig {
        &self.config
    }

    /// Latched error state
    pub fn error_state(&self) -> ErrorState {
        self.error_state
    }

    /// Current state
    pub fn state(&self) -> BatonState {
        self.state
    }

    /// The driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Group of any rank of the communicator.
    ///
    /// # Panics
    ///
    /// Panics if `rank_in_comm` is not a rank of the communicator.
    pub fn rank_of_group(&self, rank_in_comm: i32) -> i32 {
        partition::rank_of_group(self.topology.comm_size, self.topology.num_groups, rank_in_comm)
    }

    /// Position of any rank of the communicator within its group.
    ///
    /// # Panics
    ///
    /// Panics if `rank_in_comm` is not a rank of the communicator.
    pub fn rank_in_group(&self, rank_in_comm: i32) -> i32 {
        partition::rank_in_group(self.topology.comm_size, self.topology.num_groups, rank_in_comm)
    }

    /// Wait for the predecessor to hand over the baton, then create or open the file.
    ///
    /// Returns `Ok(None)` if the driver did not return a handle. If the
    /// predecessor reports an error or the receive fails, the error is latched
    /// and no driver callback is made.
    pub fn wait_for_baton(&mut self, filename: &str, namespace: &str) -> Result<Option<D::Handle>> {
        if self.state != BatonState::Waiting {
            return Err(Error::InvalidState {
                expected: BatonState::Waiting.name(),
                found: self.state.name(),
            });
        }

        if let Some(predecessor) = self.topology.predecessor_rank() {
            let upstream = match self.comm.receive(predecessor, self.config.tag) {
                Ok(message) => ErrorState::from_message(message),
                Err(e) => {
                    warn!(
                        rank = self.topology.rank_in_comm,
                        predecessor,
                        error = %e,
                        "baton receive failed"
                    );
                    self.error_state.latch(&e);
                    self.state = BatonState::Failed;
                    return Err(e);
                }
            };
            if upstream.is_error() {
                warn!(
                    rank = self.topology.rank_in_comm,
                    predecessor,
                    code = upstream.transport_code,
                    "received baton carrying an error"
                );
                self.error_state.merge(upstream);
                self.state = BatonState::Failed;
                return Err(Error::UpstreamFailure {
                    predecessor,
                    code: upstream.transport_code,
                });
            }
        }

        self.state = BatonState::Holding;
        let filename = self.resolve(filename);
        let handle = if self.topology.is_first_in_group() && self.config.flags.write {
            debug!(rank = self.topology.rank_in_comm, %filename, "creating");
            self.driver.create(&filename, namespace)
        } else {
            debug!(rank = self.topology.rank_in_comm, %filename, "opening");
            self.driver.open(&filename, namespace, self.config.flags)
        };
        Ok(handle)
    }

    /// Close the file and pass the baton to the successor.
    ///
    /// Returns the status of the driver's close. A failed send is latched and
    /// reported as [`Error::HandOff`]; it is not retried.
    pub fn hand_off_baton(&mut self, handle: Option<D::Handle>) -> Result<i32> {
        match self.state {
            BatonState::Holding | BatonState::Failed => {}
            other => {
                return Err(Error::InvalidState {
                    expected: BatonState::Holding.name(),
                    found: other.name(),
                })
            }
        }

        let close_status = handle.map_or(0, |h| self.driver.close(h));
        self.state = BatonState::Done;

        if let Some(successor) = self.topology.successor_rank() {
            let message = self.error_state.to_message();
            if let Err(e) = self.comm.synchronous_send(successor, self.config.tag, &message) {
                warn!(
                    rank = self.topology.rank_in_comm,
                    successor,
                    error = %e,
                    "baton hand-off failed"
                );
                self.error_state.latch(&e);
                return Err(Error::HandOff {
                    close_status,
                    code: e.code(),
                });
            }
            debug!(rank = self.topology.rank_in_comm, successor, "baton handed off");
        }
        Ok(close_status)
    }

    /// Wait for the baton, run `f` on the open handle and hand the baton off.
    ///
    /// Returns the output of `f` and the close status, or `None` if the driver
    /// did not return a handle.
    pub fn with_baton<T, F: FnOnce(&mut D::Handle) -> T>(
        &mut self,
        filename: &str,
        namespace: &str,
        f: F,
    ) -> Result<Option<(T, i32)>> {
        match self.wait_for_baton(filename, namespace) {
            Ok(Some(mut handle)) => {
                let output = f(&mut handle);
                let status = self.hand_off_baton(Some(handle))?;
                Ok(Some((output, status)))
            }
            Ok(None) => {
                self.hand_off_baton(None)?;
                Ok(None)
            }
            Err(e) => {
                if let Err(handoff) = self.hand_off_baton(None) {
                    warn!(error = %handoff, "could not forward baton error");
                }
                Err(e)
            }
        }
    }

    /// Release the baton, returning the driver
    pub fn finish(self) -> D {
        if self.state != BatonState::Done {
            warn!(
                rank = self.topology.rank_in_comm,
                state = self.state.name(),
                "baton finished before it was handed off"
            );
        }
        self.driver
    }

    fn resolve(&self, filename: &str) -> String {
        if !self.config.flags.checkpoint_routing {
            return filename.to_string();
        }
        let routed = match &self.router {
            Some(router) => router.route_file_path(filename),
            None => crate::traits::NoRouting.route_file_path(filename),
        };
        routed.unwrap_or_else(|e| {
            debug!(%filename, error = %e, "checkpoint routing failed, using original path");
            filename.to_string()
        })
    }
}

//! Multiple shared files
//!
//! Each group owns one file that all of its members access together. Instead
//! of a baton, every group gets its own sub-context, split from the parent
//! and ordered by rank in group, for the driver to issue collective I/O on.
use crate::{
    error::{Error, Result},
    partition,
    traits::Comm,
    types::ProcessTopology,
};
use tracing::debug;

/// Marks "no value" in the root discovery all-gather
const NO_RANK: i32 = -1;

/// A group's collective context
pub struct GroupContext<C: Comm> {
    topology: ProcessTopology,
    group_comm: C::Sub,
    member_global_ranks: Vec<i32>,
    root_global_rank: i32,
}

impl<C: Comm> GroupContext<C> {
    /// Create the group contexts. Collective over every rank of `comm`.
    pub fn init(comm: &C, num_groups: i32) -> Result<Self> {
        let topology = partition::partition(comm.size(), num_groups, comm.rank())?;

        let group_comm = comm.split(topology.group_id, topology.rank_in_group)?;
        if group_comm.rank() != topology.rank_in_group
            || group_comm.size() != topology.effective_group_size
        {
            return Err(Error::SplitFailed {
                color: topology.group_id,
            });
        }

        let member_global_ranks = group_comm.all_gather(topology.rank_in_comm)?;
        let root_global_rank = group_comm
            .all_gather(if topology.is_first_in_group() {
                topology.rank_in_comm
            } else {
                NO_RANK
            })?
            .into_iter()
            .find(|r| *r != NO_RANK)
            .ok_or(Error::SplitFailed {
                color: topology.group_id,
            })?;

        debug!(
            rank = topology.rank_in_comm,
            group = topology.group_id,
            rank_in_group = topology.rank_in_group,
            root = root_global_rank,
            "group context initialised"
        );
        Ok(Self {
            topology,
            group_comm,
            member_global_ranks,
            root_global_rank,
        })
    }

    /// Create the group contexts, aborting the job if the group count is invalid
    pub fn init_or_die(comm: &C, num_groups: i32) -> Self {
        match Self::init(comm, num_groups) {
            Ok(context) => context,
            Err(e) => comm.die(&e),
        }
    }

    /// Topology of this rank
    pub fn topology(&self) -> &ProcessTopology {
        &self.topology
    }

    /// Number of members in this rank's group
    pub fn size_of_group(&self) -> i32 {
        self.topology.effective_group_size
    }

    /// Parent rank of the first member of this rank's group
    pub fn root_of_group(&self) -> i32 {
        self.root_global_rank
    }

    /// The group's context
    pub fn comm_of_group(&self) -> &C::Sub {
        &self.group_comm
    }

    /// Parent ranks of the group's members, in order of rank in group
    pub fn member_global_ranks(&self) -> &[i32] {
        &self.member_global_ranks
    }

    /// Group of any rank of the parent context
    pub fn rank_of_group(&self, rank_in_comm: i32) -> i32 {
        partition::rank_of_group(self.topology.comm_size, self.topology.num_groups, rank_in_comm)
    }

    /// Position of any rank of the parent context within its group
    pub fn rank_in_group(&self, rank_in_comm: i32) -> i32 {
        partition::rank_in_group(self.topology.comm_size, self.topology.num_groups, rank_in_comm)
    }

    /// Release the group's context
    pub fn finish(self) -> Result<()> {
        debug!(
            rank = self.topology.rank_in_comm,
            group = self.topology.group_id,
            "releasing group context"
        );
        self.group_comm.release()
    }
}

//! Process topology

/// The position of one rank in the group layout of a communicator.
///
/// Computed once per coordinator `init` by [`crate::partition::partition`]
/// and never mutated afterwards.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ProcessTopology {
    /// Number of ranks in the communicator
    pub comm_size: i32,
    /// Rank of this process in the communicator
    pub rank_in_comm: i32,
    /// Number of groups the communicator is divided into
    pub num_groups: i32,
    /// Size of a group without an extra member
    pub group_size: i32,
    /// Number of leading groups that hold `group_size + 1` members
    pub num_groups_with_extra_member: i32,
    /// First rank that belongs to a group of size `group_size`
    pub comm_split: i32,
    /// Group this rank belongs to
    pub group_id: i32,
    /// Position of this rank in its group
    pub rank_in_group: i32,
    /// Number of members in this rank's group
    pub effective_group_size: i32,
}

impl ProcessTopology {
    /// Is this rank the first member of its group?
    pub fn is_first_in_group(&self) -> bool {
        self.rank_in_group == 0
    }

    /// Is this rank the last member of its group?
    pub fn is_last_in_group(&self) -> bool {
        self.rank_in_group == self.effective_group_size - 1
    }

    /// Communicator rank of the member before this one in the ring
    pub fn predecessor_rank(&self) -> Option<i32> {
        if self.is_first_in_group() {
            None
        } else {
            Some(self.rank_in_comm - 1)
        }
    }

    /// Communicator rank of the member after this one in the ring
    pub fn successor_rank(&self) -> Option<i32> {
        if self.is_last_in_group() {
            None
        } else {
            Some(self.rank_in_comm + 1)
        }
    }

    /// Communicator rank of the first member of this rank's group
    pub fn group_root_rank(&self) -> i32 {
        self.rank_in_comm - self.rank_in_group
    }
}

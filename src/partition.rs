//! Group partitioning
//!
//! A communicator of `comm_size` ranks is divided into `num_groups` groups of
//! contiguous ranks. The first `comm_size % num_groups` groups get one extra
//! member. Every function here is a closed-form computation that can be
//! evaluated for any rank, so the layout of another rank is known without
//! asking it.
use crate::{
    error::{Error, Result},
    types::ProcessTopology,
};
use num::integer::div_rem;

/// Sizes shared by every rank of a partitioned communicator
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct GroupLayout {
    /// Size of a group without an extra member
    pub group_size: i32,
    /// Number of leading groups with `group_size + 1` members
    pub num_groups_with_extra_member: i32,
    /// First rank of the first group with `group_size` members
    pub comm_split: i32,
}

impl GroupLayout {
    /// Compute the layout.
    ///
    /// # Panics
    ///
    /// Panics if `num_groups` is not in `1..=comm_size`.
    pub fn new(comm_size: i32, num_groups: i32) -> Self {
        assert!(
            num_groups >= 1 && num_groups <= comm_size,
            "{num_groups} groups requested for {comm_size} ranks"
        );
        let (group_size, num_groups_with_extra_member) = div_rem(comm_size, num_groups);
        Self {
            group_size,
            num_groups_with_extra_member,
            comm_split: num_groups_with_extra_member * (group_size + 1),
        }
    }

    /// Group of a rank and its position in that group
    pub fn locate(&self, rank_in_comm: i32) -> (i32, i32) {
        if rank_in_comm < self.comm_split {
            div_rem(rank_in_comm, self.group_size + 1)
        } else {
            let (group, rank_in_group) = div_rem(rank_in_comm - self.comm_split, self.group_size);
            (self.num_groups_with_extra_member + group, rank_in_group)
        }
    }

    /// Number of members in a group
    pub fn size_of_group(&self, group_id: i32) -> i32 {
        if group_id < self.num_groups_with_extra_member {
            self.group_size + 1
        } else {
            self.group_size
        }
    }

    /// Rank of the first member of a group
    pub fn first_rank_of_group(&self, group_id: i32) -> i32 {
        if group_id < self.num_groups_with_extra_member {
            group_id * (self.group_size + 1)
        } else {
            self.comm_split + (group_id - self.num_groups_with_extra_member) * self.group_size
        }
    }
}

/// Check that `num_groups` is in `1..=comm_size`
pub fn validate(comm_size: i32, num_groups: i32) -> Result<()> {
    if num_groups < 1 || num_groups > comm_size {
        Err(Error::Configuration {
            num_groups,
            comm_size,
        })
    } else {
        Ok(())
    }
}

/// Compute the topology of a rank
pub fn partition(comm_size: i32, num_groups: i32, rank_in_comm: i32) -> Result<ProcessTopology> {
    validate(comm_size, num_groups)?;
    if rank_in_comm < 0 || rank_in_comm >= comm_size {
        return Err(Error::InvalidRank(rank_in_comm));
    }
    let layout = GroupLayout::new(comm_size, num_groups);
    let (group_id, rank_in_group) = layout.locate(rank_in_comm);
    Ok(ProcessTopology {
        comm_size,
        rank_in_comm,
        num_groups,
        group_size: layout.group_size,
        num_groups_with_extra_member: layout.num_groups_with_extra_member,
        comm_split: layout.comm_split,
        group_id,
        rank_in_group,
        effective_group_size: layout.size_of_group(group_id),
    })
}

// Layout lookup for one rank, shared by the any-rank queries
fn locate_checked(comm_size: i32, num_groups: i32, rank_in_comm: i32) -> (i32, i32) {
    assert!(
        (0..comm_size).contains(&rank_in_comm),
        "rank {rank_in_comm} is not in a communicator of {comm_size} ranks"
    );
    GroupLayout::new(comm_size, num_groups).locate(rank_in_comm)
}

/// Group that `rank_in_comm` belongs to.
///
/// # Panics
///
/// Panics if `num_groups` is not in `1..=comm_size` or `rank_in_comm` is not
/// in `0..comm_size`.
pub fn rank_of_group(comm_size: i32, num_groups: i32, rank_in_comm: i32) -> i32 {
    locate_checked(comm_size, num_groups, rank_in_comm).0
}

/// Position of `rank_in_comm` within its group.
///
/// # Panics
///
/// Panics if `num_groups` is not in `1..=comm_size` or `rank_in_comm` is not
/// in `0..comm_size`.
pub fn rank_in_group(comm_size: i32, num_groups: i32, rank_in_comm: i32) -> i32 {
    locate_checked(comm_size, num_groups, rank_in_comm).1
}

/// Per-group file name: `{base}_{group_id:05}.{extension}`
pub fn group_file_name(base: &str, group_id: i32, extension: &str) -> String {
    format!("{base}_{group_id:05}.{extension}")
}

/// Namespace hint isolating one rank's objects in a shared file
pub fn domain_namespace(rank_in_comm: i32) -> String {
    format!("domain_{rank_in_comm:07}")
}

#[cfg(test)]
mod test {
    use super::*;

    fn group_counts(comm_size: i32, num_groups: i32) -> Vec<i32> {
        let mut counts = vec![0; num_groups as usize];
        for rank in 0..comm_size {
            counts[rank_of_group(comm_size, num_groups, rank) as usize] += 1;
        }
        counts
    }

    #[test]
    fn test_ten_ranks_three_groups() {
        let layout = GroupLayout::new(10, 3);
        assert_eq!(layout.group_size, 3);
        assert_eq!(layout.num_groups_with_extra_member, 1);
        assert_eq!(layout.comm_split, 4);

        let groups = (0..10).map(|r| rank_of_group(10, 3, r)).collect::<Vec<_>>();
        assert_eq!(groups, [0, 0, 0, 0, 1, 1, 1, 2, 2, 2]);
        let positions = (0..10).map(|r| rank_in_group(10, 3, r)).collect::<Vec<_>>();
        assert_eq!(positions, [0, 1, 2, 3, 0, 1, 2, 0, 1, 2]);

        let t = partition(10, 3, 4).unwrap();
        assert_eq!(t.group_id, 1);
        assert_eq!(t.rank_in_group, 0);
        assert_eq!(t.effective_group_size, 3);
        assert_eq!(t.predecessor_rank(), None);
        assert_eq!(t.successor_rank(), Some(5));

        let t = partition(10, 3, 3).unwrap();
        assert_eq!(t.effective_group_size, 4);
        assert_eq!(t.predecessor_rank(), Some(2));
        assert_eq!(t.successor_rank(), None);
        assert_eq!(t.group_root_rank(), 0);
    }

    #[test]
    fn test_single_member_groups() {
        for rank in 0..5 {
            let t = partition(5, 5, rank).unwrap();
            assert_eq!(t.group_id, rank);
            assert_eq!(t.effective_group_size, 1);
            assert_eq!(t.predecessor_rank(), None);
            assert_eq!(t.successor_rank(), None);
        }
    }

    #[test]
    fn test_invalid_group_counts() {
        assert_eq!(
            partition(4, 5, 0),
            Err(Error::Configuration {
                num_groups: 5,
                comm_size: 4
            })
        );
        assert!(partition(4, 0, 0).is_err());
        assert!(partition(4, -1, 0).is_err());
        assert!(partition(4, 2, 4).is_err());
    }

    #[test]
    #[should_panic]
    fn test_query_with_too_many_groups() {
        rank_of_group(3, 4, 0);
    }

    #[test]
    #[should_panic]
    fn test_rank_past_the_end() {
        rank_of_group(10, 3, 10);
    }

    #[test]
    #[should_panic]
    fn test_negative_rank() {
        rank_in_group(10, 3, -1);
    }

    #[test]
    fn test_first_and_last_rank() {
        assert_eq!((rank_of_group(10, 3, 0), rank_in_group(10, 3, 0)), (0, 0));
        assert_eq!((rank_of_group(10, 3, 9), rank_in_group(10, 3, 9)), (2, 2));
    }

    #[test]
    fn test_partition_completeness() {
        for comm_size in 1..=200 {
            for num_groups in 1..=comm_size {
                let layout = GroupLayout::new(comm_size, num_groups);
                let counts = group_counts(comm_size, num_groups);
                assert_eq!(counts.iter().sum::<i32>(), comm_size);
                assert_eq!(
                    counts
                        .iter()
                        .filter(|c| **c == layout.group_size + 1)
                        .count() as i32,
                    layout.num_groups_with_extra_member
                );
                for (g, c) in counts.iter().enumerate() {
                    assert_eq!(*c, layout.size_of_group(g as i32));
                    assert!(*c == layout.group_size || *c == layout.group_size + 1);
                }
            }
        }
    }

    #[test]
    fn test_partition_large() {
        for (comm_size, num_groups) in [(10000, 1), (10000, 7), (10000, 333), (9999, 9998)] {
            let counts = group_counts(comm_size, num_groups);
            let min = counts.iter().min().unwrap();
            let max = counts.iter().max().unwrap();
            assert!(max - min <= 1);
            assert_eq!(counts.iter().sum::<i32>(), comm_size);
        }
    }

    #[test]
    fn test_groups_are_contiguous() {
        for (comm_size, num_groups) in [(10, 3), (17, 4), (64, 64), (100, 9)] {
            let layout = GroupLayout::new(comm_size, num_groups);
            for rank in 0..comm_size {
                let t = partition(comm_size, num_groups, rank).unwrap();
                assert_eq!(layout.first_rank_of_group(t.group_id), t.group_root_rank());
                if let Some(next) = t.successor_rank() {
                    assert_eq!(rank_of_group(comm_size, num_groups, next), t.group_id);
                    assert_eq!(
                        rank_in_group(comm_size, num_groups, next),
                        t.rank_in_group + 1
                    );
                }
            }
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(group_file_name("dump", 3, "silo"), "dump_00003.silo");
        assert_eq!(domain_namespace(42), "domain_0000042");
    }
}

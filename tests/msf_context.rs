//! Test group contexts
use groupio::{partition::GroupLayout, traits::Comm, Error, GroupContext, LocalUniverse};

fn check_group_contexts(size: i32, num_groups: i32) {
    let universe = LocalUniverse::new(size);
    let layout = GroupLayout::new(size, num_groups);
    universe.run(|world| {
        // Reverse the parent so that parent ranks differ from universe ranks
        let parent = world.split(0, size - world.rank()).unwrap();
        assert_eq!(parent.rank(), size - 1 - world.rank());

        let context = GroupContext::init(&parent, num_groups).unwrap();
        let t = *context.topology();
        assert_eq!(t.rank_in_comm, parent.rank());

        let first = layout.first_rank_of_group(t.group_id);
        assert_eq!(context.root_of_group(), first);
        assert_eq!(context.size_of_group(), layout.size_of_group(t.group_id));
        assert_eq!(
            context.member_global_ranks(),
            (first..first + context.size_of_group()).collect::<Vec<_>>()
        );

        // The group context is scoped to the group
        let group = context.comm_of_group();
        assert_eq!(group.rank(), t.rank_in_group);
        let groups = group.all_gather(t.group_id).unwrap();
        assert!(groups.iter().all(|g| *g == t.group_id));

        context.finish().unwrap();
        parent.release().unwrap();
    });
}

macro_rules! make_tests {
    ($size:literal, $num_groups:literal) => {
        paste::item! {
            #[test]
            fn [< test_group_contexts_ $size _ranks_ $num_groups _groups >]() {
                check_group_contexts($size, $num_groups);
            }
        }
    };
}

make_tests!(1, 1);
make_tests!(2, 1);
make_tests!(5, 5);
make_tests!(10, 3);
make_tests!(11, 4);
make_tests!(16, 2);

#[test]
fn test_more_files_than_ranks() {
    let universe = LocalUniverse::new(3);
    let results = universe.run(|comm| GroupContext::init(&comm, 4).err());
    for r in results {
        assert_eq!(
            r,
            Some(Error::Configuration {
                num_groups: 4,
                comm_size: 3
            })
        );
    }
}

#[test]
fn test_repeated_init() {
    let universe = LocalUniverse::new(6);
    universe.run(|comm| {
        for num_groups in 1..=6 {
            let context = GroupContext::init(&comm, num_groups).unwrap();
            assert_eq!(
                context.rank_of_group(comm.rank()),
                context.topology().group_id
            );
            context.finish().unwrap();
        }
    });
}

//? mpirun -n {{NPROCESSES}} --features "mpi"
//! Build one context per group and reduce over it

#[cfg(feature = "mpi")]
use groupio::{traits::Comm, GroupContext};
#[cfg(feature = "mpi")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "mpi")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let universe = mpi::initialize().unwrap();
    let world = universe.world();
    let rank = Comm::rank(&world);
    let size = Comm::size(&world);

    let num_groups = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or((size + 1) / 2);
    let context = GroupContext::init_or_die(&world, num_groups);

    let members = context.comm_of_group().all_gather(rank).unwrap();
    assert_eq!(members, context.member_global_ranks());
    assert_eq!(members[0], context.root_of_group());

    if rank == context.root_of_group() {
        println!(
            "Group {} has {} members: {:?}",
            context.topology().group_id,
            context.size_of_group(),
            members
        );
    }

    context.finish().unwrap();
}

#[cfg(not(feature = "mpi"))]
fn main() {}

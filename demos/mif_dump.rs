//? mpirun -n {{NPROCESSES}} --features "mpi"
//! Each group of ranks appends to one file, one rank at a time

#[cfg(feature = "mpi")]
use groupio::{
    partition::{domain_namespace, group_file_name},
    traits::{Comm, FileDriver},
    types::{BatonConfig, IoFlags},
    Baton,
};
#[cfg(feature = "mpi")]
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
};
#[cfg(feature = "mpi")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "mpi")]
struct TextDriver {
    lines_read: usize,
}

#[cfg(feature = "mpi")]
impl FileDriver for TextDriver {
    type Handle = (File, String);

    fn create(&mut self, filename: &str, namespace: &str) -> Option<Self::Handle> {
        let mut file = File::create(filename).ok()?;
        writeln!(file, "{namespace}").ok()?;
        Some((file, namespace.to_string()))
    }

    fn open(&mut self, filename: &str, namespace: &str, flags: IoFlags) -> Option<Self::Handle> {
        let mut file = if flags.write {
            OpenOptions::new().append(true).open(filename).ok()?
        } else {
            File::open(filename).ok()?
        };
        if flags.write {
            writeln!(file, "{namespace}").ok()?;
        } else {
            self.lines_read = BufReader::new(file.try_clone().ok()?).lines().count();
        }
        Some((file, namespace.to_string()))
    }

    fn close(&mut self, handle: Self::Handle) -> i32 {
        match handle.0.sync_all() {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }
}

#[cfg(feature = "mpi")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let universe = mpi::initialize().unwrap();
    let world = universe.world();
    let rank = Comm::rank(&world);

    let config = match std::env::args().nth(1) {
        Some(path) => BatonConfig::import_from_ron(&path).unwrap_or_else(|e| world.die(&e)),
        None => BatonConfig::new(Comm::size(&world).min(2), 1, IoFlags::write()),
    };
    let read_config = BatonConfig::new(config.num_groups, config.tag + 1, IoFlags::read());

    let mut baton = Baton::init_or_die(&world, config, TextDriver { lines_read: 0 });
    let filename = group_file_name("_demos_mif_dump", baton.topology().group_id, "txt");
    if let Err(e) = baton.with_baton(&filename, &domain_namespace(rank), |_| ()) {
        eprintln!("Rank {rank}: write failed: {e}");
    }
    let driver = baton.finish();

    let mut baton = Baton::init_or_die(&world, read_config, driver);
    let group_size = baton.topology().effective_group_size as usize;
    if let Err(e) = baton.with_baton(&filename, &domain_namespace(rank), |_| ()) {
        eprintln!("Rank {rank}: read failed: {e}");
    }
    let driver = baton.finish();
    assert_eq!(driver.lines_read, group_size);

    if rank == 0 {
        println!("Wrote and read back one file per group");
    }
}

#[cfg(not(feature = "mpi"))]
fn main() {}

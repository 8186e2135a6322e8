//! Pass a baton around groups of threads and print the access order
use groupio::{
    partition::{domain_namespace, group_file_name},
    traits::{Comm, FileDriver},
    types::{BatonConfig, IoFlags},
    Baton, LocalUniverse,
};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

struct PrintDriver {
    order: Arc<Mutex<Vec<String>>>,
}

impl FileDriver for PrintDriver {
    type Handle = String;

    fn create(&mut self, filename: &str, namespace: &str) -> Option<String> {
        self.order
            .lock()
            .unwrap()
            .push(format!("create {filename} for {namespace}"));
        Some(filename.to_string())
    }

    fn open(&mut self, filename: &str, namespace: &str, _flags: IoFlags) -> Option<String> {
        self.order
            .lock()
            .unwrap()
            .push(format!("open   {filename} for {namespace}"));
        Some(filename.to_string())
    }

    fn close(&mut self, _handle: String) -> i32 {
        0
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let universe = LocalUniverse::new(10);
    let order = Arc::new(Mutex::new(vec![]));
    universe.run(|comm| {
        let driver = PrintDriver {
            order: Arc::clone(&order),
        };
        let mut baton = Baton::init(&comm, BatonConfig::new(3, 1, IoFlags::write()), driver).unwrap();
        let filename = group_file_name("dump", baton.topology().group_id, "dat");
        baton
            .with_baton(&filename, &domain_namespace(comm.rank()), |_| ())
            .unwrap();
        baton.finish();
    });

    for line in order.lock().unwrap().iter() {
        println!("{line}");
    }
}

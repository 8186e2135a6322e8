//! Drivers shared by the integration tests
#![allow(dead_code)]
use groupio::{traits::FileDriver, types::IoFlags};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

/// State shared by the drivers of every rank
pub struct Shared {
    /// Ticks once per create/open
    pub clock: AtomicUsize,
    /// Whether some member of each group has its file open
    pub open: Vec<AtomicBool>,
    /// Number of times a file was opened while another member held it
    pub overlaps: AtomicUsize,
}

impl Shared {
    pub fn new(num_groups: i32) -> Arc<Self> {
        Arc::new(Self {
            clock: AtomicUsize::new(0),
            open: (0..num_groups).map(|_| AtomicBool::new(false)).collect(),
            overlaps: AtomicUsize::new(0),
        })
    }
}

/// A driver that records its calls and checks that a group's file is never
/// open twice at the same time
pub struct RecordingDriver {
    pub group: usize,
    pub shared: Arc<Shared>,
    pub calls: Vec<String>,
    pub ticks: Vec<usize>,
    pub fail_open: bool,
}

impl RecordingDriver {
    pub fn new(group: i32, shared: &Arc<Shared>) -> Self {
        Self {
            group: group as usize,
            shared: Arc::clone(shared),
            calls: vec![],
            ticks: vec![],
            fail_open: false,
        }
    }

    fn acquire(&mut self, call: String) {
        if self.shared.open[self.group].swap(true, Ordering::SeqCst) {
            self.shared.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.ticks
            .push(self.shared.clock.fetch_add(1, Ordering::SeqCst));
        self.calls.push(call);
    }
}

impl FileDriver for RecordingDriver {
    type Handle = String;

    fn create(&mut self, filename: &str, namespace: &str) -> Option<String> {
        self.acquire(format!("create {filename} {namespace}"));
        Some(filename.to_string())
    }

    fn open(&mut self, filename: &str, namespace: &str, flags: IoFlags) -> Option<String> {
        if self.fail_open {
            self.calls.push(String::from("open failed"));
            return None;
        }
        let mode = if flags.write { "w" } else { "r" };
        self.acquire(format!("open {filename} {namespace} {mode}"));
        Some(filename.to_string())
    }

    fn close(&mut self, handle: String) -> i32 {
        self.shared.open[self.group].store(false, Ordering::SeqCst);
        self.calls.push(format!("close {handle}"));
        0
    }
}

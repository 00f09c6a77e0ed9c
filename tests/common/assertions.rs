//! Event and filesystem assertions for integration tests

use media_harvester::{Event, ResourceId};
use std::path::Path;
use tokio::sync::broadcast;

/// Everything received on `rx` so far
pub fn collect_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// IDs classified with `label`, in event order
pub fn classified(events: &[Event], label: &str) -> Vec<ResourceId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Classified { id, outcome, .. } if *outcome == label => Some(*id),
            _ => None,
        })
        .collect()
}

/// Number of events matching `pred`
pub fn count_events(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| pred(event)).count()
}

/// Assert a file exists with exactly `len` bytes
pub fn assert_file_len(path: &Path, len: u64) {
    let meta = std::fs::metadata(path)
        .unwrap_or_else(|e| panic!("expected file {}: {e}", path.display()));
    assert_eq!(meta.len(), len, "unexpected size for {}", path.display());
}

/// Files in `dir` whose names end with `suffix`
pub fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read output dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(suffix))
        .collect();
    names.sort();
    names
}

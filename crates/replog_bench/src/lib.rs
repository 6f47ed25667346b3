//! Benchmark utilities.

#![warn(missing_docs)]

use rand::Rng;
use replog_core::Backlog;

/// Generate random record data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate records with sizes drawn uniformly from `min..=max`.
pub fn random_records(count: usize, min: usize, max: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| random_data(rng.gen_range(min..=max)))
        .collect()
}

/// Build a backlog already filled past its capacity.
pub fn filled_backlog(capacity: usize, block_size: usize, record_size: usize) -> Backlog {
    let mut backlog = Backlog::new(capacity, block_size).expect("valid benchmark sizes");
    let record = random_data(record_size);
    while backlog.stats().bytes_evicted() == 0 {
        backlog.append(&record);
    }
    backlog
}

//! One writer, many readers, on a shared backlog.

use replog_core::{BacklogConfig, SharedBacklog};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// The byte every stream position holds, so readers can verify content.
fn byte_at(offset: u64) -> u8 {
    (offset % 251) as u8
}

fn record(start: u64, len: usize) -> Vec<u8> {
    (0..len as u64).map(|i| byte_at(start + i)).collect()
}

#[test]
fn readers_see_consistent_ranges_during_appends() {
    let backlog = SharedBacklog::with_config(BacklogConfig::new().capacity(512).block_size(32))
        .unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let backlog = backlog.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut offset = 0u64;
            for i in 0..2_000usize {
                let len = 1 + (i * 7) % 45;
                backlog.append(&record(offset, len));
                offset += len as u64;
            }
            done.store(true, Ordering::Release);
            offset
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let backlog = backlog.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut checked = 0usize;
                while !done.load(Ordering::Acquire) {
                    let start = backlog.starting_offset();
                    match backlog.read_range_with_end(start) {
                        Ok((bytes, end)) => {
                            assert_eq!(bytes.len() as u64, end - start);
                            for (i, b) in bytes.iter().enumerate() {
                                assert_eq!(*b, byte_at(start + i as u64));
                            }
                            checked += 1;
                        }
                        // Trimmed between the two calls.
                        Err(err) => assert!(err.is_evicted()),
                    }
                }
                checked
            })
        })
        .collect();

    let written = writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(backlog.ending_offset(), written);
    let info = backlog.info();
    assert_eq!(
        info.ending_offset - info.starting_offset,
        info.used_bytes as u64
    );

    let tail = backlog.read_range(info.starting_offset).unwrap();
    assert_eq!(tail, record(info.starting_offset, tail.len()));
}

#[test]
fn stale_replica_detects_full_resync() {
    let backlog = SharedBacklog::new(64, 16).unwrap();
    let replica_offset = backlog.ending_offset();

    for i in 0..40u64 {
        backlog.append(&record(i * 8, 8));
    }

    let err = backlog.read_range(replica_offset).unwrap_err();
    assert!(err.is_evicted());
    assert!(replica_offset < backlog.starting_offset());
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Lock-free bounded MPSC ring buffer for log records
//
// Producers reserve a sequence number with CAS on write_seq, but only while
// the reservation stays within `capacity` of read_seq; a full ring rejects
// the newest record instead of overwriting. The single consumer advances
// read_seq after releasing the slot.

use super::record::LogRecord;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

/// Slot states for the producer/consumer handoff
const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const READY: u8 = 2;

/// Cache-aligned wrapper to prevent false sharing
#[repr(align(64))]
struct CacheAligned<T>(T);

/// Returned when a record cannot be enqueued because the ring is full
///
/// The rejected record is handed back to the caller, who is expected to drop
/// it rather than retry synchronously.
#[derive(Debug, thiserror::Error)]
#[error("log ring is full")]
pub struct RingFull(pub LogRecord);

impl RingFull {
    pub fn into_record(self) -> LogRecord {
        self.0
    }
}

#[repr(align(64))]
struct Slot {
    state: AtomicU8,
    record: UnsafeCell<Option<LogRecord>>,
}

/// Lock-free multiple-producer single-consumer ring buffer
pub struct MpscRing {
    slots: Box<[Slot]>,
    capacity: usize,
    write_seq: CacheAligned<AtomicU64>,
    read_seq: CacheAligned<AtomicU64>,
    consuming: AtomicBool,
    dropped: AtomicU64,
    cas_failures: AtomicU64,
}

// SAFETY: MpscRing is Sync because:
// - Producers own a slot exclusively once their CAS on write_seq succeeds,
//   and a reservation is only granted after the consumer has released the
//   slot's previous occupant (read_seq acquire pairs with its release)
// - Only one consumer reads at a time (the `consuming` flag turns a second
//   concurrent `pop` into a no-op)
// - The slot state machine publishes the record before the consumer reads it
unsafe impl Sync for MpscRing {}

impl MpscRing {
    /// Create a new ring holding `capacity` records
    ///
    /// # Panics
    /// Panics if capacity is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be non-zero");

        let slots: Vec<Slot> = (0..capacity)
            .map(|_| Slot {
                state: AtomicU8::new(EMPTY),
                record: UnsafeCell::new(None),
            })
            .collect();

        Self {
            slots: slots.into_boxed_slice(),
            capacity,
            write_seq: CacheAligned(AtomicU64::new(0)),
            read_seq: CacheAligned(AtomicU64::new(0)),
            consuming: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            cas_failures: AtomicU64::new(0),
        }
    }

    /// Enqueue a record (lock-free via CAS, multiple producers)
    ///
    /// Never blocks: a full ring returns `RingFull` immediately.
    pub fn push(&self, mut record: LogRecord) -> Result<(), RingFull> {
        // 1. Reserve a sequence number, unless that would lap the consumer
        let seq = loop {
            let current = self.write_seq.0.load(Ordering::Relaxed);
            let read_seq = self.read_seq.0.load(Ordering::Acquire);

            if current >= read_seq + self.capacity as u64 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return Err(RingFull(record));
            }

            match self.write_seq.0.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break current,
                Err(_) => {
                    self.cas_failures.fetch_add(1, Ordering::Relaxed);
                    std::hint::spin_loop();
                }
            }
        };

        let slot = &self.slots[(seq % self.capacity as u64) as usize];

        // 2. Mark slot as WRITING
        slot.state.store(WRITING, Ordering::Relaxed);

        // 3. Move the record into the slot (we own it via the reservation)
        record.sequence = seq;
        unsafe {
            *slot.record.get() = Some(record);
        }

        // 4. Publish
        slot.state.store(READY, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest record
    ///
    /// Returns None when the ring is empty, when the next producer in
    /// sequence has reserved its slot but not yet published it, or when
    /// another consumer is inside `pop` at the same moment.
    pub fn pop(&self) -> Option<LogRecord> {
        if self.consuming.swap(true, Ordering::Acquire) {
            return None;
        }
        let record = self.pop_exclusive();
        self.consuming.store(false, Ordering::Release);
        record
    }

    fn pop_exclusive(&self) -> Option<LogRecord> {
        let read_seq = self.read_seq.0.load(Ordering::Relaxed);
        let write_seq = self.write_seq.0.load(Ordering::Acquire);

        if read_seq >= write_seq {
            return None;
        }

        let slot = &self.slots[(read_seq % self.capacity as u64) as usize];

        // Wait briefly for the producer to finish (rare: mid-write)
        let mut spins = 0;
        while slot.state.load(Ordering::Acquire) != READY {
            if spins > 1000 {
                // Producer preempted mid-write; try again on the next poll
                return None;
            }
            spins += 1;
            std::hint::spin_loop();
        }

        // SAFETY: READY guarantees a complete write, and no producer can
        // reserve this slot again until read_seq moves past it
        let record = unsafe { (*slot.record.get()).take() };

        slot.state.store(EMPTY, Ordering::Release);
        self.read_seq.0.fetch_add(1, Ordering::Release);

        record
    }

    /// Fixed number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently reserved or queued, always in `[0, capacity]`
    pub fn len(&self) -> usize {
        let read_seq = self.read_seq.0.load(Ordering::Acquire);
        let write_seq = self.write_seq.0.load(Ordering::Acquire);
        (write_seq.saturating_sub(read_seq) as usize).min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records rejected because the ring was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of CAS retries (contention metric)
    pub fn cas_failures(&self) -> u64 {
        self.cas_failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Facility, LogArg, Severity};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn record(tag: &str) -> LogRecord {
        LogRecord::new(Severity::Info, Facility::Test, "{}").arg(tag)
    }

    fn tag_of(record: &LogRecord) -> String {
        record.message()
    }

    #[test]
    fn test_fifo_basic() {
        let ring = MpscRing::new(4);
        ring.push(record("a")).unwrap();
        ring.push(record("b")).unwrap();
        assert_eq!(ring.len(), 2);

        assert_eq!(tag_of(&ring.pop().unwrap()), "a");
        assert_eq!(ring.len(), 1);
        assert_eq!(tag_of(&ring.pop().unwrap()), "b");
        assert!(ring.is_empty());
        assert!(ring.pop().is_none());
    }

    #[test]
    fn test_full_rejects_newest() {
        let ring = MpscRing::new(4);
        for tag in ["A", "B", "C", "D"] {
            ring.push(record(tag)).unwrap();
        }
        let rejected = ring.push(record("E")).unwrap_err();
        assert_eq!(tag_of(&rejected.into_record()), "E");
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.dropped(), 1);

        assert_eq!(tag_of(&ring.pop().unwrap()), "A");
        ring.push(record("E")).unwrap();

        let drained: Vec<String> = std::iter::from_fn(|| ring.pop()).map(|r| tag_of(&r)).collect();
        assert_eq!(drained, vec!["B", "C", "D", "E"]);
    }

    #[test]
    fn test_wraparound_many_laps() {
        let ring = MpscRing::new(3);
        for lap in 0..10u32 {
            for i in 0..3u32 {
                ring.push(LogRecord::new(Severity::Info, Facility::Test, "{}").arg(lap * 3 + i))
                    .unwrap();
            }
            for i in 0..3u32 {
                let r = ring.pop().unwrap();
                assert_eq!(r.args()[0], LogArg::U32(lap * 3 + i));
                assert_eq!(r.sequence, (lap * 3 + i) as u64);
            }
        }
        assert_eq!(ring.capacity(), 3);
    }

    #[test]
    fn test_concurrent_producers() {
        const THREADS: u32 = 4;
        const PER_THREAD: u32 = 200;
        let ring = Arc::new(MpscRing::new((THREADS * PER_THREAD) as usize));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let r = LogRecord::new(Severity::Info, Facility::Test, "{}:{}")
                            .arg(t)
                            .arg(i);
                        ring.push(r).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut seen = HashSet::new();
        let mut last_per_thread = vec![None; THREADS as usize];
        while let Some(r) = ring.pop() {
            let (t, i) = match (&r.args()[0], &r.args()[1]) {
                (LogArg::U32(t), LogArg::U32(i)) => (*t, *i),
                other => panic!("unexpected args {:?}", other),
            };
            assert!(seen.insert((t, i)), "duplicate record {}:{}", t, i);
            // Each producer's own records stay in submission order
            if let Some(prev) = last_per_thread[t as usize] {
                assert!(i > prev);
            }
            last_per_thread[t as usize] = Some(i);
        }
        assert_eq!(seen.len(), (THREADS * PER_THREAD) as usize);
        assert_eq!(ring.dropped(), 0);
    }

    #[test]
    fn test_concurrent_with_live_consumer() {
        let ring = Arc::new(MpscRing::new(8));
        let producers: Vec<_> = (0..4u32)
            .map(|t| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    let mut accepted = 0u32;
                    for i in 0..500u32 {
                        let r = LogRecord::new(Severity::Info, Facility::Test, "{}").arg(t * 1000 + i);
                        if ring.push(r).is_ok() {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();

        let mut consumed = 0u32;
        let mut accepted = 0u32;
        let mut pending = producers;
        while !pending.is_empty() {
            while ring.pop().is_some() {
                consumed += 1;
            }
            let (done, rest): (Vec<_>, Vec<_>) = pending.into_iter().partition(|h| h.is_finished());
            for handle in done {
                accepted += handle.join().unwrap();
            }
            pending = rest;
            assert!(ring.len() <= ring.capacity());
        }
        while ring.pop().is_some() {
            consumed += 1;
        }
        assert_eq!(consumed, accepted);
        assert_eq!(accepted as u64 + ring.dropped(), 2000);
    }

    #[test]
    fn test_second_consumer_backs_off() {
        let ring = Arc::new(MpscRing::new(1024));
        for i in 0..1000u32 {
            ring.push(LogRecord::new(Severity::Info, Facility::Test, "{}").arg(i))
                .unwrap();
        }

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    let mut taken = Vec::new();
                    while !ring.is_empty() {
                        if let Some(r) = ring.pop() {
                            taken.push(r.sequence);
                        }
                    }
                    taken
                })
            })
            .collect();

        let mut all: Vec<u64> = consumers
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..1000u64).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "Capacity must be non-zero")]
    fn test_zero_capacity_rejected() {
        let _ = MpscRing::new(0);
    }
}

//! Bounded fan-out with ordered fan-in.
//!
//! A fixed pool of scoped worker threads pulls input positions from a shared
//! counter and writes each outcome into the slot for that position. Output
//! order is therefore input order no matter which unit finishes first.
//!
//! [`CallPermits`] bounds work that can outlive the unit that started it,
//! such as a registry call abandoned after a timeout.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

/// Run `unit` over every input on at most `workers` threads.
///
/// A panicking unit does not disturb its siblings: its slot is filled by
/// `recover` with the panic message instead. The returned vector has exactly
/// one entry per input, in input order.
pub fn run_ordered<I, T, F, R>(inputs: &[I], workers: usize, unit: F, recover: R) -> Vec<T>
where
    I: Sync,
    T: Send + Sync,
    F: Fn(&I) -> T + Sync,
    R: Fn(&I, String) -> T,
{
    let slots: Vec<OnceLock<Result<T, String>>> = inputs.iter().map(|_| OnceLock::new()).collect();
    let next = AtomicUsize::new(0);
    let pool = workers.clamp(1, inputs.len().max(1));

    thread::scope(|scope| {
        for worker in 0..pool {
            let (slots, next, unit) = (&slots, &next, &unit);
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(input) = inputs.get(index) else {
                        break;
                    };
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit(input)))
                        .map_err(panic_message);
                    if let Err(reason) = &outcome {
                        tracing::warn!(worker, index, reason = %reason, "unit of work panicked");
                    }
                    // Each index is handed out exactly once, so the slot is empty.
                    let _ = slots[index].set(outcome);
                }
            });
        }
    });

    slots
        .into_iter()
        .zip(inputs)
        .map(|(slot, input)| match slot.into_inner() {
            Some(Ok(value)) => value,
            Some(Err(reason)) => recover(input, reason),
            None => recover(input, "unit was never scheduled".to_owned()),
        })
        .collect()
}

/// A counting semaphore over calls that may run detached.
///
/// A [`CallPermit`] is released when it is dropped, which happens on the
/// thread that did the work, even if it unwinds.
#[derive(Debug)]
pub struct CallPermits {
    available: Mutex<usize>,
    released: Condvar,
}

impl CallPermits {
    /// A pool of `limit` permits, at least one.
    #[must_use]
    pub fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            available: Mutex::new(limit.max(1)),
            released: Condvar::new(),
        })
    }

    /// Take a permit, waiting at most `timeout` for one to free up.
    #[must_use]
    pub fn acquire(self: &Arc<Self>, timeout: Duration) -> Option<CallPermit> {
        let available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut available, _) = self
            .released
            .wait_timeout_while(available, timeout, |n| *n == 0)
            .unwrap_or_else(PoisonError::into_inner);
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(CallPermit(Arc::clone(self)))
    }

    /// Permits not currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One held slot of a [`CallPermits`] pool.
#[derive(Debug)]
pub struct CallPermit(Arc<CallPermits>);

impl Drop for CallPermit {
    fn drop(&mut self) {
        *self.0.available.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.0.released.notify_one();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_input_order_despite_completion_order() {
        let delays = [40u64, 0, 25, 5, 10, 0];
        let finished = Mutex::new(Vec::new());
        let out = run_ordered(
            &delays,
            3,
            |ms| {
                thread::sleep(Duration::from_millis(*ms));
                finished.lock().unwrap().push(*ms);
                *ms * 2
            },
            |_, _| u64::MAX,
        );
        assert_eq!(out, [80, 0, 50, 10, 20, 0]);
        assert_eq!(finished.into_inner().unwrap().len(), delays.len());
    }

    #[test]
    fn pool_size_is_bounded() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let inputs: Vec<u32> = (0..12).collect();
        run_ordered(
            &inputs,
            4,
            |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                active.fetch_sub(1, Ordering::SeqCst);
            },
            |_, _| (),
        );
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[test]
    fn panicking_unit_is_recovered_in_place() {
        let inputs = ["a", "boom", "c"];
        let out = run_ordered(
            &inputs,
            2,
            |s| {
                assert!(*s != "boom", "exploded on {s}");
                s.to_uppercase()
            },
            |s, reason| format!("{s} failed: {reason}"),
        );
        assert_eq!(out[0], "A");
        assert!(out[1].starts_with("boom failed: exploded on boom"), "{}", out[1]);
        assert_eq!(out[2], "C");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out: Vec<u8> = run_ordered(&[] as &[u8], 4, |b| *b, |_, _| 0);
        assert!(out.is_empty());
    }

    #[test]
    fn permits_are_held_until_dropped() {
        let permits = CallPermits::new(2);
        let first = permits.acquire(Duration::ZERO).unwrap();
        let _second = permits.acquire(Duration::ZERO).unwrap();
        assert!(permits.acquire(Duration::from_millis(20)).is_none());
        assert_eq!(permits.available(), 0);

        let waiter = {
            let permits = Arc::clone(&permits);
            thread::spawn(move || permits.acquire(Duration::from_secs(2)).is_some())
        };
        thread::sleep(Duration::from_millis(20));
        drop(first);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn permit_is_released_when_its_thread_panics() {
        let permits = CallPermits::new(1);
        let permit = permits.acquire(Duration::ZERO).unwrap();
        let handle = thread::spawn(move || {
            let _permit = permit;
            panic!("call failed");
        });
        assert!(handle.join().is_err());
        assert_eq!(permits.available(), 1);
    }

    #[test]
    fn zero_limit_still_allows_one_call() {
        let permits = CallPermits::new(0);
        assert!(permits.acquire(Duration::ZERO).is_some());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn output_matches_sequential_map(
                inputs in proptest::collection::vec(any::<i32>(), 0..40),
                workers in 1usize..10,
            ) {
                let out = run_ordered(&inputs, workers, |x| i64::from(*x) * 3, |_, _| 0);
                let expected: Vec<i64> = inputs.iter().map(|x| i64::from(*x) * 3).collect();
                prop_assert_eq!(out, expected);
            }
        }
    }
}

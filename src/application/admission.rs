//! Admission limiter for article tasks
//!
//! A fixed-capacity semaphore bounding how many tasks are inside
//! fetch/extract/merge at once. The permit is a guard: dropping it on any
//! exit path (success, error, panic unwind) frees the slot. The gate also
//! records how many permits are held and the highest count ever observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

#[derive(Debug)]
struct GateState {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct AdmissionGate {
    state: Arc<GateState>,
}

impl AdmissionGate {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(GateState {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> Result<AdmissionPermit, AcquireError> {
        let permit = Arc::clone(&self.state.semaphore).acquire_owned().await?;

        let now = self.state.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.peak.fetch_max(now, Ordering::AcqRel);

        Ok(AdmissionPermit {
            _permit: permit,
            state: Arc::clone(&self.state),
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.capacity
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously held permits so far.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.state.peak.load(Ordering::Acquire)
    }
}

/// Held slot; released on drop.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    state: Arc<GateState>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is released.
        self.state.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_permit_is_released_on_drop() {
        let gate = AdmissionGate::new(1);

        let permit = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 1);
        drop(permit);

        assert_eq!(gate.in_flight(), 0);
        let _again = gate.acquire().await.unwrap();
        assert_eq!(gate.peak(), 1);
    }

    #[tokio::test]
    async fn test_acquire_blocks_when_full() {
        let gate = AdmissionGate::new(1);
        let _held = gate.acquire().await.unwrap();

        let second = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(second.is_err(), "second acquire should still be waiting");
    }

    #[tokio::test]
    async fn test_permit_is_released_when_task_fails() {
        let gate = AdmissionGate::new(2);

        let failing = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                panic!("task blew up while holding a permit");
            })
        };
        assert!(failing.await.is_err());

        assert_eq!(gate.in_flight(), 0);
        let _a = gate.acquire().await.unwrap();
        let _b = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_peak_never_exceeds_capacity() {
        let gate = AdmissionGate::new(3);

        let tasks: Vec<_> = (0..40)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    let _permit = gate.acquire().await.unwrap();
                    tokio::time::sleep(Duration::from_millis(2)).await;
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }

        assert!(gate.peak() <= 3);
        assert!(gate.peak() >= 1);
        assert_eq!(gate.in_flight(), 0);
    }
}

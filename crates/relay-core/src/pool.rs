use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Fixed-size pool of reporting threads.
///
/// Tracker requests for different issues run in parallel up to the
/// configured size; `join` closes the queue and waits for in-flight jobs.
pub struct WorkerPool {
    tx: Option<mpsc::Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..size)
            .map(|_| {
                let rx = Arc::clone(&rx);
                std::thread::spawn(move || loop {
                    let job = {
                        let guard = rx.lock().unwrap_or_else(|p| p.into_inner());
                        guard.recv()
                    };
                    match job {
                        Ok(job) => job(),
                        // Sender dropped: queue is closed.
                        Err(_) => break,
                    }
                })
            })
            .collect();

        Self {
            tx: Some(tx),
            handles,
        }
    }

    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        match &self.tx {
            Some(tx) => {
                let _ = tx.send(Box::new(job));
            }
            None => tracing::warn!("job submitted after pool shutdown, dropped"),
        }
    }

    /// Close the queue and wait for all workers to drain it.
    pub fn join(&mut self) {
        self.tx.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_all_jobs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(4);
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.join();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn zero_size_clamps_to_one() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(0);
        let c = Arc::clone(&counter);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        pool.join();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn join_is_idempotent() {
        let mut pool = WorkerPool::new(2);
        pool.submit(|| {});
        pool.join();
        pool.join();
    }

    #[test]
    fn submit_after_join_is_dropped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(1);
        pool.join();
        let c = Arc::clone(&counter);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}

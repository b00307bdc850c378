//! Work submission handles.
//!
//! A [`Runner`] decides where a posted task runs: inline, on a tokio
//! runtime, or on whichever thread drains a [`TaskQueue`]. Completion
//! handlers and calls into the connection instance are always posted
//! through one.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// A unit of posted work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Cloneable handle that accepts [`Task`]s.
#[derive(Clone)]
pub struct Runner(Arc<dyn Fn(Task) + Send + Sync>);

impl Runner {
    pub fn new(post: impl Fn(Task) + Send + Sync + 'static) -> Self {
        Self(Arc::new(post))
    }

    /// Run every task on the posting thread, before `post` returns.
    pub fn immediate() -> Self {
        Self::new(|task| task())
    }

    /// Spawn every task on the given tokio runtime.
    pub fn tokio(handle: Handle) -> Self {
        Self::new(move |task| {
            handle.spawn(async move { task() });
        })
    }

    /// A runner whose tasks wait in a queue until the returned
    /// [`TaskQueue`] is drained. Tasks posted after the queue is dropped
    /// are discarded.
    pub fn queue() -> (Self, TaskQueue) {
        let (tx, rx) = mpsc::unbounded_channel::<Task>();
        let runner = Self::new(move |task| {
            if tx.send(task).is_err() {
                tracing::trace!("[mtp] task queue closed, dropping task");
            }
        });
        (runner, TaskQueue { rx })
    }

    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        (self.0)(Box::new(task));
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Runner")
    }
}

/// The receiving end of [`Runner::queue`]. Tasks run one at a time, in
/// posting order, on the thread that drains the queue.
pub struct TaskQueue {
    rx: mpsc::UnboundedReceiver<Task>,
}

impl TaskQueue {
    /// Run the tasks queued so far, including any they post in turn.
    /// Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            count += 1;
        }
        count
    }

    /// Run tasks as they arrive until every [`Runner`] clone is dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn queue_defers_until_drained() {
        let (runner, mut queue) = Runner::queue();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let seen = Arc::clone(&seen);
            runner.post(move || seen.lock().unwrap().push(i));
        }
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn tasks_posted_by_tasks_run_in_the_same_drain() {
        let (runner, mut queue) = Runner::queue();
        let inner = runner.clone();
        let hit = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&hit);
        runner.post(move || inner.post(move || *flag.lock().unwrap() = true));
        assert_eq!(queue.run_pending(), 2);
        assert!(*hit.lock().unwrap());
    }

    #[test]
    fn dropped_queue_discards() {
        let (runner, queue) = Runner::queue();
        drop(queue);
        runner.post(|| panic!("must not run"));
    }

    #[tokio::test]
    async fn tokio_runner_spawns() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let runner = Runner::tokio(Handle::current());
        runner.post(move || {
            let _ = tx.send(7);
        });
        assert_eq!(rx.await.unwrap(), 7);
    }
}

//! Bounded in-process job queue.
//!
//! The webhook ack path uses `try_enqueue` and never waits on capacity: a
//! full queue is logged and the message stays `received`, recoverable via
//! the reprocess endpoint.

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unit of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    ProcessMessage(Uuid),
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("job queue is full")]
    Full,

    #[error("job queue is closed")]
    Closed,
}

/// Cloneable enqueue handle held by the HTTP side.
#[derive(Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
}

impl JobSender {
    pub fn try_enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// Creates the queue. The single receiver goes to the worker pool.
pub fn job_queue(capacity: usize) -> (JobSender, mpsc::Receiver<Job>) {
    let (tx, rx) = mpsc::channel(capacity);
    (JobSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_enqueue_reports_full_and_closed() {
        let (sender, rx) = job_queue(1);
        sender.try_enqueue(Job::ProcessMessage(Uuid::new_v4())).unwrap();

        let err = sender
            .try_enqueue(Job::ProcessMessage(Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, EnqueueError::Full));

        drop(rx);
        let err = sender
            .try_enqueue(Job::ProcessMessage(Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, EnqueueError::Closed));
    }
}

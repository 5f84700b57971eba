use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use ariteg_types::{AritegLink, Multihash};
use tokio::task::JoinHandle;

use crate::error::{AritegError, AritegResult, Direction, Stage};

/// How a background write resolved.
#[derive(Debug)]
pub enum WriteOutcome {
    /// New bytes were durably persisted under this digest.
    Written(Multihash),
    /// The object was already present; nothing was written.
    AlreadyExists,
    /// The write (or a write it depended on) failed.
    Failed(AritegError),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, WriteOutcome::AlreadyExists)
    }

    /// `Some(digest)` if bytes were written, `None` on a dedup hit.
    pub fn into_result(self) -> AritegResult<Option<Multihash>> {
        match self {
            WriteOutcome::Written(digest) => Ok(Some(digest)),
            WriteOutcome::AlreadyExists => Ok(None),
            WriteOutcome::Failed(err) => Err(err),
        }
    }
}

/// Future resolving once the backend write behind a receipt settles.
///
/// Always resolves: a write task that panics or is aborted yields
/// [`WriteOutcome::Failed`]. Dropping a `Completion` does not cancel the
/// write.
#[derive(Debug)]
pub struct Completion {
    link: AritegLink,
    stage: Stage,
    handle: JoinHandle<WriteOutcome>,
}

impl Completion {
    pub(crate) fn new(link: AritegLink, stage: Stage, handle: JoinHandle<WriteOutcome>) -> Self {
        Self {
            link,
            stage,
            handle,
        }
    }

    /// Best-effort cancellation.
    ///
    /// A write already running on the blocking pool still completes; one
    /// that has not started, or a list still waiting on its children,
    /// resolves to [`AritegError::Cancelled`].
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Future for Completion {
    type Output = WriteOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(err)) if err.is_cancelled() => {
                Poll::Ready(WriteOutcome::Failed(AritegError::Cancelled {
                    link: this.link.clone(),
                }))
            }
            Poll::Ready(Err(err)) => Poll::Ready(WriteOutcome::Failed(AritegError::stage(
                this.stage,
                Direction::Store,
                &this.link,
                err,
            ))),
        }
    }
}

/// Result of a store call: the link, known immediately, and the
/// completion of the write behind it.
#[derive(Debug)]
pub struct StoreReceipt {
    pub link: AritegLink,
    pub completion: Completion,
}

impl StoreReceipt {
    /// Wait for durability and return the link.
    pub async fn durable(self) -> AritegResult<AritegLink> {
        self.completion.await.into_result()?;
        Ok(self.link)
    }
}

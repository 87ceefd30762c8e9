//! Cancellable stream of query results.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::db::DbResult;

/// Result sets delivered by a live query.
///
/// The first item is the current result; later items arrive after writes to
/// the tables the query reads. Dropping the subscription cancels it.
pub struct Subscription<T> {
    rx: mpsc::Receiver<DbResult<T>>,
    token: CancellationToken,
}

impl<T> Subscription<T> {
    pub(crate) fn new(rx: mpsc::Receiver<DbResult<T>>, token: CancellationToken) -> Self {
        Self { rx, token }
    }

    /// Wait for the next result set. Returns `None` once cancelled or when
    /// the producing database is gone.
    pub async fn recv(&mut self) -> Option<DbResult<T>> {
        self.rx.recv().await
    }

    /// Stop delivery. Results already buffered are discarded.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = DbResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

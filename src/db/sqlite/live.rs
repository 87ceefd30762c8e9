//! Live queries: re-run a read whenever a table it depends on changes.

use std::future::Future;

use sqlx::SqlitePool;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::db::{ChangeNotifier, DbResult, Subscription, Table};

/// Result sets buffered per subscriber before the query task waits.
const SUBSCRIPTION_BUFFER: usize = 8;

/// Spawn a task that delivers `query` results now and after every change to
/// one of `tables`.
///
/// The notifier is subscribed before the first query runs, so a write that
/// lands between the two is never missed. Bursts of changes collapse into a
/// single re-query.
pub(crate) fn spawn_live_query<T, F, Fut>(
    pool: SqlitePool,
    notifier: &ChangeNotifier,
    tables: &'static [Table],
    query: F,
) -> Subscription<T>
where
    T: Send + 'static,
    F: Fn(SqlitePool) -> Fut + Send + 'static,
    Fut: Future<Output = DbResult<T>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
    let token = CancellationToken::new();
    let mut changes = notifier.subscribe();
    let cancelled = token.clone();

    tokio::spawn(async move {
        loop {
            let result = query(pool.clone()).await;

            tokio::select! {
                _ = cancelled.cancelled() => break,
                sent = tx.send(result) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }

            // Wait for a change to a table this query reads.
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => return,
                    _ = tx.closed() => return,
                    msg = changes.recv() => match msg {
                        Ok(change) if tables.contains(&change.table) => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "live query lagged behind change notifications");
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    },
                }
            }

            loop {
                match changes.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => return,
                }
            }
        }

        debug!(?tables, "live query stopped");
    });

    Subscription::new(rx, token)
}

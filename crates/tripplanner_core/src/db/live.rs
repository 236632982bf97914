//! Live (self-refreshing) query views.
//!
//! # Responsibility
//! - Re-run a query whenever a table it depends on is written.
//! - Let consumers pull emissions one by one, or as a `Stream`.
//!
//! # Invariants
//! - The first emission is produced immediately from current state.
//! - Every later emission reflects all writes committed before it was
//!   computed; bursts of changes are coalesced into one re-run.
//! - Dropping a view only detaches its own receiver.

use super::store::{Store, TableSet};
use futures::Stream;
use log::debug;
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;

type QueryFn<T, E> = Arc<dyn Fn(&Connection) -> Result<T, E> + Send + Sync>;

/// Continuously updating result of one query.
pub struct LiveQuery<T, E> {
    store: Store,
    tables: TableSet,
    query: QueryFn<T, E>,
    changes: Receiver<TableSet>,
    emitted_once: bool,
}

impl<T, E> LiveQuery<T, E> {
    pub(crate) fn new(store: Store, tables: TableSet, query: QueryFn<T, E>) -> Self {
        let changes = store.subscribe_changes();
        Self {
            store,
            tables,
            query,
            changes,
            emitted_once: false,
        }
    }

    /// Tables this view depends on.
    pub fn tables(&self) -> TableSet {
        self.tables
    }

    /// Waits for the next emission.
    ///
    /// The view holds its own store handle, so this keeps yielding `Some`
    /// for as long as the view exists.
    pub async fn next(&mut self) -> Option<Result<T, E>> {
        if self.emitted_once {
            if !self.wait_for_relevant_change().await {
                return None;
            }
        } else {
            self.emitted_once = true;
        }

        self.drain_pending();
        let query = Arc::clone(&self.query);
        Some(self.store.read(|conn| query.as_ref()(conn)).await)
    }

    /// Returns the current result without subscribing to later changes.
    pub async fn first(self) -> Result<T, E> {
        let query = self.query;
        self.store.read(|conn| query.as_ref()(conn)).await
    }

    /// Converts the view into a `futures::Stream` of emissions.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, E>> {
        futures::stream::unfold(self, |mut live| async move {
            let item = live.next().await?;
            Some((item, live))
        })
    }

    async fn wait_for_relevant_change(&mut self) -> bool {
        loop {
            match self.changes.recv().await {
                Ok(touched) if touched.intersects(self.tables) => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("event=live_query_lagged module=db status=ok skipped={skipped}");
                    return true;
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }

    fn drain_pending(&mut self) {
        loop {
            match self.changes.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

//! Concurrent fan-out over independently addressable numbered pages.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;

use super::offset::OffsetPageSource;
use crate::error::{ActivityError, short_error_message};

/// Upper bound on in-flight page requests.
pub const MAX_PARALLEL_PAGES: usize = 10;

/// Result of a parallel fan-out.
#[derive(Debug)]
pub struct ParallelOutcome<T> {
    /// Items from every successful page, in ascending page order.
    pub items: Vec<T>,
    /// Pages that failed, with a short reason. Their slots are dropped.
    pub failed_pages: Vec<(u32, String)>,
}

impl<T> ParallelOutcome<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            failed_pages: Vec::new(),
        }
    }
}

type Slots<T> = Arc<Mutex<Vec<Option<Vec<T>>>>>;

/// Fetch every page in `pages` concurrently.
///
/// Each page lands in its own pre-sized slot so completion order does not
/// matter. Failed or cancelled pages leave their slot empty and are reported
/// in [`ParallelOutcome::failed_pages`]; nothing is retried.
pub async fn fetch_pages_parallel<S>(
    source: Arc<S>,
    pages: RangeInclusive<u32>,
    per_page: u32,
    cancel: &CancellationToken,
) -> ParallelOutcome<S::Item>
where
    S: OffsetPageSource + ?Sized + 'static,
    S::Item: 'static,
{
    let first = *pages.start();
    let count = pages.clone().count();
    if count == 0 {
        return ParallelOutcome::empty();
    }

    let width = count.clamp(1, MAX_PARALLEL_PAGES);
    let semaphore = Arc::new(Semaphore::new(width));
    let slots: Slots<S::Item> = Arc::new(Mutex::new((0..count).map(|_| None).collect()));
    let mut join_set: JoinSet<(u32, Result<(), String>)> = JoinSet::new();
    let mut task_pages: HashMap<Id, u32> = HashMap::with_capacity(count);

    for page in pages {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let slots = Arc::clone(&slots);
        let cancel = cancel.clone();

        let handle = join_set.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(ActivityError::Cancelled.to_string()),
                result = fetch_into_slot(source.as_ref(), &semaphore, &slots, page, first, per_page) => result,
            };
            (page, result)
        });
        task_pages.insert(handle.id(), page);
    }

    let mut failed_pages = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((page, Err(message))) => {
                tracing::warn!(page, error = %message, "Dropping failed page");
                failed_pages.push((page, message));
            }
            Err(e) => match task_pages.get(&e.id()) {
                Some(&page) => {
                    tracing::warn!(page, error = %e, "Page task failed");
                    failed_pages.push((page, format!("page task failed: {e}")));
                }
                None => tracing::warn!(error = %e, "Unknown page task failed"),
            },
        }
    }
    failed_pages.sort_by_key(|(page, _)| *page);

    // Every task has finished, so the lock is uncontended.
    let slots = match Arc::try_unwrap(slots) {
        Ok(mutex) => mutex.into_inner().unwrap_or_else(|e| e.into_inner()),
        Err(shared) => std::mem::take(&mut *shared.lock().unwrap_or_else(|e| e.into_inner())),
    };

    ParallelOutcome {
        items: slots.into_iter().flatten().flatten().collect(),
        failed_pages,
    }
}

async fn fetch_into_slot<S>(
    source: &S,
    semaphore: &Semaphore,
    slots: &Mutex<Vec<Option<Vec<S::Item>>>>,
    page: u32,
    first: u32,
    per_page: u32,
) -> Result<(), String>
where
    S: OffsetPageSource + ?Sized,
{
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| "semaphore closed".to_string())?;

    let items = source
        .fetch_page(page, per_page)
        .await
        .map_err(|e| short_error_message(&e))?;
    tracing::debug!(page, count = items.len(), "Fetched page");

    let index = (page - first) as usize;
    let mut slots = slots.lock().map_err(|_| "slot lock poisoned".to_string())?;
    if let Some(slot) = slots.get_mut(index) {
        *slot = Some(items);
    }
    Ok(())
}

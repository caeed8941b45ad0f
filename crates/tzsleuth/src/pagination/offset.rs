//! Sequential page-number pagination with a hard page cap.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{ActivityError, Result, short_error_message};

/// Fetches one numbered page of a page-number protocol.
#[async_trait]
pub trait OffsetPageSource: Send + Sync {
    type Item: Send;

    /// Fetch page `page` (1-based) of size `per_page`.
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<Self::Item>>;
}

/// Result of a sequential offset run.
#[derive(Debug)]
pub struct OffsetOutcome<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
    /// Whether the last page came back short (nothing left to fetch).
    pub exhausted: bool,
    /// The failure that stopped the loop after the first page, if any.
    pub error: Option<ActivityError>,
}

/// Walk pages `1..=max_pages` until a short page, the cap, a failure or
/// cancellation.
///
/// A failure on page 1 is returned as an error. Later page failures and
/// cancellation keep the pages already fetched; any other error propagates.
pub async fn paginate_offset<S>(
    source: &S,
    per_page: u32,
    max_pages: u32,
    cancel: &CancellationToken,
) -> Result<OffsetOutcome<S::Item>>
where
    S: OffsetPageSource + ?Sized,
{
    let mut items = Vec::new();
    let mut pages_fetched = 0;
    let mut exhausted = false;
    let mut error = None;

    for page in 1..=max_pages {
        if cancel.is_cancelled() {
            if page == 1 {
                return Err(ActivityError::Cancelled);
            }
            error = Some(ActivityError::Cancelled);
            break;
        }

        let batch = match source.fetch_page(page, per_page).await {
            Ok(batch) => batch,
            Err(e) if page == 1 || !e.keeps_partial_results() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    page,
                    error = %short_error_message(&e),
                    "Page fetch failed; keeping earlier pages"
                );
                error = Some(e);
                break;
            }
        };

        let count = batch.len();
        items.extend(batch);
        pages_fetched = page;
        tracing::debug!(page, count, total = items.len(), "Fetched page");

        if count < per_page as usize {
            exhausted = true;
            break;
        }
    }

    Ok(OffsetOutcome {
        items,
        pages_fetched,
        exhausted,
        error,
    })
}

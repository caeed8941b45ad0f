//! Adaptive cursor pagination over one or more independent sub-streams.
//!
//! A single request may advance several named connections at once (pull
//! requests and issues, for example), each with its own forward cursor. The
//! engine fetches the first page of every stream, sizes a [`FetchBudget`]
//! from what came back, then keeps advancing only the streams that still
//! have pages until the data-point target is met, every cursor is exhausted,
//! or the budget runs out.

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::budget::{BudgetTiers, FetchBudget};
use crate::error::{ActivityError, Result, short_error_message};

/// Continuation state for one sub-stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    /// Opaque token to pass back to the server.
    pub token: Option<String>,
    /// Whether the server reported further pages.
    pub has_more: bool,
}

impl PageCursor {
    /// A cursor with nothing left to fetch.
    pub fn exhausted() -> Self {
        Self::default()
    }

    /// A cursor built from a server's `hasNextPage` / `endCursor` pair.
    pub fn from_page_info(has_next_page: bool, end_cursor: Option<String>) -> Self {
        Self {
            // Without a token there is no way to advance.
            has_more: has_next_page && end_cursor.is_some(),
            token: end_cursor,
        }
    }
}

/// Request for the next page of one sub-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub stream: usize,
    /// `None` requests the first page.
    pub after: Option<String>,
}

/// One page of one sub-stream.
#[derive(Debug, Clone)]
pub struct StreamPage<T> {
    pub stream: usize,
    pub items: Vec<T>,
    pub cursor: PageCursor,
}

/// Protocol-specific page fetcher injected into the engine.
#[async_trait]
pub trait CursorPageSource: Send + Sync {
    type Item: Send;

    /// Fetch one page for each requested stream in a single round trip.
    ///
    /// Streams not present in `requests` must not be advanced.
    async fn fetch_streams(
        &self,
        requests: &[StreamRequest],
    ) -> Result<Vec<StreamPage<Self::Item>>>;
}

/// Pagination state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationState {
    Initial,
    Active,
    Exhausted,
    BudgetReached,
    TargetReached,
    /// A later page failed or the caller cancelled.
    Aborted,
}

/// Result of an adaptive pagination run.
#[derive(Debug)]
pub struct CursorOutcome<T> {
    /// Items in fetch order.
    pub items: Vec<T>,
    /// Terminal state.
    pub state: PaginationState,
    /// Pages fetched after the initial page.
    pub additional_pages: u32,
    /// Tier-selected cap on additional pages.
    pub page_cap: u32,
    /// The failure that aborted the loop, if any. Items are still valid.
    pub error: Option<ActivityError>,
    /// Streams the failing request was advancing. Empty unless `error` is a
    /// page failure.
    pub failed_streams: Vec<usize>,
}

/// Adaptive pagination engine.
pub struct AdaptivePaginator<'a> {
    target: usize,
    tiers: &'a BudgetTiers,
    cancel: &'a CancellationToken,
}

impl<'a> AdaptivePaginator<'a> {
    pub fn new(target: usize, tiers: &'a BudgetTiers, cancel: &'a CancellationToken) -> Self {
        Self {
            target,
            tiers,
            cancel,
        }
    }

    /// Fetch the first page of `streams` sub-streams, then continue
    /// adaptively.
    ///
    /// A failure of the first request is returned as an error. Later page
    /// failures and cancellation end the loop with a partial outcome.
    pub async fn run<S>(&self, source: &S, streams: usize) -> Result<CursorOutcome<S::Item>>
    where
        S: CursorPageSource + ?Sized,
    {
        let requests: Vec<StreamRequest> = (0..streams)
            .map(|stream| StreamRequest {
                stream,
                after: None,
            })
            .collect();
        let first = source.fetch_streams(&requests).await?;
        self.resume(source, streams, first).await
    }

    /// Continue from first pages the caller already fetched.
    ///
    /// Used when the first request also carries data the engine does not
    /// know about (a profile fetched alongside the first page of each
    /// connection).
    ///
    /// Errors that do not keep partial results (see
    /// [`ActivityError::keeps_partial_results`]) are returned as-is.
    pub async fn resume<S>(
        &self,
        source: &S,
        streams: usize,
        first: Vec<StreamPage<S::Item>>,
    ) -> Result<CursorOutcome<S::Item>>
    where
        S: CursorPageSource + ?Sized,
    {
        let mut cursors = vec![PageCursor::exhausted(); streams];
        let mut items = Vec::new();
        absorb(first, &mut cursors, &mut items);

        let mut budget = FetchBudget::after_first_fetch(self.target, items.len(), self.tiers);
        let mut state = next_state(&cursors, &budget);
        let mut error = None;
        let mut failed_streams = Vec::new();

        tracing::debug!(
            accumulated = budget.accumulated(),
            target = budget.target(),
            page_cap = budget.max_pages(),
            state = ?state,
            "Initial page fetched"
        );

        while state == PaginationState::Active {
            if self.cancel.is_cancelled() {
                state = PaginationState::Aborted;
                error = Some(ActivityError::Cancelled);
                break;
            }
            if !budget.try_consume_page() {
                state = PaginationState::BudgetReached;
                break;
            }

            let requests: Vec<StreamRequest> = cursors
                .iter()
                .enumerate()
                .filter(|(_, cursor)| cursor.has_more)
                .map(|(stream, cursor)| StreamRequest {
                    stream,
                    after: cursor.token.clone(),
                })
                .collect();

            // Requested streams that come back missing are treated as done.
            for request in &requests {
                cursors[request.stream].has_more = false;
            }

            match source.fetch_streams(&requests).await {
                Ok(pages) => {
                    let added = absorb(pages, &mut cursors, &mut items);
                    budget.record(added);
                    state = next_state(&cursors, &budget);
                    if state == PaginationState::Active && budget.cap_reached() {
                        state = PaginationState::BudgetReached;
                    }
                    tracing::debug!(
                        page = budget.pages_fetched(),
                        added,
                        accumulated = budget.accumulated(),
                        state = ?state,
                        "Fetched additional page"
                    );
                }
                Err(e) if e.keeps_partial_results() => {
                    tracing::warn!(
                        page = budget.pages_fetched(),
                        error = %short_error_message(&e),
                        "Page fetch failed; keeping partial results"
                    );
                    state = PaginationState::Aborted;
                    failed_streams = requests.iter().map(|r| r.stream).collect();
                    error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(CursorOutcome {
            items,
            state,
            additional_pages: budget.pages_fetched(),
            page_cap: budget.max_pages(),
            error,
            failed_streams,
        })
    }
}

fn absorb<T>(pages: Vec<StreamPage<T>>, cursors: &mut [PageCursor], items: &mut Vec<T>) -> usize {
    let mut added = 0;
    for page in pages {
        let Some(slot) = cursors.get_mut(page.stream) else {
            tracing::debug!(stream = page.stream, "Ignoring page for unknown stream");
            continue;
        };
        *slot = PageCursor {
            has_more: page.cursor.has_more && page.cursor.token.is_some(),
            token: page.cursor.token,
        };
        added += page.items.len();
        items.extend(page.items);
    }
    added
}

fn next_state(cursors: &[PageCursor], budget: &FetchBudget) -> PaginationState {
    if budget.target_reached() {
        PaginationState::TargetReached
    } else if cursors.iter().any(|c| c.has_more) {
        PaginationState::Active
    } else {
        PaginationState::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Synthetic multi-stream source.
    ///
    /// Stream `i` has `pages[i]` pages of `per_page` items each; the cursor
    /// token is the next page number. Call numbers listed in `fail_on` error.
    struct SyntheticSource {
        pages: Vec<u32>,
        per_page: usize,
        fail_on: Vec<usize>,
        fatal_on: Vec<usize>,
        calls: Mutex<Vec<Vec<StreamRequest>>>,
    }

    impl SyntheticSource {
        fn new(pages: Vec<u32>, per_page: usize) -> Self {
            Self {
                pages,
                per_page,
                fail_on: Vec::new(),
                fatal_on: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on.push(call);
            self
        }

        fn fatal_on(mut self, call: usize) -> Self {
            self.fatal_on.push(call);
            self
        }

        fn calls(&self) -> Vec<Vec<StreamRequest>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CursorPageSource for SyntheticSource {
        type Item = (usize, u32, usize);

        async fn fetch_streams(
            &self,
            requests: &[StreamRequest],
        ) -> Result<Vec<StreamPage<Self::Item>>> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(requests.to_vec());
                calls.len()
            };
            if self.fail_on.contains(&call) {
                return Err(ActivityError::protocol(502, "bad gateway"));
            }
            if self.fatal_on.contains(&call) {
                return Err(ActivityError::AuthRequired);
            }

            Ok(requests
                .iter()
                .map(|req| {
                    let page: u32 = req.after.as_deref().map_or(1, |t| t.parse().unwrap());
                    let total = self.pages[req.stream];
                    let items = if page <= total {
                        (0..self.per_page).map(|i| (req.stream, page, i)).collect()
                    } else {
                        Vec::new()
                    };
                    let has_more = page < total;
                    StreamPage {
                        stream: req.stream,
                        items,
                        cursor: PageCursor::from_page_info(
                            has_more,
                            has_more.then(|| (page + 1).to_string()),
                        ),
                    }
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_exhausted_streams_are_skipped() {
        let source = SyntheticSource::new(vec![3, 1], 5);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let outcome = AdaptivePaginator::new(1000, &tiers, &cancel)
            .run(&source, 2)
            .await
            .expect("first page succeeds");

        assert_eq!(outcome.state, PaginationState::Exhausted);
        assert_eq!(outcome.items.len(), 20);
        assert_eq!(outcome.additional_pages, 2);
        assert_eq!(outcome.page_cap, 8);
        assert!(outcome.error.is_none());

        let calls = source.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].len(), 2);
        for later in &calls[1..] {
            assert_eq!(later.len(), 1);
            assert_eq!(later[0].stream, 0);
        }
        assert_eq!(calls[2][0].after.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_budget_cap_stops_long_streams() {
        let source = SyntheticSource::new(vec![100], 10);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let outcome = AdaptivePaginator::new(10_000, &tiers, &cancel)
            .run(&source, 1)
            .await
            .unwrap();

        assert_eq!(outcome.state, PaginationState::BudgetReached);
        assert_eq!(outcome.page_cap, 8);
        assert_eq!(outcome.additional_pages, 8);
        assert_eq!(outcome.items.len(), 90);
        assert_eq!(source.calls().len(), 9);
    }

    #[tokio::test]
    async fn test_target_reached_mid_loop() {
        let source = SyntheticSource::new(vec![50], 30);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let outcome = AdaptivePaginator::new(100, &tiers, &cancel)
            .run(&source, 1)
            .await
            .unwrap();

        assert_eq!(outcome.state, PaginationState::TargetReached);
        assert_eq!(outcome.page_cap, 6);
        assert_eq!(outcome.additional_pages, 3);
        assert_eq!(outcome.items.len(), 120);
    }

    #[tokio::test]
    async fn test_target_met_by_first_page_fetches_nothing_more() {
        let source = SyntheticSource::new(vec![10, 10], 100);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let outcome = AdaptivePaginator::new(150, &tiers, &cancel)
            .run(&source, 2)
            .await
            .unwrap();

        assert_eq!(outcome.state, PaginationState::TargetReached);
        assert_eq!(outcome.page_cap, 0);
        assert_eq!(outcome.additional_pages, 0);
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_later_failure_keeps_partial_results() {
        let source = SyntheticSource::new(vec![10], 5).failing_on(3);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let outcome = AdaptivePaginator::new(1000, &tiers, &cancel)
            .run(&source, 1)
            .await
            .unwrap();

        assert_eq!(outcome.state, PaginationState::Aborted);
        assert_eq!(outcome.items.len(), 10);
        assert!(matches!(
            outcome.error,
            Some(ActivityError::Protocol { status: 502, .. })
        ));
        assert_eq!(outcome.failed_streams, vec![0]);
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_streams_name_only_live_streams() {
        // Stream 0 ends after its first page; the second call advances only
        // stream 1 and fails.
        let source = SyntheticSource::new(vec![1, 10], 5).failing_on(2);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let outcome = AdaptivePaginator::new(1000, &tiers, &cancel)
            .run(&source, 2)
            .await
            .unwrap();

        assert_eq!(outcome.state, PaginationState::Aborted);
        assert_eq!(outcome.items.len(), 10);
        assert_eq!(outcome.failed_streams, vec![1]);
    }

    #[tokio::test]
    async fn test_operation_level_failure_after_first_page_propagates() {
        let source = SyntheticSource::new(vec![10], 5).fatal_on(2);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let result = AdaptivePaginator::new(1000, &tiers, &cancel)
            .run(&source, 1)
            .await;

        assert!(matches!(result, Err(ActivityError::AuthRequired)));
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_an_error() {
        let source = SyntheticSource::new(vec![10], 5).failing_on(1);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        let result = AdaptivePaginator::new(1000, &tiers, &cancel)
            .run(&source, 1)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancellation_keeps_first_page() {
        let source = SyntheticSource::new(vec![10], 5);
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let first = source
            .fetch_streams(&[StreamRequest {
                stream: 0,
                after: None,
            }])
            .await
            .unwrap();
        let outcome = AdaptivePaginator::new(1000, &tiers, &cancel)
            .resume(&source, 1, first)
            .await
            .unwrap();

        assert_eq!(outcome.state, PaginationState::Aborted);
        assert!(matches!(outcome.error, Some(ActivityError::Cancelled)));
        assert!(outcome.failed_streams.is_empty());
        assert_eq!(outcome.items.len(), 5);
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_never_exceeds_tier_cap() {
        let tiers = BudgetTiers::default();
        let cancel = CancellationToken::new();

        for per_page in [1usize, 7, 19, 20, 49, 60, 99, 150] {
            let source = SyntheticSource::new(vec![1000, 1000], per_page);
            let outcome = AdaptivePaginator::new(100_000, &tiers, &cancel)
                .run(&source, 2)
                .await
                .unwrap();
            let expected_cap = tiers.cap_for(per_page * 2);
            assert_eq!(outcome.page_cap, expected_cap);
            assert!(outcome.additional_pages <= expected_cap);
            assert_eq!(outcome.state, PaginationState::BudgetReached);
            assert_eq!(source.calls().len() as u32, 1 + outcome.additional_pages);
        }
    }

    #[test]
    fn test_page_cursor_without_token_is_exhausted() {
        let cursor = PageCursor::from_page_info(true, None);
        assert!(!cursor.has_more);
        let cursor = PageCursor::from_page_info(true, Some("abc".to_string()));
        assert!(cursor.has_more);
        assert_eq!(cursor.token.as_deref(), Some("abc"));
    }
}

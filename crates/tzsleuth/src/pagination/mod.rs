//! Pagination engines.
//!
//! - [`cursor`]: adaptive multi-stream cursor loop sized by [`budget`]
//! - [`offset`]: sequential page-number loop with a hard cap
//! - [`parallel`]: concurrent fan-out over known page numbers

pub mod budget;
pub mod cursor;
pub mod offset;
pub mod parallel;

pub use budget::{BudgetTier, BudgetTiers, FetchBudget};
pub use cursor::{
    AdaptivePaginator, CursorOutcome, CursorPageSource, PageCursor, PaginationState, StreamPage,
    StreamRequest,
};
pub use offset::{OffsetOutcome, OffsetPageSource, paginate_offset};
pub use parallel::{MAX_PARALLEL_PAGES, ParallelOutcome, fetch_pages_parallel};

use std::marker::PhantomData;

use async_trait::async_trait;
use log::debug;

use crate::error::AuditError;
use crate::records::Cursored;

/// Sort order for a ledger page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// One ledger query: at most `first` records, optionally bounded below by
/// `min_cursor`, ordered by the entity's cursor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub first: u32,
    pub min_cursor: Option<u64>,
    pub direction: OrderDirection,
}

/// Paged access to one ledger entity.
#[async_trait]
pub trait PageFetcher<T: Cursored>: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<T>, AuditError>;
}

/// Cursor-windowed scan over a ledger entity.
///
/// A probe query (descending, page size 1) fixes the maximum cursor up front,
/// then ascending windows constrained to `cursor >= window_start` walk the
/// ledger from cursor 1. Each window advances to one past the highest cursor
/// actually served, so sparse numbering cannot double-count a record; with
/// dense 1-based cursors this is the same as stepping by the page size. An
/// empty ledger (no records, or a lone record at cursor 0) terminates the
/// scan without issuing any windowed query. Records appended after the probe
/// are left for the next run.
pub struct LedgerScan<'a, T, F> {
    fetcher: &'a F,
    page_size: u32,
    next_cursor: u64,
    max_cursor: Option<u64>,
    done: bool,
    _entity: PhantomData<T>,
}

impl<'a, T: Cursored, F: PageFetcher<T>> LedgerScan<'a, T, F> {
    /// Probe the maximum cursor and position the scan at cursor 1.
    pub async fn begin(fetcher: &'a F, page_size: u32) -> Result<LedgerScan<'a, T, F>, AuditError> {
        Self::begin_at(fetcher, page_size, 1).await
    }

    /// Probe the maximum cursor and position the scan at `start_cursor`.
    pub async fn begin_at(
        fetcher: &'a F,
        page_size: u32,
        start_cursor: u64,
    ) -> Result<LedgerScan<'a, T, F>, AuditError> {
        let probe = fetcher
            .fetch_page(PageRequest {
                first: 1,
                min_cursor: None,
                direction: OrderDirection::Desc,
            })
            .await?;

        let max_cursor = probe
            .first()
            .map(|record| record.cursor())
            .filter(|cursor| *cursor > 0);

        Ok(LedgerScan {
            fetcher,
            page_size: page_size.max(1),
            next_cursor: start_cursor.max(1),
            max_cursor,
            done: max_cursor.is_none(),
            _entity: PhantomData,
        })
    }

    /// Highest cursor the probe observed; 0 for an empty ledger.
    pub fn last_cursor(&self) -> u64 {
        self.max_cursor.unwrap_or(0)
    }

    /// Fetch the next ascending window, or `None` once the ledger is
    /// exhausted. Records within a page arrive in ascending cursor order.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, AuditError> {
        let max = match self.max_cursor {
            Some(max) if !self.done && self.next_cursor <= max => max,
            _ => {
                self.done = true;
                return Ok(None);
            }
        };

        let window_start = self.next_cursor;
        let page = self
            .fetcher
            .fetch_page(PageRequest {
                first: self.page_size,
                min_cursor: Some(window_start),
                direction: OrderDirection::Asc,
            })
            .await?;

        let last = match page.last() {
            Some(record) => record.cursor(),
            None => {
                self.done = true;
                return Ok(None);
            }
        };
        if last < window_start {
            return Err(AuditError::malformed(
                "ledger scan",
                format!(
                    "page ending at cursor {} does not advance past {}",
                    last, window_start
                ),
            ));
        }

        debug!(
            "scan window {}..={}: {} records (max {})",
            window_start,
            last,
            page.len(),
            max
        );

        // A short page means the ledger ran out before the window filled.
        if (page.len() as u32) < self.page_size {
            self.done = true;
        }
        match last.checked_add(1) {
            Some(next) => self.next_cursor = next,
            None => self.done = true,
        }

        Ok(Some(page))
    }

    /// Drain the scan into one vector. Intended for small ledgers and tests;
    /// callers that only need running sums should consume pages directly.
    pub async fn collect_all(mut self) -> Result<Vec<T>, AuditError> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }
        Ok(records)
    }
}

use crate::lister::ListingError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Offset window over the merged result set. Every facet query fetches
/// `limit + 1` rows at the same offset; the extra row only signals that a
/// further page exists and never survives truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: i64,
    cursor: i64,
}

impl Pagination {
    pub fn from_request(cursor: Option<i64>, limit: Option<i64>) -> Result<Self, ListingError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ListingError::InvalidRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        let cursor = cursor.unwrap_or(0);
        if cursor < 0 {
            return Err(ListingError::InvalidRequest(format!(
                "cursor must not be negative, got {cursor}"
            )));
        }
        Ok(Self { limit, cursor })
    }

    /// Rows kept in the response.
    pub fn limit(&self) -> usize {
        self.limit as usize
    }

    /// Rows requested per facet, lookahead included.
    pub fn take_with_lookahead(&self) -> i64 {
        self.limit + 1
    }

    pub fn offset(&self) -> i64 {
        self.cursor
    }

    /// Cursor for the following page, present only when rows beyond the
    /// current window were seen.
    pub fn next_cursor(&self, merged_count: usize) -> Option<i64> {
        (merged_count as i64 > self.limit).then(|| self.cursor + self.limit)
    }
}

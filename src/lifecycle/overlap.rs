//! Closed-interval date overlap detection.
//!
//! Both ends of a [`DateRange`] are inclusive, so a request ending on the 17th and another
//! starting on the 17th share a day and conflict.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::VacationRequest;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns `None` unless `start` is strictly before `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Rebuilds a range from a persisted row, whose ordering the schema already enforces.
    pub(crate) fn from_stored(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `[a, b]` and `[c, d]` overlap iff `a <= d && c <= b`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Every non-rejected request in `existing` whose dates intersect `candidate`.
///
/// `exclude_id` drops one request from the comparison, for revising a request against
/// its siblings.
pub fn find_overlapping<'a, I>(
    existing: I,
    candidate: &DateRange,
    exclude_id: Option<u64>,
) -> Vec<&'a VacationRequest>
where
    I: IntoIterator<Item = &'a VacationRequest>,
{
    existing
        .into_iter()
        .filter(|request| request.status.blocks_dates())
        .filter(|request| Some(request.id) != exclude_id)
        .filter(|request| request.range().overlaps(candidate))
        .collect()
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

use crate::lifecycle::overlap::DateRange;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Approved and rejected are terminal; pending may move to either.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// Rejected requests release their dates for later overlap checks.
    pub fn blocks_dates(&self) -> bool {
        !matches!(self, RequestStatus::Rejected)
    }
}

/// A vacation request joined with its owner's and validator's display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 1,
    "start_date": "2026-12-20",
    "end_date": "2026-12-30",
    "reason": "Christmas vacation with family",
    "status": "approved",
    "comments": "Enjoy!",
    "validator_id": 3,
    "created_at": "2026-11-01T09:00:00Z",
    "updated_at": "2026-11-02T10:00:00Z",
    "user_name": "John Doe",
    "user_email": "john.doe@company.com",
    "validator_name": "Mike Johnson"
}))]
pub struct VacationRequest {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: RequestStatus,
    pub comments: Option<String>,
    pub validator_id: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub validator_name: Option<String>,
}

impl VacationRequest {
    pub fn range(&self) -> DateRange {
        DateRange::from_stored(self.start_date, self.end_date)
    }
}

/// Body of `POST /vacation-requests`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateVacationRequest {
    #[schema(example = 1)]
    #[validate(range(min = 1, message = "Valid user ID is required"))]
    pub user_id: u64,
    #[schema(example = "2026-12-20", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-12-30", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Christmas vacation with family", nullable = true)]
    #[validate(length(max = 500, message = "Reason must not exceed 500 characters"))]
    pub reason: Option<String>,
}

/// Body of the approve and reject endpoints.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewVacationRequest {
    #[schema(example = 3)]
    #[validate(range(min = 1, message = "Valid validator ID is required"))]
    pub validator_id: u64,
    #[schema(example = "Approved - enjoy your trip!", nullable = true)]
    #[validate(length(max = 1000, message = "Comments must not exceed 1000 characters"))]
    pub comments: Option<String>,
}

/// Row handed to the store on creation; always starts pending.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVacationRequest {
    pub user_id: u64,
    pub range: DateRange,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_moves() {
        use RequestStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        for from in [Approved, Rejected] {
            assert!(from.is_terminal());
            for to in [Pending, Approved, Rejected] {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn rejected_does_not_block_dates() {
        assert!(RequestStatus::Pending.blocks_dates());
        assert!(RequestStatus::Approved.blocks_dates());
        assert!(!RequestStatus::Rejected.blocks_dates());
    }

    #[test]
    fn status_parses_query_values() {
        assert_eq!("approved".parse::<RequestStatus>().unwrap(), RequestStatus::Approved);
        assert!("invalid".parse::<RequestStatus>().is_err());
    }
}

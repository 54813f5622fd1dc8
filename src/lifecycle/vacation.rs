use std::sync::Arc;

use tracing::{info, instrument, warn};
use validator::Validate;

use super::clock::Clock;
use super::overlap::DateRange;
use crate::error::{Action, Entity, LifecycleError};
use crate::model::{
    CreateVacationRequest, NewVacationRequest, RequestStatus, ReviewVacationRequest,
    VacationRequest,
};
use crate::store::{InsertOutcome, RequestRepository, StoreError, UserDirectory};
use crate::utils::user_cache::UserCache;

/// The vacation-request state machine: pending requests are approved, rejected, or deleted;
/// approved and rejected requests never change again.
pub struct VacationService {
    requests: Arc<dyn RequestRepository>,
    users: Arc<dyn UserDirectory>,
    user_cache: UserCache,
    clock: Arc<dyn Clock>,
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

impl VacationService {
    pub fn new(
        requests: Arc<dyn RequestRepository>,
        users: Arc<dyn UserDirectory>,
        user_cache: UserCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            requests,
            users,
            user_cache,
            clock,
        }
    }

    #[instrument(name = "vacation_create", skip(self, input), fields(user_id = input.user_id))]
    pub async fn create(
        &self,
        input: CreateVacationRequest,
    ) -> Result<VacationRequest, LifecycleError> {
        input.validate()?;

        let owner = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(LifecycleError::NotFound(Entity::User))?;

        let range =
            DateRange::new(input.start_date, input.end_date).ok_or(LifecycleError::InvalidRange)?;

        if range.start() < self.clock.today() {
            return Err(LifecycleError::PastDate);
        }

        let overlapping = self
            .requests
            .find_overlapping(owner.id, &range, None)
            .await?;
        if !overlapping.is_empty() {
            info!(conflicts = overlapping.len(), "Overlapping vacation request refused");
            return Err(LifecycleError::Conflict(overlapping));
        }

        let record = NewVacationRequest {
            user_id: owner.id,
            range,
            reason: non_blank(input.reason),
        };

        match self.requests.insert(record).await {
            Ok(InsertOutcome::Created(created)) => {
                info!(request_id = created.id, "Vacation request created");
                Ok(created)
            }
            // Lost a race against a concurrent create for the same user.
            Ok(InsertOutcome::Overlapping(overlapping)) => {
                warn!(conflicts = overlapping.len(), "Overlap detected at write time");
                Err(LifecycleError::Conflict(overlapping))
            }
            Err(StoreError::MissingReference) => Err(LifecycleError::NotFound(Entity::User)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn approve(
        &self,
        id: u64,
        review: ReviewVacationRequest,
    ) -> Result<VacationRequest, LifecycleError> {
        self.review(id, review, RequestStatus::Approved).await
    }

    pub async fn reject(
        &self,
        id: u64,
        review: ReviewVacationRequest,
    ) -> Result<VacationRequest, LifecycleError> {
        self.review(id, review, RequestStatus::Rejected).await
    }

    #[instrument(
        name = "vacation_review",
        skip(self, review),
        fields(validator_id = review.validator_id)
    )]
    async fn review(
        &self,
        id: u64,
        review: ReviewVacationRequest,
        status: RequestStatus,
    ) -> Result<VacationRequest, LifecycleError> {
        review.validate()?;
        let action = Action::review(status);

        let existing = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound(Entity::VacationRequest))?;

        if !existing.status.can_transition_to(status) {
            return Err(LifecycleError::InvalidTransition(action));
        }

        let validator = self
            .user_cache
            .get_or_load(review.validator_id, self.users.as_ref())
            .await?;
        if !validator.is_some_and(|v| v.role.can_review()) {
            return Err(LifecycleError::InvalidValidator);
        }

        let comments = non_blank(review.comments);
        let updated = self
            .requests
            .update_status(id, status, review.validator_id, comments.as_deref())
            .await?
            // Reviewed or deleted by someone else since the read above.
            .ok_or(LifecycleError::InvalidTransition(action))?;

        info!(%status, "Vacation request reviewed");
        Ok(updated)
    }

    #[instrument(name = "vacation_delete", skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), LifecycleError> {
        let existing = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound(Entity::VacationRequest))?;

        if existing.status != RequestStatus::Pending {
            return Err(LifecycleError::InvalidTransition(Action::Delete));
        }

        if !self.requests.delete(id).await? {
            return Err(LifecycleError::InvalidTransition(Action::Delete));
        }

        info!("Vacation request deleted");
        Ok(())
    }

    pub async fn get(&self, id: u64) -> Result<VacationRequest, LifecycleError> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound(Entity::VacationRequest))
    }

    pub async fn list(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<VacationRequest>, LifecycleError> {
        let requests = match status {
            Some(status) => self.requests.find_by_status(status).await?,
            None => self.requests.find_all().await?,
        };
        Ok(requests)
    }

    pub async fn list_for_user(&self, user_id: u64) -> Result<Vec<VacationRequest>, LifecycleError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(LifecycleError::NotFound(Entity::User));
        }
        Ok(self.requests.find_by_user_id(user_id).await?)
    }
}

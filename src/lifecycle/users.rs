use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::error::{Entity, LifecycleError};
use crate::model::user::normalize_email;
use crate::model::{NewUser, Role, User, UserUpdate};
use crate::store::{StoreError, UserDirectory};
use crate::utils::email_filter::EmailFilter;
use crate::utils::user_cache::UserCache;

/// Administrative management of requesters and validators.
pub struct UserService {
    users: Arc<dyn UserDirectory>,
    cache: UserCache,
    emails: Arc<EmailFilter>,
}

fn duplicate_as_conflict(err: StoreError) -> LifecycleError {
    match err {
        StoreError::Duplicate => LifecycleError::DuplicateEmail,
        other => other.into(),
    }
}

impl UserService {
    pub fn new(users: Arc<dyn UserDirectory>, cache: UserCache, emails: Arc<EmailFilter>) -> Self {
        Self {
            users,
            cache,
            emails,
        }
    }

    /// true  => email is taken
    /// false => email is available
    pub async fn email_taken(&self, email: &str) -> Result<bool, LifecycleError> {
        // Cuckoo filter: a miss is a definite "available".
        if !self.emails.might_exist(email) {
            return Ok(false);
        }
        Ok(self.users.find_by_email(email).await?.is_some())
    }

    #[instrument(name = "user_create", skip(self, input), fields(role = %input.role))]
    pub async fn create(&self, mut input: NewUser) -> Result<User, LifecycleError> {
        input.email = normalize_email(&input.email);
        input.validate()?;

        if self.email_taken(&input.email).await? {
            return Err(LifecycleError::DuplicateEmail);
        }

        let user = self
            .users
            .create(input)
            .await
            .map_err(duplicate_as_conflict)?;
        self.emails.insert(&user.email);

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    #[instrument(name = "user_update", skip(self, update))]
    pub async fn update(&self, id: u64, mut update: UserUpdate) -> Result<User, LifecycleError> {
        update.email = update.email.as_deref().map(normalize_email);
        update.validate()?;

        let existing = self.get(id).await?;
        if update.is_empty() {
            return Ok(existing);
        }

        let new_email = update.email.clone().filter(|email| *email != existing.email);
        if let Some(email) = &new_email {
            if self.email_taken(email).await? {
                return Err(LifecycleError::DuplicateEmail);
            }
        }

        let user = self
            .users
            .update(id, update)
            .await
            .map_err(duplicate_as_conflict)?
            .ok_or(LifecycleError::NotFound(Entity::User))?;

        if new_email.is_some() {
            self.emails.insert(&user.email);
            self.emails.remove(&existing.email);
        }
        self.cache.invalidate(id).await;

        info!("User updated");
        Ok(user)
    }

    #[instrument(name = "user_delete", skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), LifecycleError> {
        let existing = self.get(id).await?;

        if !self.users.delete(id).await? {
            return Err(LifecycleError::NotFound(Entity::User));
        }
        self.emails.remove(&existing.email);
        self.cache.invalidate(id).await;

        info!(role = %existing.role, "User deleted");
        Ok(())
    }

    pub async fn get(&self, id: u64) -> Result<User, LifecycleError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound(Entity::User))
    }

    pub async fn list(&self) -> Result<Vec<User>, LifecycleError> {
        Ok(self.users.find_all().await?)
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>, LifecycleError> {
        Ok(self.users.find_by_role(role).await?)
    }
}

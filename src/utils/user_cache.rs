use std::time::Duration;

use moka::future::Cache;
use tracing::info;

use crate::model::{Role, User};
use crate::store::{StoreError, UserDirectory};

/// TTL cache of users by id, consulted for validator checks on approve/reject.
///
/// Roles never change, so a cached entry can only go stale through rename or deletion;
/// both paths invalidate.
#[derive(Clone)]
pub struct UserCache {
    cache: Cache<u64, User>,
}

impl UserCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, id: u64) -> Option<User> {
        self.cache.get(&id).await
    }

    pub async fn insert(&self, user: User) {
        self.cache.insert(user.id, user).await;
    }

    pub async fn invalidate(&self, id: u64) {
        self.cache.invalidate(&id).await;
    }

    /// Cache hit, else directory lookup (cached on success). Misses are not cached.
    pub async fn get_or_load(
        &self,
        id: u64,
        directory: &dyn UserDirectory,
    ) -> Result<Option<User>, StoreError> {
        if let Some(user) = self.get(id).await {
            return Ok(Some(user));
        }
        let user = directory.find_by_id(id).await?;
        if let Some(user) = &user {
            self.insert(user.clone()).await;
        }
        Ok(user)
    }

    /// Preload every validator, since they are the users looked up most.
    pub async fn warmup(&self, directory: &dyn UserDirectory) -> Result<usize, StoreError> {
        let validators = directory.find_by_role(Role::Validator).await?;
        let total = validators.len();

        let inserts: Vec<_> = validators.into_iter().map(|u| self.insert(u)).collect();
        futures::future::join_all(inserts).await;

        info!(total, "User cache warmup complete");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewUser;
    use crate::store::MemoryStore;

    #[actix_web::test]
    async fn loads_through_and_invalidates() {
        let store = MemoryStore::new();
        let mike = UserDirectory::create(
            &store,
            NewUser {
                name: "Mike Johnson".into(),
                email: "mike@company.com".into(),
                role: Role::Validator,
            },
        )
        .await
        .unwrap();

        let cache = UserCache::new(100, Duration::from_secs(60));
        assert!(cache.get(mike.id).await.is_none());
        assert_eq!(cache.get_or_load(mike.id, &store).await.unwrap(), Some(mike.clone()));
        assert_eq!(cache.get(mike.id).await, Some(mike.clone()));

        cache.invalidate(mike.id).await;
        assert!(cache.get(mike.id).await.is_none());
        assert!(cache.get_or_load(999, &store).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn warmup_preloads_validators_only() {
        let store = MemoryStore::new();
        for (name, email, role) in [
            ("Mike Johnson", "mike@company.com", Role::Validator),
            ("John Doe", "john@company.com", Role::Requester),
        ] {
            UserDirectory::create(
                &store,
                NewUser {
                    name: name.into(),
                    email: email.into(),
                    role,
                },
            )
            .await
            .unwrap();
        }

        let cache = UserCache::new(100, Duration::from_secs(60));
        assert_eq!(cache.warmup(&store).await.unwrap(), 1);
    }
}

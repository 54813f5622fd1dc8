use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use tracing::info;

use crate::model::user::normalize_email;
use crate::store::UserDirectory;

/// Default expected capacity and false-positive rate.
/// Tune these based on real user counts.
pub const DEFAULT_CAPACITY: usize = 100_000;
pub const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Membership filter over registered emails.
///
/// `might_exist == false` is authoritative: the email is free. `true` may be a false
/// positive and must be confirmed against the directory.
pub struct EmailFilter {
    filter: RwLock<CuckooFilter<String>>,
}

impl EmailFilter {
    pub fn new(capacity: usize) -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(capacity, FALSE_POSITIVE_RATE)),
        }
    }

    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    pub fn insert(&self, email: &str) {
        let email = normalize_email(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
    }

    /// Only call with an email that was previously inserted.
    pub fn remove(&self, email: &str) {
        let email = normalize_email(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&email);
    }

    /// Warm up the filter with every registered email, in batches.
    pub async fn warmup(&self, directory: &dyn UserDirectory, batch_size: usize) -> Result<usize> {
        let users = directory
            .find_all()
            .await
            .context("loading users for email filter warmup")?;

        let mut total = 0usize;
        for batch in users.chunks(batch_size.max(1)) {
            self.insert_batch(batch.iter().map(|u| u.email.as_str()));
            total += batch.len();
        }

        info!(total, "Email filter warmup complete");
        Ok(total)
    }

    fn insert_batch<'a>(&self, emails: impl Iterator<Item = &'a str>) {
        let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
        for email in emails {
            filter.add(&normalize_email(email));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewUser, Role};
    use crate::store::MemoryStore;

    #[test]
    fn insert_and_remove_are_case_insensitive() {
        let filter = EmailFilter::new(1_000);
        assert!(!filter.might_exist("jane@company.com"));

        filter.insert("Jane@Company.com");
        assert!(filter.might_exist("jane@company.com"));

        filter.remove("JANE@company.com");
        assert!(!filter.might_exist("jane@company.com"));
    }

    #[actix_web::test]
    async fn warmup_loads_directory() {
        let store = MemoryStore::new();
        for (name, email) in [("John Doe", "john@company.com"), ("Jane Smith", "jane@company.com")] {
            UserDirectory::create(
                &store,
                NewUser {
                    name: name.into(),
                    email: email.into(),
                    role: Role::Requester,
                },
            )
            .await
            .unwrap();
        }

        let filter = EmailFilter::new(1_000);
        assert_eq!(filter.warmup(&store, 1).await.unwrap(), 2);
        assert!(filter.might_exist("john@company.com"));
        assert!(filter.might_exist("jane@company.com"));
    }
}

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{InsertOutcome, RequestRepository, StoreError, UserDirectory};
use crate::lifecycle::overlap::{self, DateRange};
use crate::model::user::normalize_email;
use crate::model::{
    NewUser, NewVacationRequest, RequestStatus, Role, User, UserUpdate, VacationRequest,
};

#[derive(Debug, Clone)]
struct RequestRow {
    id: u64,
    user_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
    status: RequestStatus,
    comments: Option<String>,
    validator_id: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    requests: BTreeMap<u64, RequestRow>,
    next_user_id: u64,
    next_request_id: u64,
}

impl Tables {
    fn view(&self, row: &RequestRow) -> Option<VacationRequest> {
        let owner = self.users.get(&row.user_id)?;
        let validator_name = row
            .validator_id
            .and_then(|id| self.users.get(&id))
            .map(|v| v.name.clone());
        Some(VacationRequest {
            id: row.id,
            user_id: row.user_id,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason.clone(),
            status: row.status,
            comments: row.comments.clone(),
            validator_id: row.validator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user_name: owner.name.clone(),
            user_email: owner.email.clone(),
            validator_name,
        })
    }

    /// Views matching `keep`, newest first (ties broken by id).
    fn views<F>(&self, keep: F) -> Vec<VacationRequest>
    where
        F: Fn(&RequestRow) -> bool,
    {
        let mut out: Vec<VacationRequest> = self
            .requests
            .values()
            .filter(|row| keep(row))
            .filter_map(|row| self.view(row))
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }

    fn overlapping(
        &self,
        user_id: u64,
        range: &DateRange,
        exclude_id: Option<u64>,
    ) -> Vec<VacationRequest> {
        let owned = self.views(|row| row.user_id == user_id);
        overlap::find_overlapping(&owned, range, exclude_id)
            .into_iter()
            .cloned()
            .collect()
    }

    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// Process-local store backing both the request repository and the user directory.
///
/// Suitable for development and tests; everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<VacationRequest>, StoreError> {
        let tables = self.read()?;
        Ok(tables.requests.get(&id).and_then(|row| tables.view(row)))
    }

    async fn find_by_user_id(&self, user_id: u64) -> Result<Vec<VacationRequest>, StoreError> {
        Ok(self.read()?.views(|row| row.user_id == user_id))
    }

    async fn find_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<VacationRequest>, StoreError> {
        Ok(self.read()?.views(|row| row.status == status))
    }

    async fn find_all(&self) -> Result<Vec<VacationRequest>, StoreError> {
        Ok(self.read()?.views(|_| true))
    }

    async fn find_overlapping(
        &self,
        user_id: u64,
        range: &DateRange,
        exclude_id: Option<u64>,
    ) -> Result<Vec<VacationRequest>, StoreError> {
        Ok(self.read()?.overlapping(user_id, range, exclude_id))
    }

    async fn insert(&self, record: NewVacationRequest) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&record.user_id) {
            return Err(StoreError::MissingReference);
        }

        let overlapping = tables.overlapping(record.user_id, &record.range, None);
        if !overlapping.is_empty() {
            return Ok(InsertOutcome::Overlapping(overlapping));
        }

        tables.next_request_id += 1;
        let id = tables.next_request_id;
        let now = Utc::now();
        let row = RequestRow {
            id,
            user_id: record.user_id,
            start_date: record.range.start(),
            end_date: record.range.end(),
            reason: record.reason,
            status: RequestStatus::Pending,
            comments: None,
            validator_id: None,
            created_at: now,
            updated_at: now,
        };
        let view = tables.view(&row);
        tables.requests.insert(id, row);
        view.map(InsertOutcome::Created)
            .ok_or(StoreError::MissingReference)
    }

    async fn update_status(
        &self,
        id: u64,
        status: RequestStatus,
        validator_id: u64,
        comments: Option<&str>,
    ) -> Result<Option<VacationRequest>, StoreError> {
        let mut tables = self.write()?;
        let Some(row) = tables.requests.get_mut(&id) else {
            return Ok(None);
        };
        if !row.status.can_transition_to(status) {
            return Ok(None);
        }

        row.status = status;
        row.validator_id = Some(validator_id);
        if let Some(comments) = comments {
            row.comments = Some(comments.to_string());
        }
        row.updated_at = Utc::now();

        let row = row.clone();
        Ok(tables.view(&row))
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        match tables.requests.get(&id) {
            Some(row) if row.status == RequestStatus::Pending => {
                tables.requests.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .read()?
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        let email = normalize_email(&user.email);
        if tables.email_taken(&email, None) {
            return Err(StoreError::Duplicate);
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            name: user.name,
            email,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: u64, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut tables = self.write()?;
        let email = update.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Duplicate);
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }

        tables.requests.retain(|_, row| row.user_id != id);
        for row in tables.requests.values_mut() {
            if row.validator_id == Some(id) {
                row.validator_id = None;
            }
        }
        Ok(true)
    }
}

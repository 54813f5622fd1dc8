use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

use super::{InsertOutcome, RequestRepository, StoreError, UserDirectory};
use crate::lifecycle::overlap::{self, DateRange};
use crate::model::user::normalize_email;
use crate::model::{
    NewUser, NewVacationRequest, RequestStatus, Role, User, UserUpdate, VacationRequest,
};
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update};

const REQUEST_VIEW: &str = r#"
    SELECT
        vr.id,
        vr.user_id,
        vr.start_date,
        vr.end_date,
        vr.reason,
        vr.status,
        vr.comments,
        vr.validator_id,
        vr.created_at,
        vr.updated_at,
        u.name AS user_name,
        u.email AS user_email,
        v.name AS validator_name
    FROM vacation_requests vr
    JOIN users u ON u.id = vr.user_id
    LEFT JOIN users v ON v.id = vr.validator_id
"#;

const NEWEST_FIRST: &str = " ORDER BY vr.created_at DESC, vr.id DESC";

const USER_COLUMNS: &str = "SELECT id, name, email, role, created_at, updated_at FROM users";

/// sqlx-backed store over the `users` and `vacation_requests` tables.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn requests_where(
        &self,
        clause: &str,
        id: Option<u64>,
        status: Option<RequestStatus>,
    ) -> Result<Vec<VacationRequest>, StoreError> {
        let sql = format!("{REQUEST_VIEW}{clause}{NEWEST_FIRST}");
        let mut query = sqlx::query_as::<_, VacationRequest>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        if let Some(status) = status {
            query = query.bind(status.to_string());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl RequestRepository for MySqlStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<VacationRequest>, StoreError> {
        let sql = format!("{REQUEST_VIEW} WHERE vr.id = ?");
        let request = sqlx::query_as::<_, VacationRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }

    async fn find_by_user_id(&self, user_id: u64) -> Result<Vec<VacationRequest>, StoreError> {
        self.requests_where(" WHERE vr.user_id = ?", Some(user_id), None)
            .await
    }

    async fn find_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<VacationRequest>, StoreError> {
        self.requests_where(" WHERE vr.status = ?", None, Some(status))
            .await
    }

    async fn find_all(&self) -> Result<Vec<VacationRequest>, StoreError> {
        self.requests_where("", None, None).await
    }

    async fn find_overlapping(
        &self,
        user_id: u64,
        range: &DateRange,
        exclude_id: Option<u64>,
    ) -> Result<Vec<VacationRequest>, StoreError> {
        let owned = self
            .requests_where(
                " WHERE vr.user_id = ? AND vr.status <> 'rejected'",
                Some(user_id),
                None,
            )
            .await?;
        Ok(overlap::find_overlapping(&owned, range, exclude_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn insert(&self, record: NewVacationRequest) -> Result<InsertOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent creates for the same owner until commit.
        let owner: Option<(u64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ? FOR UPDATE")
            .bind(record.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owner.is_none() {
            return Err(StoreError::MissingReference);
        }

        let sql = format!("{REQUEST_VIEW} WHERE vr.user_id = ? AND vr.status <> 'rejected'");
        let owned = sqlx::query_as::<_, VacationRequest>(&sql)
            .bind(record.user_id)
            .fetch_all(&mut *tx)
            .await?;
        let overlapping: Vec<VacationRequest> =
            overlap::find_overlapping(&owned, &record.range, None)
                .into_iter()
                .cloned()
                .collect();
        if !overlapping.is_empty() {
            tx.rollback().await?;
            return Ok(InsertOutcome::Overlapping(overlapping));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO vacation_requests
                (user_id, start_date, end_date, reason, status)
            VALUES (?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(record.user_id)
        .bind(record.range.start())
        .bind(record.range.end())
        .bind(record.reason.as_deref())
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_id();
        let sql = format!("{REQUEST_VIEW} WHERE vr.id = ?");
        let created = sqlx::query_as::<_, VacationRequest>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(request_id = id, user_id = record.user_id, "Inserted vacation request");
        Ok(InsertOutcome::Created(created))
    }

    async fn update_status(
        &self,
        id: u64,
        status: RequestStatus,
        validator_id: u64,
        comments: Option<&str>,
    ) -> Result<Option<VacationRequest>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE vacation_requests
            SET status = ?,
                validator_id = ?,
                comments = COALESCE(?, comments),
                updated_at = CURRENT_TIMESTAMP(6)
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(status.as_ref())
        .bind(validator_id)
        .bind(comments)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        RequestRepository::find_by_id(self, id).await
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM vacation_requests
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserDirectory for MySqlStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let sql = format!("{USER_COLUMNS} WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("{USER_COLUMNS} WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let sql = format!("{USER_COLUMNS} WHERE role = ? ORDER BY name");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role.as_ref())
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("{USER_COLUMNS} ORDER BY name");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query(r#"INSERT INTO users (name, email, role) VALUES (?, ?, ?)"#)
            .bind(&user.name)
            .bind(normalize_email(&user.email))
            .bind(user.role.as_ref())
            .execute(&self.pool)
            .await?;

        UserDirectory::find_by_id(self, result.last_insert_id())
            .await?
            .ok_or(StoreError::MissingReference)
    }

    async fn update(&self, id: u64, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut assignments = Vec::new();
        if let Some(name) = update.name {
            assignments.push(("name", SqlValue::String(name)));
        }
        if let Some(email) = update.email {
            assignments.push(("email", SqlValue::String(normalize_email(&email))));
        }

        if let Some(sql_update) = build_update_sql("users", assignments, "id", id) {
            debug!(sql = %sql_update.sql, user_id = id, "Updating user");
            if execute_update(&self.pool, sql_update).await? == 0 {
                return Ok(None);
            }
        }
        UserDirectory::find_by_id(self, id).await
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        // Foreign keys cascade owned requests and null validator references.
        let result = sqlx::query(r#"DELETE FROM users WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

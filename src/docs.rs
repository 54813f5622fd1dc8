use crate::model::{
    CreateVacationRequest, NewUser, RequestStatus, ReviewVacationRequest, Role, User, UserUpdate,
    VacationRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vacation Management API",
        version = "1.0.0",
        description = r#"
## Vacation Request Approval Workflow

Requesters submit date-range vacation requests; validators approve or reject them.

### 🔹 Key Rules
- A request starts **pending** and is approved or rejected exactly once.
- Approved and rejected requests are history: they cannot be reviewed again or deleted.
- Dates are inclusive. A new request may not share a day with any of the requester's
  pending or approved requests; rejected requests do not block dates.
- The start date must be today or later, and strictly before the end date.
- Only users with the **validator** role may approve or reject.

### 📦 Response Format
Every response uses the envelope `{ success, message?, data?, overlapping_requests?, errors? }`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::vacation_request::list_requests,
        crate::api::vacation_request::list_user_requests,
        crate::api::vacation_request::get_request,
        crate::api::vacation_request::create_request,
        crate::api::vacation_request::approve_request,
        crate::api::vacation_request::reject_request,
        crate::api::vacation_request::delete_request,

        crate::api::user::list_users,
        crate::api::user::list_users_by_role,
        crate::api::user::get_user,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user
    ),
    components(
        schemas(
            VacationRequest,
            RequestStatus,
            CreateVacationRequest,
            ReviewVacationRequest,
            User,
            Role,
            NewUser,
            UserUpdate
        )
    ),
    tags(
        (name = "Vacation requests", description = "Vacation request lifecycle APIs"),
        (name = "Users", description = "Requester and validator management APIs"),
    )
)]
pub struct ApiDoc;

/// Prefix the handler annotations are written against.
const DOCUMENTED_PREFIX: &str = "/api";

impl ApiDoc {
    /// The document with every path moved under the configured API prefix.
    pub fn under_prefix(prefix: &str) -> utoipa::openapi::OpenApi {
        let prefix = prefix.trim_end_matches('/');
        let mut doc = Self::openapi();
        doc.paths.paths = std::mem::take(&mut doc.paths.paths)
            .into_iter()
            .map(|(path, item)| {
                let route = path.strip_prefix(DOCUMENTED_PREFIX).unwrap_or(&path);
                (format!("{prefix}{route}"), item)
            })
            .collect();
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/vacation-requests",
            "/api/vacation-requests/{id}",
            "/api/vacation-requests/{id}/approve",
            "/api/vacation-requests/{id}/reject",
            "/api/vacation-requests/user/{user_id}",
            "/api/users",
            "/api/users/{id}",
            "/api/users/role/{role}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn paths_follow_configured_prefix() {
        let doc = ApiDoc::under_prefix("/v2/");
        assert!(doc.paths.paths.contains_key("/v2/vacation-requests/{id}/approve"));
        assert!(doc.paths.paths.contains_key("/v2/users/role/{role}"));
        assert!(doc.paths.paths.keys().all(|path| path.starts_with("/v2/")));

        let default = ApiDoc::under_prefix("/api");
        assert_eq!(
            default.paths.paths.keys().collect::<Vec<_>>(),
            ApiDoc::openapi().paths.paths.keys().collect::<Vec<_>>()
        );
    }
}

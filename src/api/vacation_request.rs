use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;

use super::response::ApiResponse;
use super::valid_id;
use crate::error::LifecycleError;
use crate::lifecycle::VacationService;
use crate::model::{CreateVacationRequest, RequestStatus, ReviewVacationRequest};

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusFilter {
    /// Filter by request status: pending, approved or rejected
    pub status: Option<String>,
}

impl StatusFilter {
    /// An absent or empty `status` means no filter.
    fn parse(&self) -> Result<Option<RequestStatus>, LifecycleError> {
        self.status
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<RequestStatus>().map_err(|_| {
                    LifecycleError::InvalidParameter(
                        r#"Invalid status. Must be "pending", "approved", or "rejected""#.into(),
                    )
                })
            })
            .transpose()
    }
}

/* =========================
List vacation requests (validators)
========================= */
#[utoipa::path(
    get,
    path = "/api/vacation-requests",
    params(StatusFilter),
    responses(
        (status = 200, description = "Vacation requests, newest first", body = Object, example = json!({
            "success": true,
            "data": [{
                "id": 1,
                "user_id": 1,
                "start_date": "2026-12-20",
                "end_date": "2026-12-30",
                "reason": "Christmas vacation with family",
                "status": "pending",
                "comments": null,
                "validator_id": null,
                "created_at": "2026-11-01T09:00:00Z",
                "updated_at": "2026-11-01T09:00:00Z",
                "user_name": "John Doe",
                "user_email": "john.doe@company.com",
                "validator_name": null
            }]
        })),
        (status = 400, description = "Unknown status filter", body = Object, example = json!({
            "success": false,
            "message": "Invalid status. Must be \"pending\", \"approved\", or \"rejected\""
        }))
    ),
    tag = "Vacation requests"
)]
pub async fn list_requests(
    service: web::Data<VacationService>,
    query: web::Query<StatusFilter>,
) -> Result<HttpResponse, LifecycleError> {
    let status = query.parse()?;
    debug!(status = ?status, "Listing vacation requests");

    let requests = service.list(status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(requests)))
}

/* =========================
List a user's vacation requests (requesters)
========================= */
#[utoipa::path(
    get,
    path = "/api/vacation-requests/user/{user_id}",
    params(("user_id" = u64, Path, description = "Owner of the requests")),
    responses(
        (status = 200, description = "The user's vacation requests", body = Object),
        (status = 404, description = "User not found", body = Object, example = json!({
            "success": false,
            "message": "User not found"
        }))
    ),
    tag = "Vacation requests"
)]
pub async fn list_user_requests(
    service: web::Data<VacationService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LifecycleError> {
    let user_id = valid_id(path.into_inner())?;
    let requests = service.list_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(requests)))
}

#[utoipa::path(
    get,
    path = "/api/vacation-requests/{id}",
    params(("id" = u64, Path, description = "Vacation request id")),
    responses(
        (status = 200, description = "Vacation request found", body = Object),
        (status = 404, description = "Vacation request not found", body = Object, example = json!({
            "success": false,
            "message": "Vacation request not found"
        }))
    ),
    tag = "Vacation requests"
)]
pub async fn get_request(
    service: web::Data<VacationService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LifecycleError> {
    let id = valid_id(path.into_inner())?;
    let request = service.get(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(request)))
}

/* =========================
Create vacation request
========================= */
#[utoipa::path(
    post,
    path = "/api/vacation-requests",
    request_body(
        content = CreateVacationRequest,
        description = "Vacation request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Vacation request created", body = Object, example = json!({
            "success": true,
            "message": "Vacation request created successfully",
            "data": { "id": 4, "status": "pending" }
        })),
        (status = 400, description = "Validation, range or past-date failure"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Overlapping request exists", body = Object, example = json!({
            "success": false,
            "message": "You already have a vacation request for overlapping dates",
            "overlapping_requests": [{ "id": 1, "start_date": "2026-12-20", "end_date": "2026-12-30" }]
        }))
    ),
    tag = "Vacation requests"
)]
pub async fn create_request(
    service: web::Data<VacationService>,
    payload: web::Json<CreateVacationRequest>,
) -> Result<HttpResponse, LifecycleError> {
    let created = service.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created()
        .json(ApiResponse::ok(created).with_message("Vacation request created successfully")))
}

/* =========================
Approve vacation request (validators)
========================= */
#[utoipa::path(
    put,
    path = "/api/vacation-requests/{id}/approve",
    params(("id" = u64, Path, description = "ID of the vacation request to approve")),
    request_body = ReviewVacationRequest,
    responses(
        (status = 200, description = "Vacation request approved", body = Object, example = json!({
            "success": true,
            "message": "Vacation request approved successfully"
        })),
        (status = 400, description = "Not pending, or invalid validator", body = Object, example = json!({
            "success": false,
            "message": "Only pending requests can be approved"
        })),
        (status = 404, description = "Vacation request not found")
    ),
    tag = "Vacation requests"
)]
pub async fn approve_request(
    service: web::Data<VacationService>,
    path: web::Path<u64>,
    payload: web::Json<ReviewVacationRequest>,
) -> Result<HttpResponse, LifecycleError> {
    let id = valid_id(path.into_inner())?;
    let approved = service.approve(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .json(ApiResponse::ok(approved).with_message("Vacation request approved successfully")))
}

/* =========================
Reject vacation request (validators)
========================= */
#[utoipa::path(
    put,
    path = "/api/vacation-requests/{id}/reject",
    params(("id" = u64, Path, description = "ID of the vacation request to reject")),
    request_body = ReviewVacationRequest,
    responses(
        (status = 200, description = "Vacation request rejected", body = Object, example = json!({
            "success": true,
            "message": "Vacation request rejected successfully"
        })),
        (status = 400, description = "Not pending, or invalid validator", body = Object, example = json!({
            "success": false,
            "message": "Invalid validator"
        })),
        (status = 404, description = "Vacation request not found")
    ),
    tag = "Vacation requests"
)]
pub async fn reject_request(
    service: web::Data<VacationService>,
    path: web::Path<u64>,
    payload: web::Json<ReviewVacationRequest>,
) -> Result<HttpResponse, LifecycleError> {
    let id = valid_id(path.into_inner())?;
    let rejected = service.reject(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .json(ApiResponse::ok(rejected).with_message("Vacation request rejected successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/vacation-requests/{id}",
    params(("id" = u64, Path, description = "ID of the vacation request to delete")),
    responses(
        (status = 200, description = "Vacation request deleted", body = Object, example = json!({
            "success": true,
            "message": "Vacation request deleted successfully"
        })),
        (status = 400, description = "Only pending requests can be deleted"),
        (status = 404, description = "Vacation request not found")
    ),
    tag = "Vacation requests"
)]
pub async fn delete_request(
    service: web::Data<VacationService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LifecycleError> {
    let id = valid_id(path.into_inner())?;
    service.delete(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Vacation request deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(status: Option<&str>) -> StatusFilter {
        StatusFilter {
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn status_filter_parsing() {
        assert_eq!(filter(None).parse().unwrap(), None);
        assert_eq!(filter(Some("")).parse().unwrap(), None);
        assert_eq!(
            filter(Some("approved")).parse().unwrap(),
            Some(RequestStatus::Approved)
        );
        assert!(matches!(
            filter(Some("cancelled")).parse(),
            Err(LifecycleError::InvalidParameter(_))
        ));
    }
}

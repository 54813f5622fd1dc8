use actix_web::{HttpResponse, web};

use super::response::ApiResponse;
use super::valid_id;
use crate::error::LifecycleError;
use crate::lifecycle::UserService;
use crate::model::{NewUser, Role, UserUpdate};

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users ordered by name", body = Object, example = json!({
            "success": true,
            "data": [{
                "id": 3,
                "name": "Mike Johnson",
                "email": "mike.johnson@company.com",
                "role": "validator",
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            }]
        }))
    ),
    tag = "Users"
)]
pub async fn list_users(service: web::Data<UserService>) -> Result<HttpResponse, LifecycleError> {
    let users = service.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}

#[utoipa::path(
    get,
    path = "/api/users/role/{role}",
    params(("role" = String, Path, description = "requester or validator")),
    responses(
        (status = 200, description = "Users holding the role", body = Object),
        (status = 400, description = "Unknown role", body = Object, example = json!({
            "success": false,
            "message": "Invalid role. Must be \"requester\" or \"validator\""
        }))
    ),
    tag = "Users"
)]
pub async fn list_users_by_role(
    service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, LifecycleError> {
    let role = path.parse::<Role>().map_err(|_| {
        LifecycleError::InvalidParameter(r#"Invalid role. Must be "requester" or "validator""#.into())
    })?;
    let users = service.list_by_role(role).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = Object),
        (status = 404, description = "User not found", body = Object, example = json!({
            "success": false,
            "message": "User not found"
        }))
    ),
    tag = "Users"
)]
pub async fn get_user(
    service: web::Data<UserService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LifecycleError> {
    let id = valid_id(path.into_inner())?;
    let user = service.get(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = Object, example = json!({
            "success": true,
            "message": "User created successfully"
        })),
        (status = 400, description = "Validation errors", body = Object, example = json!({
            "success": false,
            "message": "Validation errors",
            "errors": [{ "field": "email", "message": "Valid email is required" }]
        })),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "success": false,
            "message": "User with this email already exists"
        }))
    ),
    tag = "Users"
)]
pub async fn create_user(
    service: web::Data<UserService>,
    payload: web::Json<NewUser>,
) -> Result<HttpResponse, LifecycleError> {
    let user = service.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(user).with_message("User created successfully")))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = Object, example = json!({
            "success": true,
            "message": "User updated successfully"
        })),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Users"
)]
pub async fn update_user(
    service: web::Data<UserService>,
    path: web::Path<u64>,
    payload: web::Json<UserUpdate>,
) -> Result<HttpResponse, LifecycleError> {
    let id = valid_id(path.into_inner())?;
    let user = service.update(id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user).with_message("User updated successfully")))
}

/// Deleting a requester removes their requests; deleting a validator only clears the
/// validator reference on requests they reviewed.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = Object, example = json!({
            "success": true,
            "message": "User deleted successfully"
        })),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn delete_user(
    service: web::Data<UserService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LifecycleError> {
    let id = valid_id(path.into_inner())?;
    service.delete(id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted successfully")))
}

use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use anyhow::{Result, anyhow};
use serde_json::error::Category;

use crate::api::response::{ApiResponse, FieldError};
use crate::api::{health, user, vacation_request};
use crate::config::Config;

pub type RateLimiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn build_limiter(requests_per_min: u32) -> Result<RateLimiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limiter configuration"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: RateLimiter) {
    extractors(cfg);
    cfg.service(health::health).service(health::index).service(
        web::scope(&config.api_prefix)
            .wrap(limiter) // rate limiting
            .configure(api),
    );
}

/// Routes below the API prefix.
pub fn api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            // /users
            .service(
                web::resource("")
                    .route(web::get().to(user::list_users))
                    .route(web::post().to(user::create_user)),
            )
            // /users/role/{role}
            .service(web::resource("/role/{role}").route(web::get().to(user::list_users_by_role)))
            // /users/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(user::get_user))
                    .route(web::put().to(user::update_user))
                    .route(web::delete().to(user::delete_user)),
            ),
    )
    .service(
        web::scope("/vacation-requests")
            // /vacation-requests
            .service(
                web::resource("")
                    .route(web::get().to(vacation_request::list_requests))
                    .route(web::post().to(vacation_request::create_request)),
            )
            // /vacation-requests/user/{user_id}
            .service(
                web::resource("/user/{user_id}")
                    .route(web::get().to(vacation_request::list_user_requests)),
            )
            // /vacation-requests/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(vacation_request::get_request))
                    .route(web::delete().to(vacation_request::delete_request)),
            )
            // /vacation-requests/{id}/approve
            .service(
                web::resource("/{id}/approve")
                    .route(web::put().to(vacation_request::approve_request)),
            )
            // /vacation-requests/{id}/reject
            .service(
                web::resource("/{id}/reject").route(web::put().to(vacation_request::reject_request)),
            ),
    );
}

/// Extractor failures answer in the same envelope as handler errors.
pub fn extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            let body = ApiResponse::failure("Valid ID is required");
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            let body = ApiResponse::failure(format!("Invalid query string: {err}"));
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        }));
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = match &err {
        JsonPayloadError::Deserialize(e) if e.classify() == Category::Data => {
            ApiResponse::failure("Validation errors").with_errors(vec![FieldError {
                field: "body".to_string(),
                message: e.to_string(),
            }])
        }
        JsonPayloadError::ContentType => ApiResponse::failure("Content-Type must be application/json"),
        _ => ApiResponse::failure("Invalid JSON format"),
    };
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::failure(format!(
        "Route {} not found",
        req.path()
    )))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{App, test, web::Data};
    use serde_json::{Value, json};

    use super::*;
    use crate::lifecycle::clock::FixedClock;
    use crate::lifecycle::overlap::tests::day;
    use crate::lifecycle::{UserService, VacationService};
    use crate::model::{NewUser, Role};
    use crate::store::{MemoryStore, UserDirectory};
    use crate::utils::email_filter::EmailFilter;
    use crate::utils::user_cache::UserCache;

    struct Services {
        vacations: Data<VacationService>,
        users: Data<UserService>,
    }

    /// John (1) and Jane (2) request; Mike (3) validates. Today is 2024-10-01.
    async fn services() -> Services {
        let store = Arc::new(MemoryStore::new());
        let emails = Arc::new(EmailFilter::new(1_000));
        for (name, email, role) in [
            ("John Doe", "john.doe@company.com", Role::Requester),
            ("Jane Smith", "jane.smith@company.com", Role::Requester),
            ("Mike Johnson", "mike.johnson@company.com", Role::Validator),
        ] {
            UserDirectory::create(
                store.as_ref(),
                NewUser {
                    name: name.into(),
                    email: email.into(),
                    role,
                },
            )
            .await
            .unwrap();
            emails.insert(email);
        }
        let cache = UserCache::new(100, Duration::from_secs(60));
        Services {
            vacations: Data::new(VacationService::new(
                store.clone(),
                store.clone(),
                cache.clone(),
                Arc::new(FixedClock(day("2024-10-01"))),
            )),
            users: Data::new(UserService::new(store, cache, emails)),
        }
    }

    macro_rules! test_app {
        ($services:expr) => {
            test::init_service(
                App::new()
                    .app_data($services.vacations.clone())
                    .app_data($services.users.clone())
                    .configure(extractors)
                    .service(web::scope("/api").configure(api))
                    .default_service(web::to(not_found)),
            )
            .await
        };
    }

    macro_rules! send {
        ($app:expr, $req:expr) => {{
            let resp = test::call_service(&$app, $req.to_request()).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    fn create(user_id: u64, start: &str, end: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/vacation-requests")
            .set_json(json!({ "user_id": user_id, "start_date": start, "end_date": end }))
    }

    fn review(id: u64, action: &str, validator_id: u64) -> test::TestRequest {
        test::TestRequest::put()
            .uri(&format!("/api/vacation-requests/{id}/{action}"))
            .set_json(json!({ "validator_id": validator_id, "comments": "noted" }))
    }

    #[actix_web::test]
    async fn create_then_overlap_conflict() {
        let services = services().await;
        let app = test_app!(services);

        let (status, body) = send!(app, create(1, "2024-12-20", "2024-12-30"));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Vacation request created successfully");
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["user_name"], "John Doe");
        assert_eq!(body["data"]["validator_id"], Value::Null);
        let first_id = body["data"]["id"].clone();

        let (status, body) = send!(app, create(1, "2024-12-25", "2024-12-28"));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "You already have a vacation request for overlapping dates"
        );
        assert_eq!(body["overlapping_requests"][0]["id"], first_id);
    }

    #[actix_web::test]
    async fn create_rejects_bad_dates_and_unknown_user() {
        let services = services().await;
        let app = test_app!(services);

        let (status, body) = send!(app, create(1, "2024-12-30", "2024-12-20"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Start date must be before end date");

        let (status, body) = send!(app, create(1, "2024-09-01", "2024-09-05"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Start date must be in the future");

        let (status, body) = send!(app, create(999, "2024-12-20", "2024-12-30"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) = send!(app, create(0, "2024-12-20", "2024-12-30"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation errors");
        assert_eq!(body["errors"][0]["field"], "user_id");
    }

    #[actix_web::test]
    async fn review_flow() {
        let services = services().await;
        let app = test_app!(services);
        let (_, body) = send!(app, create(1, "2024-12-20", "2024-12-30"));
        let id = body["data"]["id"].as_u64().unwrap();

        let (status, body) = send!(app, review(id, "approve", 2));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid validator");

        let (status, body) = send!(app, review(id, "reject", 3));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Vacation request rejected successfully");
        assert_eq!(body["data"]["status"], "rejected");
        assert_eq!(body["data"]["validator_name"], "Mike Johnson");
        assert_eq!(body["data"]["comments"], "noted");

        let (status, body) = send!(app, review(id, "approve", 3));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Only pending requests can be approved");

        let (status, body) = send!(app, review(404, "approve", 3));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Vacation request not found");
    }

    #[actix_web::test]
    async fn delete_only_pending() {
        let services = services().await;
        let app = test_app!(services);
        let (_, body) = send!(app, create(1, "2024-12-20", "2024-12-30"));
        let approved = body["data"]["id"].as_u64().unwrap();
        let (_, body) = send!(app, create(1, "2025-01-10", "2025-01-12"));
        let pending = body["data"]["id"].as_u64().unwrap();
        send!(app, review(approved, "approve", 3));

        let delete = |id: u64| {
            test::TestRequest::delete().uri(&format!("/api/vacation-requests/{id}"))
        };

        let (status, body) = send!(app, delete(approved));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Only pending requests can be deleted");

        let (status, body) = send!(app, delete(pending));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Vacation request deleted successfully");

        let (status, _) = send!(app, delete(pending));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn listing_filters() {
        let services = services().await;
        let app = test_app!(services);
        let (_, body) = send!(app, create(1, "2024-12-20", "2024-12-30"));
        let johns = body["data"]["id"].as_u64().unwrap();
        send!(app, create(2, "2024-11-15", "2024-11-17"));
        send!(app, review(johns, "approve", 3));

        let get = |uri: &str| test::TestRequest::get().uri(uri);

        let (status, body) = send!(app, get("/api/vacation-requests"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = send!(app, get("/api/vacation-requests?status=pending"));
        let pending = body["data"].as_array().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending.iter().all(|r| r["status"] == "pending"));

        let (status, body) = send!(app, get("/api/vacation-requests?status="));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, body) = send!(app, get("/api/vacation-requests?status=invalid"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("Invalid status"));

        let (_, body) = send!(app, get("/api/vacation-requests/user/1"));
        let owned = body["data"].as_array().unwrap();
        assert_eq!(owned.len(), 1);
        assert!(owned.iter().all(|r| r["user_id"] == 1));

        let (status, body) = send!(app, get("/api/vacation-requests/user/999"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) = send!(app, get(&format!("/api/vacation-requests/{johns}")));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "approved");
    }

    #[actix_web::test]
    async fn malformed_input_uses_envelope() {
        let services = services().await;
        let app = test_app!(services);

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/vacation-requests")
                .insert_header(("content-type", "application/json"))
                .set_payload("{\"user_id\": 1,")
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid JSON format");

        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/vacation-requests")
                .set_json(json!({ "user_id": 1, "start_date": "tomorrow", "end_date": "2024-12-30" }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation errors");

        let (status, body) = send!(app, test::TestRequest::get().uri("/api/vacation-requests/abc"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Valid ID is required");

        let (status, body) = send!(app, test::TestRequest::get().uri("/api/nowhere"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route /api/nowhere not found");
    }

    #[actix_web::test]
    async fn user_administration() {
        let services = services().await;
        let app = test_app!(services);

        let (status, body) = send!(
            app,
            test::TestRequest::post().uri("/api/users").set_json(json!({
                "name": "Sarah Wilson",
                "email": "Sarah.Wilson@company.com",
                "role": "validator"
            }))
        );
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["email"], "sarah.wilson@company.com");
        let sarah = body["data"]["id"].as_u64().unwrap();

        let (status, body) = send!(
            app,
            test::TestRequest::post().uri("/api/users").set_json(json!({
                "name": "John Again",
                "email": "john.doe@company.com",
                "role": "requester"
            }))
        );
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User with this email already exists");

        let (status, body) = send!(
            app,
            test::TestRequest::post().uri("/api/users").set_json(json!({
                "name": "X",
                "email": "nope",
                "role": "requester"
            }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["email", "name"]);

        let (status, body) = send!(app, test::TestRequest::get().uri("/api/users/role/validator"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, _) = send!(app, test::TestRequest::get().uri("/api/users/role/admin"));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send!(
            app,
            test::TestRequest::put()
                .uri(&format!("/api/users/{sarah}"))
                .set_json(json!({ "name": "Sarah W." }))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Sarah W.");
        assert_eq!(body["data"]["role"], "validator");

        let (status, _) = send!(
            app,
            test::TestRequest::put()
                .uri(&format!("/api/users/{sarah}"))
                .set_json(json!({ "role": "requester" }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send!(
            app,
            test::TestRequest::delete().uri(&format!("/api/users/{sarah}"))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted successfully");

        let (status, _) = send!(app, test::TestRequest::get().uri(&format!("/api/users/{sarah}")));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn deleting_requester_removes_their_requests() {
        let services = services().await;
        let app = test_app!(services);
        let (_, body) = send!(app, create(1, "2024-12-20", "2024-12-30"));
        let id = body["data"]["id"].as_u64().unwrap();

        send!(app, test::TestRequest::delete().uri("/api/users/1"));

        let (status, _) = send!(
            app,
            test::TestRequest::get().uri(&format!("/api/vacation-requests/{id}"))
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn limiter_accepts_any_rate() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(1000).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}

use chrono::NaiveDate;
use tracing::info;

use super::{InsertOutcome, RequestRepository, StoreError, UserDirectory};
use crate::lifecycle::overlap::DateRange;
use crate::model::{NewUser, NewVacationRequest, RequestStatus, Role};

const DEMO_USERS: [(&str, &str, Role); 5] = [
    ("John Doe", "john.doe@company.com", Role::Requester),
    ("Jane Smith", "jane.smith@company.com", Role::Requester),
    ("Mike Johnson", "mike.johnson@company.com", Role::Validator),
    ("Sarah Wilson", "sarah.wilson@company.com", Role::Validator),
    ("Bob Brown", "bob.brown@company.com", Role::Requester),
];

struct DemoRequest {
    /// Index into `DEMO_USERS`.
    owner: usize,
    start: (i32, u32, u32),
    end: (i32, u32, u32),
    reason: &'static str,
    review: Option<(RequestStatus, usize, &'static str)>,
}

const DEMO_REQUESTS: [DemoRequest; 3] = [
    DemoRequest {
        owner: 0,
        start: (2024, 12, 20),
        end: (2024, 12, 30),
        reason: "Christmas vacation with family",
        review: None,
    },
    DemoRequest {
        owner: 1,
        start: (2024, 11, 15),
        end: (2024, 11, 17),
        reason: "Long weekend trip",
        review: Some((RequestStatus::Approved, 2, "Approved - enjoy your trip!")),
    },
    DemoRequest {
        owner: 4,
        start: (2024, 11, 1),
        end: (2024, 11, 3),
        reason: "Personal matters",
        review: Some((
            RequestStatus::Rejected,
            3,
            "Rejected - insufficient notice period",
        )),
    },
];

fn date((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Loads the demo users and their requests. Does nothing unless the directory is empty.
///
/// Returns the number of users created.
pub async fn seed_demo_data(
    requests: &dyn RequestRepository,
    users: &dyn UserDirectory,
) -> Result<usize, StoreError> {
    if !users.find_all().await?.is_empty() {
        info!("Store already has users; skipping demo seed");
        return Ok(0);
    }

    let mut ids = Vec::with_capacity(DEMO_USERS.len());
    for (name, email, role) in DEMO_USERS {
        let user = users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                role,
            })
            .await?;
        ids.push(user.id);
    }

    for demo in &DEMO_REQUESTS {
        let Some(range) = date(demo.start)
            .zip(date(demo.end))
            .and_then(|(start, end)| DateRange::new(start, end))
        else {
            continue;
        };
        let outcome = requests
            .insert(NewVacationRequest {
                user_id: ids[demo.owner],
                range,
                reason: Some(demo.reason.to_string()),
            })
            .await?;
        let (InsertOutcome::Created(created), Some((status, validator, comments))) =
            (outcome, &demo.review)
        else {
            continue;
        };
        requests
            .update_status(created.id, *status, ids[*validator], Some(*comments))
            .await?;
    }

    info!(users = ids.len(), requests = DEMO_REQUESTS.len(), "Demo data seeded");
    Ok(ids.len())
}

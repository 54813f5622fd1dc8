pub mod clock;
pub mod overlap;
pub mod users;
pub mod vacation;

pub use clock::SystemClock;
pub use users::UserService;
pub use vacation::VacationService;

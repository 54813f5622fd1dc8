pub mod health;
pub mod response;
pub mod user;
pub mod vacation_request;

use crate::error::LifecycleError;

/// Ids are system-assigned from 1; zero never names a row.
pub(crate) fn valid_id(id: u64) -> Result<u64, LifecycleError> {
    if id == 0 {
        return Err(LifecycleError::InvalidParameter("Valid ID is required".into()));
    }
    Ok(id)
}

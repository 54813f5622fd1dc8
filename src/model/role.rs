use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Role a user holds in the approval workflow. Fixed at creation.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Requester,
    Validator,
}

impl Role {
    pub fn can_review(&self) -> bool {
        match self {
            Role::Validator => true,
            Role::Requester => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_lowercase_names_only() {
        assert_eq!(Role::from_str("validator").unwrap(), Role::Validator);
        assert_eq!(Role::from_str("requester").unwrap(), Role::Requester);
        assert!(Role::from_str("admin").is_err());
        assert!(Role::from_str("Validator").is_err());
    }

    #[test]
    fn only_validators_review() {
        assert!(Role::Validator.can_review());
        assert!(!Role::Requester.can_review());
        assert_eq!(Role::Validator.to_string(), "validator");
    }
}

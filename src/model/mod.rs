pub mod role;
pub mod user;
pub mod vacation_request;

pub use role::Role;
pub use user::{NewUser, User, UserUpdate};
pub use vacation_request::{
    CreateVacationRequest, NewVacationRequest, RequestStatus, ReviewVacationRequest,
    VacationRequest,
};

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySql, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Decode, Encode, Type};

/// Stores a strum enum in a VARCHAR (or ENUM) column as its lowercase name.
macro_rules! text_column {
    ($ty:ty) => {
        impl Type<MySql> for $ty {
            fn type_info() -> MySqlTypeInfo {
                <str as Type<MySql>>::type_info()
            }

            fn compatible(ty: &MySqlTypeInfo) -> bool {
                <str as Type<MySql>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, MySql> for $ty {
            fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
                let text = <&str as Decode<MySql>>::decode(value)?;
                Ok(text.parse::<$ty>()?)
            }
        }

        impl Encode<'_, MySql> for $ty {
            fn encode_by_ref(&self, buf: &mut Vec<u8>) -> IsNull {
                <&str as Encode<MySql>>::encode(self.as_ref(), buf)
            }
        }
    };
}

text_column!(Role);
text_column!(RequestStatus);

#[cfg(test)]
mod tests {
    use super::*;

    fn varchar() -> MySqlTypeInfo {
        <String as Type<MySql>>::type_info()
    }

    #[test]
    fn enums_read_from_varchar_columns() {
        assert!(<Role as Type<MySql>>::compatible(&varchar()));
        assert!(<RequestStatus as Type<MySql>>::compatible(&varchar()));
        assert!(<Option<RequestStatus> as Type<MySql>>::compatible(&varchar()));
    }

    #[test]
    fn enums_bind_as_varchar() {
        assert_eq!(<Role as Type<MySql>>::type_info(), varchar());
        assert_eq!(<RequestStatus as Type<MySql>>::type_info(), varchar());
    }
}

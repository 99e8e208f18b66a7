use serde::{Serialize, Deserialize};

use crate::{Validator, ApiError, Detail};
use crate::users::User;

/// stage 1 credentials, sent form encoded.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginUser {
    pub username: String,
    pub password: String,
}

impl Validator for LoginUser {
    fn validate(&self) -> Result<(), ApiError> {
        let mut invalid = Vec::new();

        if !alp_lib::users::username_valid(&self.username) {
            invalid.push("username");
        }

        if !alp_lib::users::password_valid(&self.password) {
            invalid.push("password");
        }

        if !invalid.is_empty() {
            Err(ApiError::validation(Detail::mult_keys(invalid)))
        } else {
            Ok(())
        }
    }
}

/// stage 1 success. the session cookie is set on the response; the client is
/// expected to navigate to `redirect_uri`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAccepted {
    pub redirect_uri: String,
    pub user: User,
}

/// stage 2 code confirmation, sent form encoded.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmTotp {
    pub totp: String,
}

impl Validator for ConfirmTotp {
    fn validate(&self) -> Result<(), ApiError> {
        if !alp_lib::users::code_valid(&self.totp) {
            Err(ApiError::validation(Detail::with_key("totp")))
        } else {
            Ok(())
        }
    }
}

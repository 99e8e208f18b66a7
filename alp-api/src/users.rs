use serde::{Serialize, Deserialize};

use crate::{Validator, ApiError, Detail};

/// server authoritative session descriptor returned by `users/me`. a fetch
/// replaces the previous snapshot wholesale, it is never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub system: bool,
    pub enabled: bool,
    #[serde(default)]
    pub phone_number: String,
    pub ctime: String,
    pub mtime: String,
    #[serde(default)]
    pub supervisor: String,
    #[serde(default)]
    pub auth_level: i32,
    #[serde(default)]
    pub personal_desktop: String,
    pub enrolled: bool,
    pub totp_enabled: bool,
    pub totp_enrolled: bool,
}

impl User {
    pub fn anonymous(&self) -> bool {
        self.name == "anonymous"
    }

    /// a non anonymous identity above auth level 1 has already satisfied
    /// multi factor verification for this session.
    pub fn verified(&self) -> bool {
        !self.anonymous() && self.auth_level > 1
    }

    /// identities with a supervisor delegate mfa to the supervisor's sms
    /// confirmation.
    pub fn supervised(&self) -> bool {
        !self.supervisor.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateMe {
    pub personal_desktop: String,
}

impl Validator for UpdateMe {
    fn validate(&self) -> Result<(), ApiError> {
        if !alp_lib::users::computer_name_valid(&self.personal_desktop) {
            Err(ApiError::validation(Detail::with_key("personal_desktop")))
        } else {
            Ok(())
        }
    }

    fn has_work(&self) -> bool {
        !self.personal_desktop.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Sms,
    Totp,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyCode {
    pub kind: CodeKind,
    pub code: String,
}

impl Validator for VerifyCode {
    fn validate(&self) -> Result<(), ApiError> {
        if !alp_lib::users::code_valid(&self.code) {
            Err(ApiError::validation(Detail::with_key("code")))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitiateSms {
    pub phone_number: String,
}

impl Validator for InitiateSms {
    fn validate(&self) -> Result<(), ApiError> {
        if !alp_lib::phone::phone_number_valid(&self.phone_number) {
            Err(ApiError::validation(Detail::with_key("phone_number")))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpKeyUri {
    pub uri: String,
}

#[cfg(test)]
mod test {
    use super::*;

    fn full_payload() -> serde_json::Value {
        serde_json::json!({
            "id": "usr-1",
            "kind": "user",
            "name": "asaf",
            "system": false,
            "enabled": true,
            "phone_number": "+972521234567",
            "ctime": "2020-01-01T00:00:00Z",
            "mtime": "2020-01-02T00:00:00Z",
            "supervisor": "",
            "auth_level": 1,
            "personal_desktop": "ts-comp",
            "enrolled": false,
            "totp_enabled": true,
            "totp_enrolled": false
        })
    }

    #[test]
    pub fn user_deserialize_full() {
        let user: User = serde_json::from_value(full_payload())
            .expect("full payload");

        assert_eq!(user.name, "asaf");
        assert_eq!(user.personal_desktop, "ts-comp");
        assert!(!user.verified(), "auth level 1 is not verified");
    }

    #[test]
    pub fn user_deserialize_defaults_optional_fields() {
        let mut payload = full_payload();
        let map = payload.as_object_mut().unwrap();
        map.remove("phone_number");
        map.remove("supervisor");
        map.remove("auth_level");
        map.remove("personal_desktop");

        let user: User = serde_json::from_value(payload)
            .expect("optional fields absent");

        assert_eq!(user.phone_number, "");
        assert_eq!(user.supervisor, "");
        assert_eq!(user.auth_level, 0);
        assert_eq!(user.personal_desktop, "");
    }

    #[test]
    pub fn user_deserialize_rejects_missing_required() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("enrolled");

        let result = serde_json::from_value::<User>(payload);

        assert!(result.is_err(), "missing required field must fail");
    }

    #[test]
    pub fn user_verified_requires_non_anonymous() {
        let mut payload = full_payload();
        payload["auth_level"] = serde_json::json!(2);

        let user: User = serde_json::from_value(payload.clone()).unwrap();
        assert!(user.verified(), "named identity above level 1");

        payload["name"] = serde_json::json!("anonymous");
        let user: User = serde_json::from_value(payload).unwrap();
        assert!(!user.verified(), "anonymous identity is never verified");
    }

    #[test]
    pub fn verify_code_wire_shape() {
        let body = VerifyCode {
            kind: CodeKind::Sms,
            code: String::from("123456"),
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json, serde_json::json!({"kind": "sms", "code": "123456"}));
    }

    #[test]
    pub fn update_me_validation() {
        let empty = UpdateMe { personal_desktop: String::new() };
        let named = UpdateMe { personal_desktop: String::from("ts-comp") };

        assert!(!empty.has_work(), "empty name is not submittable");
        assert!(named.validate().is_ok(), "plain name passes");
    }

    #[test]
    pub fn initiate_sms_validation() {
        let invalid = InitiateSms { phone_number: String::from("1234") };
        let valid = InitiateSms { phone_number: String::from("+972521234567") };

        let err = invalid.validate().unwrap_err();
        assert!(err.detail().unwrap().contains_key("phone_number"));
        assert!(valid.validate().is_ok());
    }
}

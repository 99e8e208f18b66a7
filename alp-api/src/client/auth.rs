use crate::Validator;
use crate::auth::{LoginUser, LoginAccepted, ConfirmTotp};
use crate::client::ApiClient;
use crate::client::error::RequestError;

const LOGIN_FALLBACK: &str = "user login failed";
const CONFIRM_FALLBACK: &str = "failed to verify code";
const SMS_FALLBACK: &str = "failed to send sms message";

/// stage 1 credential submission. success establishes the session cookie and
/// names the redirect destination.
pub struct Login {
    body: LoginUser
}

impl Login {
    pub fn new<U, P>(username: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<String>
    {
        Login {
            body: LoginUser {
                username: username.into(),
                password: password.into()
            }
        }
    }

    pub async fn send(self, client: &ApiClient) -> Result<LoginAccepted, RequestError> {
        self.body.validate()?;

        let res = client.post("auth/stage/1")
            .form(&self.body)
            .send()
            .await
            .map_err(|err| RequestError::transport(LOGIN_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => res.json()
                .await
                .map_err(|err| RequestError::transport(LOGIN_FALLBACK, err)),
            _ => Err(RequestError::from_response(res, LOGIN_FALLBACK).await),
        }
    }
}

/// stage 2 code confirmation.
pub struct ConfirmMfa {
    body: ConfirmTotp
}

impl ConfirmMfa {
    pub fn new<C>(code: C) -> Self
    where
        C: Into<String>
    {
        ConfirmMfa {
            body: ConfirmTotp {
                totp: code.into()
            }
        }
    }

    pub async fn send(self, client: &ApiClient) -> Result<(), RequestError> {
        self.body.validate()?;

        let res = client.post("auth/stage/2")
            .form(&self.body)
            .send()
            .await
            .map_err(|err| RequestError::transport(CONFIRM_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            _ => Err(RequestError::from_response(res, CONFIRM_FALLBACK).await),
        }
    }
}

/// asks the server to text the login sms link. shares the stage 2 endpoint
/// with code confirmation, distinguished by the empty body.
pub struct InitiateMfaSms {}

impl InitiateMfaSms {
    pub fn new() -> Self {
        InitiateMfaSms {}
    }

    pub async fn send(self, client: &ApiClient) -> Result<(), RequestError> {
        let res = client.post("auth/stage/2")
            .send()
            .await
            .map_err(|err| RequestError::transport(SMS_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            _ => Err(RequestError::from_response(res, SMS_FALLBACK).await),
        }
    }
}

impl Default for InitiateMfaSms {
    fn default() -> Self {
        InitiateMfaSms::new()
    }
}

#[cfg(test)]
mod test {
    use wiremock::{MockServer, Mock, ResponseTemplate};
    use wiremock::matchers::{method, path, body_string_contains};

    use super::*;
    use crate::client::test_util::client_for;

    #[tokio::test]
    async fn login_success_returns_redirect() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/stage/1"))
            .and(body_string_contains("username=asaf"))
            .and(body_string_contains("password=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "redirect_uri": "https://portal.example/home",
                "user": crate::client::test_util::user_payload()
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let accepted = Login::new("asaf", "secret")
            .send(&client)
            .await
            .expect("login accepted");

        assert_eq!(accepted.redirect_uri, "https://portal.example/home");
        assert_eq!(accepted.user.name, "asaf");
    }

    #[tokio::test]
    async fn login_failure_uses_body_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/stage/1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "code": 403,
                "error": "invalid credentials"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = Login::new("asaf", "secret")
            .send(&client)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "invalid credentials");
        assert_eq!(err.code(), Some(403));
    }

    #[tokio::test]
    async fn login_failure_falls_back_on_unreadable_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/stage/1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = Login::new("asaf", "secret")
            .send(&client)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "user login failed");
    }

    #[tokio::test]
    async fn login_rejects_invalid_fields_without_network() {
        let server = MockServer::start().await;

        let client = client_for(&server);
        let err = Login::new("ab", "p")
            .send(&client)
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirm_mfa_posts_form_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/stage/2"))
            .and(body_string_contains("totp=123456"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        ConfirmMfa::new("123456")
            .send(&client)
            .await
            .expect("code accepted");
    }

    #[tokio::test]
    async fn initiate_sms_posts_empty_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/stage/2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        InitiateMfaSms::new()
            .send(&client)
            .await
            .expect("sms initiated");
    }
}

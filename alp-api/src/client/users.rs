use crate::Validator;
use crate::client::ApiClient;
use crate::client::error::RequestError;
use crate::users::{User, UpdateMe, VerifyCode, CodeKind, InitiateSms, TotpKeyUri};

const RETRIEVE_FALLBACK: &str = "failed to retrieve user";
const UPDATE_FALLBACK: &str = "failed to update computer name";
const COMMIT_FALLBACK: &str = "failed to commit enrollment";
const VERIFY_FALLBACK: &str = "failed to validate code";
const KEY_URI_FALLBACK: &str = "failed to retrieve totp key uri";
const SMS_FALLBACK: &str = "failed to send sms message";

/// fetches the current session descriptor. a forbidden response means
/// nobody is logged in, which is not an error; a payload that fails
/// validation is treated the same way.
pub struct RetrieveMe {}

impl RetrieveMe {
    pub fn new() -> Self {
        RetrieveMe {}
    }

    pub async fn send(self, client: &ApiClient) -> Result<Option<User>, RequestError> {
        let res = client.get("users/me")
            .send()
            .await
            .map_err(|err| RequestError::transport(RETRIEVE_FALLBACK, err))?;

        match res.status() {
            reqwest::StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let body = res.text()
                    .await
                    .map_err(|err| RequestError::transport(RETRIEVE_FALLBACK, err))?;

                match serde_json::from_str::<User>(&body) {
                    Ok(user) => Ok(Some(user)),
                    Err(err) => {
                        tracing::warn!("session payload failed validation: {err}");

                        Ok(None)
                    }
                }
            },
            _ => Err(RequestError::from_response(res, RETRIEVE_FALLBACK).await),
        }
    }
}

impl Default for RetrieveMe {
    fn default() -> Self {
        RetrieveMe::new()
    }
}

/// persists the personal computer name.
pub struct UpdateDesktop {
    body: UpdateMe
}

impl UpdateDesktop {
    pub fn name<N>(name: N) -> Self
    where
        N: Into<String>
    {
        UpdateDesktop {
            body: UpdateMe {
                personal_desktop: name.into()
            }
        }
    }

    pub async fn send(self, client: &ApiClient) -> Result<(), RequestError> {
        self.body.assert_ok()?;

        let res = client.put("users/me")
            .json(&self.body)
            .send()
            .await
            .map_err(|err| RequestError::transport(UPDATE_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            _ => Err(RequestError::from_response(res, UPDATE_FALLBACK).await),
        }
    }
}

/// marks the server side enrollment as complete.
pub struct CommitEnrollment {}

impl CommitEnrollment {
    pub fn new() -> Self {
        CommitEnrollment {}
    }

    pub async fn send(self, client: &ApiClient) -> Result<(), RequestError> {
        let res = client.post("users/me/commit")
            .send()
            .await
            .map_err(|err| RequestError::transport(COMMIT_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            _ => Err(RequestError::from_response(res, COMMIT_FALLBACK).await),
        }
    }
}

impl Default for CommitEnrollment {
    fn default() -> Self {
        CommitEnrollment::new()
    }
}

/// submits an enrollment verification code for one of the two factors.
pub struct SubmitEnrollCode {
    body: VerifyCode
}

impl SubmitEnrollCode {
    pub fn sms<C>(code: C) -> Self
    where
        C: Into<String>
    {
        SubmitEnrollCode {
            body: VerifyCode {
                kind: CodeKind::Sms,
                code: code.into()
            }
        }
    }

    pub fn totp<C>(code: C) -> Self
    where
        C: Into<String>
    {
        SubmitEnrollCode {
            body: VerifyCode {
                kind: CodeKind::Totp,
                code: code.into()
            }
        }
    }

    pub async fn send(self, client: &ApiClient) -> Result<(), RequestError> {
        self.body.validate()?;

        let res = client.post("users/me/verify")
            .json(&self.body)
            .send()
            .await
            .map_err(|err| RequestError::transport(VERIFY_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            _ => Err(RequestError::from_response(res, VERIFY_FALLBACK).await),
        }
    }
}

/// fetches the provisioning uri the authenticator app enrolls from.
pub struct RetrieveTotpKeyUri {}

impl RetrieveTotpKeyUri {
    pub fn new() -> Self {
        RetrieveTotpKeyUri {}
    }

    pub async fn send(self, client: &ApiClient) -> Result<TotpKeyUri, RequestError> {
        let res = client.get("users/me/totp-key-uri")
            .send()
            .await
            .map_err(|err| RequestError::transport(KEY_URI_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => res.json()
                .await
                .map_err(|err| RequestError::transport(KEY_URI_FALLBACK, err)),
            _ => Err(RequestError::from_response(res, KEY_URI_FALLBACK).await),
        }
    }
}

impl Default for RetrieveTotpKeyUri {
    fn default() -> Self {
        RetrieveTotpKeyUri::new()
    }
}

/// asks the server to text an enrollment code to the given number.
/// separators are stripped before the number goes on the wire.
pub struct InitiateEnrollSms {
    body: InitiateSms
}

impl InitiateEnrollSms {
    pub fn phone<P>(phone_number: P) -> Self
    where
        P: AsRef<str>
    {
        InitiateEnrollSms {
            body: InitiateSms {
                phone_number: alp_lib::phone::strip_separators(phone_number)
            }
        }
    }

    pub async fn send(self, client: &ApiClient) -> Result<(), RequestError> {
        self.body.validate()?;

        let res = client.post("users/me/initiate-sms")
            .json(&self.body)
            .send()
            .await
            .map_err(|err| RequestError::transport(SMS_FALLBACK, err))?;

        match res.status() {
            status if status.is_success() => Ok(()),
            _ => Err(RequestError::from_response(res, SMS_FALLBACK).await),
        }
    }
}

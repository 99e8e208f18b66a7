use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alp_api::client::ApiClient;
use alp_api::client::auth::Login;

use crate::alert::Alert;

/// per-field validation results for the login form
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    pub username: bool,
    pub password: bool,
}

impl FieldErrors {
    pub fn any(&self) -> bool {
        self.username || self.password
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// one or more fields failed validation. no request was made
    Invalid(FieldErrors),
    /// credentials were accepted. the caller should navigate to the uri
    Redirect(String),
    /// the server rejected the attempt or the request failed
    Failed(Alert),
    /// a previous submit is still in flight
    Pending,
}

pub struct LoginController {
    client: Arc<ApiClient>,
    in_flight: AtomicBool,
}

impl LoginController {
    pub fn new(client: Arc<ApiClient>) -> Self {
        LoginController {
            client,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn check_fields(username: &str, password: &str) -> FieldErrors {
        FieldErrors {
            username: !alp_lib::users::username_valid(username),
            password: !alp_lib::users::password_valid(password),
        }
    }

    /// validates the given credentials and submits them. validation
    /// failures and overlapping submits never reach the network
    pub async fn submit(&self, username: &str, password: &str) -> LoginOutcome {
        let errors = Self::check_fields(username, password);

        if errors.any() {
            return LoginOutcome::Invalid(errors);
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            return LoginOutcome::Pending;
        }

        let result = Login::new(username, password)
            .send(&self.client)
            .await;

        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(accepted) => LoginOutcome::Redirect(accepted.redirect_uri),
            Err(err) => {
                tracing::warn!("login attempt failed: {}", err);

                LoginOutcome::Failed(Alert::error(err.to_string()))
            }
        }
    }
}

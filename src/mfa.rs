use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alp_api::client::ApiClient;
use alp_api::client::auth::{ConfirmMfa, InitiateMfaSms};
use alp_api::users::User;
use tokio_util::sync::CancellationToken;

use crate::alert::Alert;
use crate::config::Timing;
use crate::session::SessionWatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaMode {
    Totp,
    Sms,
}

impl MfaMode {
    fn other(self) -> Self {
        match self {
            MfaMode::Totp => MfaMode::Sms,
            MfaMode::Sms => MfaMode::Totp,
        }
    }
}

/// which factors the current session may confirm with. a supervised user is
/// restricted to sms regardless of totp enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EligibleModes {
    pub totp: bool,
    pub sms: bool,
}

impl EligibleModes {
    pub fn from_user(user: &User) -> Self {
        EligibleModes {
            totp: user.totp_enrolled && !user.supervised(),
            sms: !user.phone_number.is_empty() || user.supervised(),
        }
    }

    pub fn allows(&self, mode: MfaMode) -> bool {
        match mode {
            MfaMode::Totp => self.totp,
            MfaMode::Sms => self.sms,
        }
    }

    pub fn initial(&self) -> Option<MfaMode> {
        if self.totp {
            Some(MfaMode::Totp)
        } else if self.sms {
            Some(MfaMode::Sms)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyOutcome {
    #[default]
    None,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// the code was accepted and the session is now fully authenticated
    Verified(Alert),
    /// the server refused the code or the request failed
    Rejected(Alert),
    /// supervised users cannot confirm totp codes themselves. no request
    /// was made
    Delegated(Alert),
    /// a previous submit is still in flight
    Pending,
}

struct MfaState {
    mode: MfaMode,
    cooldown: bool,
    last_outcome: VerifyOutcome,
    revert: Option<CancellationToken>,
}

fn lock(state: &Mutex<MfaState>) -> MutexGuard<'_, MfaState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// drives the second login stage. owns the active factor choice, the sms
/// resend throttle and the delayed fall back to totp after a failed send.
pub struct MfaController {
    client: Arc<ApiClient>,
    session: SessionWatch,
    timing: Timing,
    state: Arc<Mutex<MfaState>>,
    in_flight: AtomicBool,
    teardown: CancellationToken,
}

impl MfaController {
    pub fn new(client: Arc<ApiClient>, session: SessionWatch, timing: Timing) -> Self {
        let mode = session.borrow()
            .as_ref()
            .map(EligibleModes::from_user)
            .and_then(|eligible| eligible.initial())
            .unwrap_or(MfaMode::Totp);

        MfaController {
            client,
            session,
            timing,
            state: Arc::new(Mutex::new(MfaState {
                mode,
                cooldown: false,
                last_outcome: VerifyOutcome::None,
                revert: None,
            })),
            in_flight: AtomicBool::new(false),
            teardown: CancellationToken::new(),
        }
    }

    pub fn mode(&self) -> MfaMode {
        lock(&self.state).mode
    }

    pub fn last_outcome(&self) -> VerifyOutcome {
        lock(&self.state).last_outcome
    }

    pub fn eligible(&self) -> EligibleModes {
        self.session.borrow()
            .as_ref()
            .map(EligibleModes::from_user)
            .unwrap_or_default()
    }

    /// true once the session snapshot shows a fully authenticated user
    pub fn should_redirect(&self) -> bool {
        self.session.borrow()
            .as_ref()
            .map(User::verified)
            .unwrap_or(false)
    }

    /// flips to the other factor. flipping to sms also asks the server to
    /// text a code right away. flipping cancels any scheduled fall back
    /// from an earlier failed send.
    pub async fn switch_mode(&self) -> Option<Alert> {
        let next = {
            let mut state = lock(&self.state);

            if let Some(revert) = state.revert.take() {
                revert.cancel();
            }

            state.mode = state.mode.other();
            state.mode
        };

        match next {
            MfaMode::Sms => self.send_sms().await,
            MfaMode::Totp => None,
        }
    }

    /// asks the server to text a login code. returns `None` while the
    /// resend throttle is active. a failed send schedules a fall back to
    /// totp so the user is not stranded on a factor that cannot deliver.
    pub async fn send_sms(&self) -> Option<Alert> {
        {
            let mut state = lock(&self.state);

            if state.cooldown {
                return None;
            }

            state.cooldown = true;
        }

        self.spawn_cooldown_reset();

        match InitiateMfaSms::new().send(&self.client).await {
            Ok(()) => Some(Alert::info("an sms message was sent")),
            Err(err) => {
                tracing::warn!("sms send failed: {}", err);

                self.spawn_revert();

                Some(Alert::error(err.to_string()))
            }
        }
    }

    /// confirms the given code against the active factor. supervised users
    /// never confirm codes themselves, their supervisor approves the sms
    /// link instead.
    pub async fn submit(&self, code: &str) -> SubmitOutcome {
        let supervised = self.session.borrow()
            .as_ref()
            .map(User::supervised)
            .unwrap_or(false);

        if supervised {
            return SubmitOutcome::Delegated(Alert::info(
                "users with a supervisor set, must connect with sms",
            ));
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            return SubmitOutcome::Pending;
        }

        let result = ConfirmMfa::new(code).send(&self.client).await;

        self.in_flight.store(false, Ordering::Release);

        match result {
            Ok(()) => {
                lock(&self.state).last_outcome = VerifyOutcome::Success;

                SubmitOutcome::Verified(Alert::success("code verified successfully"))
            }
            Err(err) => {
                lock(&self.state).last_outcome = VerifyOutcome::Failure;

                SubmitOutcome::Rejected(Alert::error(err.to_string()))
            }
        }
    }

    fn spawn_cooldown_reset(&self) {
        let state = self.state.clone();
        let token = self.teardown.child_token();
        let cooldown = self.timing.resend_cooldown;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(cooldown) => {
                    lock(&state).cooldown = false;
                }
            }
        });
    }

    fn spawn_revert(&self) {
        let token = self.teardown.child_token();
        let state = self.state.clone();
        let delay = self.timing.revert_delay;

        {
            let mut guard = lock(&state);

            if let Some(previous) = guard.revert.take() {
                previous.cancel();
            }

            guard.revert = Some(token.clone());
        }

        let task_state = self.state.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let mut state = lock(&task_state);

                    state.mode = MfaMode::Totp;
                    state.revert = None;
                }
            }
        });
    }

    /// cancels the throttle and fall back timers
    pub fn teardown(&self) {
        self.teardown.cancel();
    }
}

impl Drop for MfaController {
    fn drop(&mut self) {
        self.teardown.cancel();
    }
}

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alp_api::client::ApiClient;
use alp_api::client::error::RequestError;
use alp_api::client::users::{
    CommitEnrollment, InitiateEnrollSms, RetrieveMe, RetrieveTotpKeyUri, SubmitEnrollCode,
    UpdateDesktop,
};
use tokio_util::sync::CancellationToken;

use crate::alert::Alert;
use crate::config::Timing;
use crate::mfa::VerifyOutcome;
use crate::session::{EnrollmentProgress, SessionWatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    ComputerName,
    MfaSetup,
}

impl WizardStep {
    pub fn index(&self) -> usize {
        match self {
            WizardStep::ComputerName => 0,
            WizardStep::MfaSetup => 1,
        }
    }

    pub fn optional(&self) -> bool {
        matches!(self, WizardStep::ComputerName)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Step(WizardStep),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollMode {
    Totp,
    Sms,
}

impl EnrollMode {
    fn other(self) -> Self {
        match self {
            EnrollMode::Totp => EnrollMode::Sms,
            EnrollMode::Sms => EnrollMode::Totp,
        }
    }
}

/// result of opening the wizard against the current session
pub enum WizardEntry {
    Wizard(EnrollmentWizard),
    /// the account already finished enrollment, there is nothing to run
    AlreadyEnrolled,
    /// nobody is logged in
    NoSession,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// moved to the next step. carries the save result for the step that
    /// was just left
    Advanced(Alert),
    /// the step had nothing to save and was skipped over
    Skipped,
    /// the step's requirements are not met yet, nothing was submitted
    Blocked,
    /// the request for the current step failed, the wizard did not move
    Failed(Alert),
    /// enrollment was committed server side
    Completed(Alert),
}

/// walks a freshly provisioned account through naming its desktop and
/// setting up a second factor. holds its own copies of the form fields so
/// edits survive step navigation.
pub struct EnrollmentWizard {
    client: Arc<ApiClient>,
    session: SessionWatch,
    timing: Timing,
    phase: WizardPhase,
    skipped: HashSet<WizardStep>,
    mode: EnrollMode,
    computer_name: String,
    phone_number: String,
    last_code_outcome: VerifyOutcome,
    verified_factor: Option<EnrollMode>,
    settled: bool,
    phone_cooldown: Arc<AtomicBool>,
    teardown: CancellationToken,
}

impl EnrollmentWizard {
    /// fetches a fresh session descriptor and decides whether the wizard
    /// needs to run at all. an account that already named its desktop
    /// starts directly on mfa setup.
    pub async fn begin(client: Arc<ApiClient>, session: SessionWatch, timing: Timing) -> WizardEntry {
        let mut wizard = EnrollmentWizard {
            client,
            session,
            timing,
            phase: WizardPhase::Step(WizardStep::ComputerName),
            skipped: HashSet::new(),
            mode: EnrollMode::Totp,
            computer_name: String::new(),
            phone_number: String::new(),
            last_code_outcome: VerifyOutcome::None,
            verified_factor: None,
            settled: false,
            phone_cooldown: Arc::new(AtomicBool::new(false)),
            teardown: CancellationToken::new(),
        };

        match RetrieveMe::new().send(&wizard.client).await {
            Ok(None) => return WizardEntry::NoSession,
            Ok(Some(user)) => {
                if user.enrolled {
                    return WizardEntry::AlreadyEnrolled;
                }

                wizard.computer_name = user.personal_desktop.clone();
                wizard.phone_number = user.phone_number.clone();
                wizard.settled = true;

                if !user.personal_desktop.is_empty() {
                    wizard.skip(WizardStep::ComputerName);
                }
            }
            Err(err) => {
                tracing::warn!("session fetch failed, starting the wizard blank: {}", err);
            }
        }

        WizardEntry::Wizard(wizard)
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn mode(&self) -> EnrollMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.other();
    }

    pub fn computer_name(&self) -> &str {
        &self.computer_name
    }

    pub fn set_computer_name<N>(&mut self, name: N)
    where
        N: Into<String>
    {
        self.computer_name = name.into();
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn set_phone_number<P>(&mut self, phone_number: P)
    where
        P: Into<String>
    {
        self.phone_number = phone_number.into();
    }

    pub fn was_skipped(&self, step: WizardStep) -> bool {
        self.skipped.contains(&step)
    }

    pub fn last_code_outcome(&self) -> VerifyOutcome {
        self.last_code_outcome
    }

    /// which factors count as ready. a code verified in this wizard counts
    /// immediately, before the next session fetch reflects it, and is
    /// attributed to the factor it was submitted for.
    pub fn progress(&self) -> EnrollmentProgress {
        let mut progress = self.session.borrow()
            .as_ref()
            .map(EnrollmentProgress::from)
            .unwrap_or_default();

        match self.verified_factor {
            Some(EnrollMode::Totp) => progress.totp_ready = true,
            Some(EnrollMode::Sms) => progress.sms_ready = true,
            None => {}
        }

        progress
    }

    pub fn can_advance(&self) -> bool {
        match self.phase {
            WizardPhase::Step(WizardStep::ComputerName) => !self.computer_name.is_empty(),
            WizardPhase::Step(WizardStep::MfaSetup) => self.settled && self.progress().any(),
            WizardPhase::Completed => false,
        }
    }

    /// submits the current step and moves forward. the computer name step
    /// advances even when the save fails, the name can be fixed later from
    /// the desktop itself.
    pub async fn next(&mut self) -> StepOutcome {
        match self.phase {
            WizardPhase::Step(WizardStep::ComputerName) => {
                if self.computer_name.is_empty() {
                    self.skip(WizardStep::ComputerName);

                    return StepOutcome::Skipped;
                }

                let alert = match UpdateDesktop::name(&self.computer_name).send(&self.client).await {
                    Ok(()) => Alert::success("Computer name was updated"),
                    Err(err) => {
                        tracing::warn!("computer name update failed: {}", err);

                        Alert::error(err.to_string())
                    }
                };

                self.skipped.remove(&WizardStep::ComputerName);
                self.phase = WizardPhase::Step(WizardStep::MfaSetup);

                StepOutcome::Advanced(alert)
            }
            WizardPhase::Step(WizardStep::MfaSetup) => {
                if !self.can_advance() {
                    return StepOutcome::Blocked;
                }

                match CommitEnrollment::new().send(&self.client).await {
                    Ok(()) => {
                        self.phase = WizardPhase::Completed;

                        StepOutcome::Completed(Alert::success("successfully enrolled"))
                    }
                    Err(err) => {
                        tracing::warn!("enrollment commit failed: {}", err);

                        StepOutcome::Failed(Alert::error(err.to_string()))
                    }
                }
            }
            WizardPhase::Completed => StepOutcome::Blocked,
        }
    }

    /// steps back to the previous step. a no-op on the first step and after
    /// completion.
    pub fn back(&mut self) {
        if self.phase == WizardPhase::Step(WizardStep::MfaSetup) {
            self.phase = WizardPhase::Step(WizardStep::ComputerName);
        }
    }

    /// jumps over an optional step. calling this for a required step is a
    /// caller bug.
    pub fn skip(&mut self, step: WizardStep) {
        assert!(step.optional(), "cannot skip a step that is not optional");

        self.skipped.insert(step);
        self.phase = WizardPhase::Step(WizardStep::MfaSetup);
    }

    /// folds in the latest session snapshot. enrollment finished elsewhere
    /// completes the wizard in place.
    pub fn refresh(&mut self) {
        let enrolled = {
            let snapshot = self.session.borrow();

            match snapshot.as_ref() {
                Some(user) => Some(user.enrolled),
                None => None,
            }
        };

        if let Some(enrolled) = enrolled {
            self.settled = true;

            if enrolled {
                self.phase = WizardPhase::Completed;
            }
        }
    }

    /// verifies an enrollment code against the active factor
    pub async fn submit_code(&mut self, code: &str) -> Alert {
        let factor = self.mode;
        let request = match factor {
            EnrollMode::Totp => SubmitEnrollCode::totp(code),
            EnrollMode::Sms => SubmitEnrollCode::sms(code),
        };

        match request.send(&self.client).await {
            Ok(()) => {
                self.last_code_outcome = VerifyOutcome::Success;
                self.verified_factor = Some(factor);

                Alert::success("successfully verified code")
            }
            Err(err) => {
                self.last_code_outcome = VerifyOutcome::Failure;

                Alert::error(err.to_string())
            }
        }
    }

    /// texts an enrollment code to the phone number typed into the wizard.
    /// returns `None` while the resend throttle is active.
    pub async fn submit_phone(&mut self) -> Option<Alert> {
        if !alp_lib::phone::phone_number_valid(&self.phone_number) {
            return Some(Alert::error("The phone number field is invalid"));
        }

        if self.phone_cooldown.swap(true, Ordering::AcqRel) {
            return None;
        }

        self.spawn_phone_cooldown_reset();

        match InitiateEnrollSms::phone(&self.phone_number).send(&self.client).await {
            Ok(()) => Some(Alert::info("An sms has been sent to you")),
            Err(err) => {
                tracing::warn!("enrollment sms send failed: {}", err);

                Some(Alert::error(err.to_string()))
            }
        }
    }

    /// fetches the provisioning uri for the authenticator app qr code
    pub async fn totp_key_uri(&self) -> Result<String, RequestError> {
        let body = RetrieveTotpKeyUri::new().send(&self.client).await?;

        Ok(body.uri)
    }

    fn spawn_phone_cooldown_reset(&self) {
        let cooldown = self.phone_cooldown.clone();
        let token = self.teardown.child_token();
        let delay = self.timing.resend_cooldown;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    cooldown.store(false, Ordering::Release);
                }
            }
        });
    }
}

impl Drop for EnrollmentWizard {
    fn drop(&mut self) {
        self.teardown.cancel();
    }
}

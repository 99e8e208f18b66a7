use std::time::Duration;

/// client side timing windows. injectable so tests can shrink them.
#[derive(Debug, Clone)]
pub struct Timing {
    /// gap between session snapshot fetches
    pub poll_interval: Duration,
    /// minimum gap between repeated sms initiations
    pub resend_cooldown: Duration,
    /// delay before falling back to totp after a failed sms send
    pub revert_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            poll_interval: Duration::from_millis(2000),
            resend_cooldown: Duration::from_millis(3000),
            revert_delay: Duration::from_millis(1500),
        }
    }
}

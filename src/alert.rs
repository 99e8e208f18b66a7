#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// transient user facing notice. consumers decide how long it stays on
/// screen and how it looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    pub fn info<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Alert {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Alert {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Alert {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

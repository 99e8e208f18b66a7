use crate::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("cookie store lock was poisoned")]
    PoisonedLock,

    #[error("failed to build the http client")]
    Reqwest(#[source] reqwest::Error),
}

/// normalized failure for a single gateway call. callers only ever see a
/// human readable message; the transport error, when there is one, is kept
/// as the source for logging.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// the payload failed local validation. nothing was sent.
    #[error(transparent)]
    Validation(#[from] ApiError),

    /// the server rejected the call. the message comes from the response
    /// body when it carries one, otherwise it is the per call fallback.
    #[error("{msg}")]
    Api {
        code: Option<u32>,
        msg: String,
    },

    /// the request never completed or the response body was unreadable.
    /// the message is the per call fallback.
    #[error("{msg}")]
    Transport {
        msg: String,
        #[source]
        source: reqwest::Error,
    },
}

impl RequestError {
    pub(crate) async fn from_response(res: reqwest::Response, fallback: &str) -> Self {
        match res.json::<ApiError>().await {
            Ok(body) => RequestError::Api {
                code: body.code(),
                msg: body.msg().into(),
            },
            Err(err) => RequestError::Transport {
                msg: fallback.into(),
                source: err,
            }
        }
    }

    pub(crate) fn transport(fallback: &str, source: reqwest::Error) -> Self {
        RequestError::Transport {
            msg: fallback.into(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RequestError::Validation(_))
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            RequestError::Api { code, .. } => *code,
            _ => None,
        }
    }
}

use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Detail {
    Keys(Vec<String>),
}

impl Detail {
    pub fn with_key<K>(key: K) -> Self
    where
        K: Into<String>
    {
        Detail::Keys(vec![key.into()])
    }

    pub fn mult_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>
    {
        Detail::Keys(keys.into_iter().map(|k| k.into()).collect())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            Detail::Keys(list) => list.iter().any(|k| k == key),
        }
    }
}

impl std::fmt::Display for Detail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detail::Keys(list) => {
                let mut iter = list.iter();

                if let Some(first) = iter.next() {
                    write!(f, "{}", first)?;

                    for key in iter {
                        write!(f, ",{}", key)?;
                    }
                }
            },
        }

        Ok(())
    }
}

/// error body returned by the server in the form
/// `{"code": N, "error": "..."}`. also used for client side validation
/// failures where `detail` names the rejected fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<u32>,

    #[serde(rename = "error")]
    msg: String,

    #[serde(skip)]
    detail: Option<Detail>,
}

impl ApiError {
    pub fn message<M>(msg: M) -> Self
    where
        M: Into<String>
    {
        ApiError {
            code: None,
            msg: msg.into(),
            detail: None,
        }
    }

    pub fn validation(detail: Detail) -> Self {
        ApiError {
            code: None,
            msg: String::from("validation failed"),
            detail: Some(detail),
        }
    }

    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn code(&self) -> Option<u32> {
        self.code
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn deserialize_server_body() {
        let body: ApiError = serde_json::from_str(r#"{"code": 403, "error": "invalid credentials"}"#)
            .expect("valid error body");

        assert_eq!(body.code(), Some(403));
        assert_eq!(body.msg(), "invalid credentials");
    }

    #[test]
    pub fn deserialize_body_without_code() {
        let body: ApiError = serde_json::from_str(r#"{"error": "invalid credentials"}"#)
            .expect("valid error body");

        assert_eq!(body.code(), None);
    }

    #[test]
    pub fn display_with_detail() {
        let err = ApiError::validation(Detail::mult_keys(["username", "password"]));

        assert_eq!(err.to_string(), "validation failed: username,password");
    }
}

use std::sync::Arc;

use reqwest::{RequestBuilder, Url};
use reqwest_cookie_store::{CookieStore, CookieStoreRwLock};

pub mod error;
pub mod auth;
pub mod users;

use error::ApiClientError;

/// async client for the login portal backend. every request carries the
/// session cookie jar so stage 1 login establishes the session for all
/// later calls.
pub struct ApiClient {
    pub(crate) store: Arc<CookieStoreRwLock>,
    pub(crate) client: reqwest::Client,
    pub(crate) url: Url,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder {
            url: Url::parse("http://localhost/").unwrap(),
            agent: None
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// drops all cookies, forgetting the current session on the client side.
    pub fn clear_session(&self) -> Result<(), ApiClientError> {
        let mut store = self.store.write()
            .map_err(|_e| ApiClientError::PoisonedLock)?;

        store.clear();

        Ok(())
    }

    // paths are joined relative to the configured base so any api prefix on
    // the base url is preserved
    pub(crate) fn get<U>(&self, path: U) -> RequestBuilder
    where
        U: AsRef<str>,
    {
        let url = self.url.join(path.as_ref()).unwrap();

        self.client.get(url)
    }

    pub(crate) fn post<U>(&self, path: U) -> RequestBuilder
    where
        U: AsRef<str>
    {
        let url = self.url.join(path.as_ref()).unwrap();

        self.client.post(url)
    }

    pub(crate) fn put<U>(&self, path: U) -> RequestBuilder
    where
        U: AsRef<str>
    {
        let url = self.url.join(path.as_ref()).unwrap();

        self.client.put(url)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use wiremock::MockServer;

    use super::ApiClient;

    pub fn client_for(server: &MockServer) -> ApiClient {
        let mut builder = ApiClient::builder();
        builder.base_url(reqwest::Url::parse(&format!("{}/", server.uri())).unwrap());

        builder.build().unwrap()
    }

    pub fn user_payload() -> serde_json::Value {
        serde_json::json!({
            "id": "usr-1",
            "kind": "user",
            "name": "asaf",
            "system": false,
            "enabled": true,
            "phone_number": "",
            "ctime": "2020-01-01T00:00:00Z",
            "mtime": "2020-01-02T00:00:00Z",
            "supervisor": "",
            "auth_level": 1,
            "personal_desktop": "",
            "enrolled": false,
            "totp_enabled": true,
            "totp_enrolled": false
        })
    }
}


pub struct ApiClientBuilder {
    url: Url,
    agent: Option<String>
}

impl ApiClientBuilder {
    pub fn secure(&mut self, is_secure: bool) {
        if is_secure {
            self.url.set_scheme("https").unwrap();
        } else {
            self.url.set_scheme("http").unwrap();
        }
    }

    pub fn host<H>(&mut self, host: H) -> bool
    where
        H: AsRef<str>
    {
        self.url.set_host(Some(host.as_ref())).is_ok()
    }

    pub fn port(&mut self, port: Option<u16>) {
        self.url.set_port(port).unwrap()
    }

    /// replaces the full base url. the path portion must end with a slash
    /// for endpoint paths to join under it.
    pub fn base_url(&mut self, url: Url) {
        self.url = url;
    }

    pub fn user_agent<U>(&mut self, user_agent: U)
    where
        U: Into<String>
    {
        self.agent = Some(user_agent.into());
    }

    pub fn build(self) -> Result<ApiClient, ApiClientError> {
        let user_agent = self.agent.unwrap_or("alp-api-client/0.1.0".into());
        let store = Arc::new(CookieStoreRwLock::new(CookieStore::default()));

        let client = reqwest::Client::builder()
            .cookie_provider(store.clone())
            .user_agent(user_agent)
            .build()
            .map_err(ApiClientError::Reqwest)?;

        Ok(ApiClient {
            store,
            client,
            url: self.url
        })
    }
}

use std::sync::Arc;
use std::time::Duration;

use alp_api::client::ApiClient;
use alp_api::client::users::RetrieveMe;
use alp_api::users::User;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// per snapshot view of which mfa factors are already set up. recomputed
/// from the session on every read, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrollmentProgress {
    pub sms_ready: bool,
    pub totp_ready: bool,
}

impl EnrollmentProgress {
    pub fn any(&self) -> bool {
        self.sms_ready || self.totp_ready
    }
}

impl From<&User> for EnrollmentProgress {
    fn from(user: &User) -> Self {
        EnrollmentProgress {
            sms_ready: !user.phone_number.is_empty(),
            totp_ready: user.totp_enrolled,
        }
    }
}

/// receiving side of the snapshot store. dropping it detaches the
/// subscriber without touching the poller.
pub type SessionWatch = watch::Receiver<Option<User>>;

/// last write wins cache of the most recently fetched session descriptor.
/// `None` means nobody is logged in as far as the last fetch could tell.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<User>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);

        SessionStore {
            tx: Arc::new(tx),
        }
    }

    pub fn publish(&self, session: Option<User>) {
        self.tx.send_replace(session);
    }

    pub fn latest(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> SessionWatch {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::new()
    }
}

/// owns the single repeating session fetch. every tick republishes into the
/// store; fetch failures keep the previous snapshot (stale but available)
/// and are only logged.
pub struct SessionPoller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SessionPoller {
    /// spawns the fetch timer. the first fetch happens one full interval
    /// after spawn.
    pub fn spawn(client: Arc<ApiClient>, store: SessionStore, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = RetrieveMe::new().send(&client).await;

                // a fetch that settles after cancellation must not reach
                // the store
                if task_token.is_cancelled() {
                    break;
                }

                match result {
                    Ok(session) => store.publish(session),
                    Err(err) => {
                        tracing::warn!("session fetch failed: {err}");
                    }
                }
            }
        });

        SessionPoller {
            token,
            handle: Some(handle),
        }
    }

    /// stops all future ticks. safe to call more than once.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// cancels and waits for the timer task to wind down.
    pub async fn shutdown(mut self) {
        self.token.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::error!("session poller task failed: {err}");
            }
        }
    }
}

impl Drop for SessionPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod test {
    use wiremock::{MockServer, Mock, ResponseTemplate};
    use wiremock::matchers::{method, path};

    use super::*;
    use crate::test_util::{client_for, user};

    #[tokio::test]
    async fn poller_publishes_snapshots() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(crate::test_util::user_payload()))
            .mount(&server)
            .await;

        let store = SessionStore::new();
        let mut watch = store.subscribe();
        let poller = SessionPoller::spawn(
            Arc::new(client_for(&server)),
            store.clone(),
            Duration::from_millis(20),
        );

        watch.changed().await.expect("store outlives the poller");

        assert_eq!(store.latest().unwrap().name, "asaf");

        poller.shutdown().await;
    }

    #[tokio::test]
    async fn poller_keeps_stale_snapshot_on_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let store = SessionStore::new();
        store.publish(Some(user()));

        let poller = SessionPoller::spawn(
            Arc::new(client_for(&server)),
            store.clone(),
            Duration::from_millis(20),
        );

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(store.latest().is_some(), "transient failure must not clear the snapshot");
        assert!(!server.received_requests().await.unwrap().is_empty(), "poller kept ticking");

        poller.shutdown().await;
    }

    #[tokio::test]
    async fn poller_publishes_no_session() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = SessionStore::new();
        store.publish(Some(user()));

        let mut watch = store.subscribe();
        let poller = SessionPoller::spawn(
            Arc::new(client_for(&server)),
            store.clone(),
            Duration::from_millis(20),
        );

        watch.changed().await.unwrap();

        assert!(store.latest().is_none(), "forbidden republishes as no session");

        poller.shutdown().await;
    }

    #[tokio::test]
    async fn cancel_stops_ticks_and_is_idempotent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = SessionStore::new();
        let poller = SessionPoller::spawn(
            Arc::new(client_for(&server)),
            store.clone(),
            Duration::from_millis(20),
        );

        poller.cancel();
        poller.cancel();
        poller.shutdown().await;

        let seen = server.received_requests().await.unwrap().len();

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(server.received_requests().await.unwrap().len(), seen, "no ticks after cancel");
    }

    #[tokio::test]
    async fn subscribers_detach_without_stopping_the_timer() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(crate::test_util::user_payload()))
            .mount(&server)
            .await;

        let store = SessionStore::new();
        let poller = SessionPoller::spawn(
            Arc::new(client_for(&server)),
            store.clone(),
            Duration::from_millis(20),
        );

        let first = store.subscribe();
        drop(first);

        let mut second = store.subscribe();
        second.changed().await.expect("timer unaffected by detached subscribers");

        poller.shutdown().await;
    }
}

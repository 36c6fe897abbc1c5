use crate::app::event::{AppEvent, FetchEvent};
use crate::app::state::now_unix;
use crate::debug_hooks;
use patternscan::{HttpTransport, PatternClient, PatternFilters, Transport};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Runs fetches off the event loop and reports back as [`FetchEvent`]s.
pub struct Refresher<T: Transport = HttpTransport> {
    client: PatternClient<T>,
    tx: UnboundedSender<AppEvent>,
}

impl<T: Transport + 'static> Refresher<T> {
    pub fn new(client: PatternClient<T>, tx: UnboundedSender<AppEvent>) -> Self {
        Self { client, tx }
    }

    pub fn client(&self) -> &PatternClient<T> {
        &self.client
    }

    /// One fetch for `filters`. Exactly one event is sent when it finishes.
    pub fn spawn(&self, filters: PatternFilters) -> JoinHandle<()> {
        let client = self.client.clone();
        let tx = self.tx.clone();
        debug_hooks::log_refresh_started(&filters);
        tokio::spawn(async move {
            let started = Instant::now();
            let ev = match client.fetch_patterns(&filters).await {
                Ok(patterns) => FetchEvent::Completed {
                    patterns,
                    finished_unix: now_unix(),
                    elapsed_ms: started.elapsed().as_millis(),
                },
                Err(err) => FetchEvent::Failed {
                    kind: err.kind(),
                    message: err.user_message(),
                    finished_unix: now_unix(),
                },
            };
            // receiver gone means the app is shutting down
            let _ = tx.send(AppEvent::Fetch(ev));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use patternscan::{ClientConfig, FetchErrorKind, RawResponse, RetryPolicy, TransportError, Url};
    use std::sync::{Arc, Mutex};

    struct Fixed {
        status: u16,
        body: &'static str,
        seen: Arc<Mutex<Vec<Url>>>,
    }

    #[async_trait]
    impl Transport for Fixed {
        async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
            self.seen.lock().unwrap().push(url.clone());
            Ok(RawResponse::new(self.status, self.body))
        }
    }

    fn refresher(
        status: u16,
        body: &'static str,
    ) -> (
        Refresher<Fixed>,
        tokio::sync::mpsc::UnboundedReceiver<AppEvent>,
        Arc<Mutex<Vec<Url>>>,
    ) {
        let config = ClientConfig {
            retry: RetryPolicy::none(),
            ..ClientConfig::default()
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = Fixed {
            status,
            body,
            seen: Arc::clone(&seen),
        };
        let client = PatternClient::new(transport, &config).unwrap();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Refresher::new(client, tx), rx, seen)
    }

    #[tokio::test]
    async fn success_sends_completed() {
        let body = r#"{"patterns":[{"symbol":"AAPL","pattern":"bull_flag","confidence":0.9,
            "price":190.0,"change_percent":1.0,"volume":10,"timestamp":1700000000000}]}"#;
        let (r, mut rx, _) = refresher(200, body);
        r.spawn(PatternFilters::default().with_symbols(["AAPL"]))
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            AppEvent::Fetch(FetchEvent::Completed { patterns, .. }) => {
                assert_eq!(patterns.len(), 1);
                assert_eq!(patterns[0].symbol, "AAPL");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failure_sends_user_message() {
        let (r, mut rx, _) = refresher(401, r#"{"detail":"token expired"}"#);
        r.spawn(PatternFilters::default()).await.unwrap();
        match rx.recv().await.unwrap() {
            AppEvent::Fetch(FetchEvent::Failed { kind, message, .. }) => {
                assert_eq!(kind, FetchErrorKind::AuthenticationRequired);
                assert_eq!(message, "Authentication required. Check the API token.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn filters_snapshot_reaches_the_wire() {
        let (r, mut rx, seen) = refresher(200, r#"{"patterns":[]}"#);
        r.spawn(PatternFilters::default().with_universe("nasdaq100").with_limit(5))
            .await
            .unwrap();
        rx.recv().await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path(), "/api/patterns/scan");
        assert_eq!(seen[0].query(), Some("universe=nasdaq100&limit=5"));
    }
}

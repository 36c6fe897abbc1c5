pub mod event;
pub mod reducer;
pub mod render;
pub mod state;

pub use event::*;
pub use state::*;

use crate::refresh::Refresher;
use patternscan::{HttpTransport, Transport};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Owns the state and launches the fetches the reducer asks for.
pub struct AppRuntime<T: Transport = HttpTransport> {
    pub state: AppState,
    refresher: Refresher<T>,
    in_flight: Option<JoinHandle<()>>,
    dirty: bool,
    last_tick_unix: u64,
}

impl<T: Transport + 'static> AppRuntime<T> {
    pub fn new(state: AppState, refresher: Refresher<T>) -> Self {
        Self {
            state,
            refresher,
            in_flight: None,
            dirty: true,
            last_tick_unix: 0,
        }
    }

    pub fn handle_event(&mut self, ev: AppEvent) {
        if matches!(ev, AppEvent::Fetch(_)) {
            self.in_flight = None;
        }
        if reducer::reduce(&mut self.state, ev) {
            self.dirty = true;
        }
        if let Some(filters) = self.state.take_refresh_request() {
            self.in_flight = Some(self.refresher.spawn(filters));
        }
    }

    pub fn tick_if_needed(&mut self) {
        let now = now_unix();
        if now != self.last_tick_unix {
            self.last_tick_unix = now;
            self.handle_event(AppEvent::Timer(TimerEvent::Tick { now_unix: now }));
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Rendered text if anything changed since the last call.
    pub fn render_if_dirty(&mut self) -> Option<String> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(render::render(&self.state))
    }

    /// Event loop: applies events, ticks once a second and hands each changed
    /// frame to `on_frame`. Returns once `shutdown` resolves; the shutdown
    /// future lives across iterations so a signal is never dropped.
    pub async fn run<F>(
        &mut self,
        rx: &mut UnboundedReceiver<AppEvent>,
        shutdown: F,
        mut on_frame: impl FnMut(String),
    ) where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                Some(ev) = rx.recv() => self.handle_event(ev),
                _ = ticker.tick() => self.tick_if_needed(),
            }
            if let Some(frame) = self.render_if_dirty() {
                on_frame(frame);
            }
        }
        self.shutdown();
    }

    /// Stops a fetch still in flight.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use patternscan::{ClientConfig, PatternClient, RawResponse, RetryPolicy, TransportError, Url};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Transport for Counting {
        async fn get(&self, _url: &Url) -> Result<RawResponse, TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(RawResponse::new(200, r#"{"patterns":[]}"#))
        }
    }

    #[tokio::test]
    async fn repeated_refresh_runs_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = ClientConfig {
            retry: RetryPolicy::none(),
            ..ClientConfig::default()
        };
        let client = PatternClient::new(Counting(Arc::clone(&calls)), &config).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut rt = AppRuntime::new(AppState::default(), Refresher::new(client, tx));

        for _ in 0..5 {
            rt.handle_event(AppEvent::Ui(UiEvent::RefreshRequested));
        }
        assert!(rt.is_fetching());

        let done = rx.recv().await.unwrap();
        assert!(matches!(done, AppEvent::Fetch(FetchEvent::Completed { .. })));
        rt.handle_event(done);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!rt.state.is_loading);
        assert!(!rt.is_fetching());

        rt.handle_event(AppEvent::Ui(UiEvent::RefreshRequested));
        let done = rx.recv().await.unwrap();
        rt.handle_event(done);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(rt.render_if_dirty().is_some());
        assert!(rt.render_if_dirty().is_none());
    }

    fn runtime() -> (
        AppRuntime<Counting>,
        mpsc::UnboundedReceiver<AppEvent>,
        mpsc::UnboundedSender<AppEvent>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = ClientConfig {
            retry: RetryPolicy::none(),
            ..ClientConfig::default()
        };
        let client = PatternClient::new(Counting(Arc::clone(&calls)), &config).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let rt = AppRuntime::new(AppState::default(), Refresher::new(client, tx.clone()));
        (rt, rx, tx, calls)
    }

    #[tokio::test]
    async fn run_processes_events_until_shutdown() {
        let (mut rt, mut rx, tx, calls) = runtime();
        rt.state.auto_refresh_secs = 0;
        rt.handle_event(AppEvent::Ui(UiEvent::RefreshRequested));

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let mut frames = Vec::new();
        let driver = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            tx.send(AppEvent::Ui(UiEvent::WatchlistAdd { symbol: "nvda".into() }))
                .unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            stop_tx.send(()).unwrap();
        });

        rt.run(&mut rx, async { stop_rx.await.unwrap_or(()) }, |f| frames.push(f))
            .await;
        driver.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!rt.state.is_loading);
        assert!(rt.state.watchlist.contains("NVDA"));
        assert!(frames.iter().any(|f| f.contains("Added NVDA to watchlist.")));
    }

    #[tokio::test]
    async fn run_returns_when_shutdown_already_fired() {
        let (mut rt, mut rx, _tx, _) = runtime();
        rt.handle_event(AppEvent::Ui(UiEvent::RefreshRequested));
        assert!(rt.is_fetching());

        tokio::time::timeout(
            Duration::from_secs(1),
            rt.run(&mut rx, std::future::ready(()), |_| {}),
        )
        .await
        .unwrap();
        assert!(!rt.is_fetching());
    }
}

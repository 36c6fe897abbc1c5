use super::frame::parse_frame;
use crate::app::event::{AppEvent, LiveEvent};
use crate::debug_hooks;
use crate::settings::FeedSettings;
use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Keeps a subscription open until the receiving side goes away.
/// Each drop is reported as [`LiveEvent::Disconnected`] before reconnecting.
pub async fn run_live_feed(settings: FeedSettings, tx: UnboundedSender<AppEvent>) {
    let delay = Duration::from_secs(settings.reconnect_secs.max(1));
    loop {
        let reason = match run_connection(&settings.endpoint, &tx).await {
            Ok(()) => "stream ended".to_string(),
            Err(err) => format!("{err:#}"),
        };
        debug_hooks::log_live_disconnected(&reason);
        if tx
            .send(AppEvent::Live(LiveEvent::Disconnected { reason }))
            .is_err()
        {
            return;
        }
        sleep(delay).await;
        if tx.is_closed() {
            return;
        }
    }
}

async fn run_connection(endpoint: &str, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    let (mut ws, _) = connect_async(endpoint)
        .await
        .with_context(|| format!("failed to connect to {endpoint}"))?;
    debug_hooks::log_live_connected(endpoint);

    subscribe(&mut ws, "patterns").await?;
    send(tx, LiveEvent::Connected)?;

    while let Some(msg) = ws.next().await {
        match msg {
            Ok(Message::Text(txt)) => match parse_frame(&txt) {
                Ok(Some(ev)) => send(tx, ev)?,
                Ok(None) => {}
                Err(err) => debug_hooks::log_live_frame_error(&txt, &format!("{err:#}")),
            },
            Ok(Message::Ping(payload)) => {
                ws.send(Message::Pong(payload)).await.ok();
            }
            Ok(Message::Close(frame)) => {
                log::debug!(target: "feed.live", "close frame: {:?}", frame);
                break;
            }
            Ok(_) => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

async fn subscribe(ws: &mut Ws, channel: &str) -> Result<()> {
    let msg = json!({
        "type": "subscribe",
        "channel": channel,
    });
    ws.send(Message::Text(msg.to_string()))
        .await
        .with_context(|| format!("failed to subscribe to {channel}"))
}

fn send(tx: &UnboundedSender<AppEvent>, ev: LiveEvent) -> Result<()> {
    tx.send(AppEvent::Live(ev))
        .map_err(|_| anyhow!("event channel closed"))
}

/// Rustls 0.23 needs a process-wide crypto provider before any `wss://`
/// handshake. An already installed provider is kept.
pub fn install_rustls_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    async fn one_shot_server(frames: Vec<&'static str>) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let subscribe = match ws.next().await.unwrap().unwrap() {
                Message::Text(t) => t,
                other => panic!("expected subscribe, got {other:?}"),
            };
            for f in frames {
                ws.send(Message::Text(f.to_string())).await.unwrap();
            }
            ws.close(None).await.ok();
            subscribe
        });
        (format!("ws://{addr}"), handle)
    }

    #[tokio::test]
    async fn forwards_typed_events_and_reports_disconnect() {
        let (endpoint, server) = one_shot_server(vec![
            r#"{"type":"heartbeat"}"#,
            "garbage",
            r#"{"type":"price_update","symbol":"AAPL","price":190.0,"change_percent":1.5}"#,
        ])
        .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let settings = FeedSettings {
            endpoint,
            enabled: true,
            reconnect_secs: 60,
        };
        let feed = tokio::spawn(run_live_feed(settings, tx));

        let mut events = Vec::new();
        while events.len() < 3 {
            match rx.recv().await.unwrap() {
                AppEvent::Live(ev) => events.push(ev),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(events[0], LiveEvent::Connected);
        assert_eq!(
            events[1],
            LiveEvent::PriceUpdate {
                symbol: "AAPL".into(),
                price: 190.0,
                change_percent: 1.5
            }
        );
        assert!(matches!(events[2], LiveEvent::Disconnected { .. }));

        let subscribe: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(subscribe["type"], "subscribe");
        assert_eq!(subscribe["channel"], "patterns");

        feed.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let settings = FeedSettings {
            endpoint: format!("ws://{addr}"),
            enabled: true,
            reconnect_secs: 60,
        };
        let feed = tokio::spawn(run_live_feed(settings, tx));
        match rx.recv().await.unwrap() {
            AppEvent::Live(LiveEvent::Disconnected { reason }) => {
                assert!(reason.contains("failed to connect"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
        feed.abort();
    }

    #[tokio::test]
    async fn stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let settings = FeedSettings {
            endpoint: "ws://127.0.0.1:9".into(),
            enabled: true,
            reconnect_secs: 1,
        };
        tokio::time::timeout(Duration::from_secs(5), run_live_feed(settings, tx))
            .await
            .unwrap();
    }
}

//! Application wiring against an in-memory geyser server.

use futures_util::{sink, stream};
use pumpwatch_bot::{commands, AppConfig, AppError, Application};
use pumpwatch_stream::{
    is_ping_request, GeyserConnector, GeyserDuplex, StreamError, StreamResult,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use yellowstone_grpc_proto::prelude::{SubscribeRequest, SubscribeUpdate};

const ALICE: &str = "ZDLFG5UNPzeNsEkacw9TdKHT1fBZCACfAQymjWnpcvg";
const BOB: &str = "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Server end of one mock session.
struct ServerSession {
    requests: mpsc::UnboundedReceiver<SubscribeRequest>,
    // Held so the client stream stays open.
    _updates: mpsc::UnboundedSender<Result<SubscribeUpdate, tonic::Status>>,
}

impl ServerSession {
    async fn next_subscription(&mut self) -> SubscribeRequest {
        timeout(Duration::from_secs(10), async {
            loop {
                let request = self.requests.recv().await.expect("client hung up");
                if !is_ping_request(&request) {
                    return request;
                }
            }
        })
        .await
        .expect("no subscription received")
    }
}

struct MockConnector {
    sessions: mpsc::UnboundedSender<ServerSession>,
    refuse: bool,
}

impl MockConnector {
    fn new(refuse: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerSession>) {
        let (sessions, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { sessions, refuse }), rx)
    }

    fn open(&self) -> StreamResult<GeyserDuplex> {
        if self.refuse {
            return Err(StreamError::Transport("connection refused".to_string()));
        }

        let (request_tx, requests) = mpsc::unbounded_channel::<SubscribeRequest>();
        let (updates, update_rx) = mpsc::unbounded_channel();
        let _ = self.sessions.send(ServerSession {
            requests,
            _updates: updates,
        });

        let request_sink = sink::unfold(request_tx, |tx, request: SubscribeRequest| async move {
            tx.send(request)
                .map_err(|e| StreamError::Send(e.to_string()))?;
            Ok::<_, StreamError>(tx)
        });
        let update_stream = stream::unfold(update_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Ok(GeyserDuplex {
            sink: Box::pin(request_sink),
            stream: Box::pin(update_stream),
        })
    }
}

impl GeyserConnector for MockConnector {
    fn connect(&self) -> BoxFuture<'_, StreamResult<GeyserDuplex>> {
        let result = self.open();
        Box::pin(async move { result })
    }
}

fn test_config(registry_path: &str) -> AppConfig {
    AppConfig::from_toml(&format!(
        r#"
        [stream]
        endpoint = "http://127.0.0.1:10000"

        [registry]
        path = "{registry_path}"
        reload_interval_ms = 50

        [telemetry]
        metrics_port = 0
        "#
    ))
    .unwrap()
}

fn included(request: &SubscribeRequest) -> Vec<String> {
    let mut addresses = request
        .transactions
        .get("pumpFun")
        .map(|f| f.account_include.clone())
        .unwrap_or_default();
    addresses.sort();
    addresses
}

#[tokio::test]
async fn test_cli_edit_reaches_running_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("addresses.json");
    let path = path.to_str().unwrap().to_string();
    commands::add(&path, ALICE, "Alice").await.unwrap();

    let app = Application::new(test_config(&path)).await.unwrap();
    assert_eq!(app.registry().entries().len(), 1);

    let (connector, mut sessions) = MockConnector::new(false);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let driver = async {
        let mut server = timeout(Duration::from_secs(10), sessions.recv())
            .await
            .expect("no session opened")
            .expect("connector dropped");

        let initial = server.next_subscription().await;
        assert_eq!(included(&initial), vec![ALICE.to_string()]);

        // A separate CLI invocation edits the same file.
        commands::add(&path, BOB, "Bob").await.unwrap();

        let resent = server.next_subscription().await;
        let mut expected = vec![ALICE.to_string(), BOB.to_string()];
        expected.sort();
        assert_eq!(included(&resent), expected);

        let _ = stop_tx.send(());
    };

    let (result, ()) = tokio::join!(
        app.run_until(connector, async {
            let _ = stop_rx.await;
        }),
        driver
    );
    result.unwrap();
}

#[tokio::test]
async fn test_refused_connection_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("addresses.json");
    let app = Application::new(test_config(path.to_str().unwrap()))
        .await
        .unwrap();

    let (connector, _sessions) = MockConnector::new(true);
    let err = app
        .run_until(connector, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Stream(_)));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_start() {
    let mut config = AppConfig::default();
    config.stream.program_id = "not-an-address".to_string();

    let err = Application::new(config).await.err().unwrap();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_shipped_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
    let config = AppConfig::load(path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.stream.filter_tag, "pumpFun");
    assert!(!config.notify.telegram_enabled());
}

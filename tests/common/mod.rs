//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use waitlist_gateway::config::GatewayConfig;
use waitlist_gateway::gateway::GatewayServer;
use waitlist_gateway::lifecycle::Shutdown;
use waitlist_gateway::secrets::SecretVault;

pub const CAPTCHA_SECRET: &str = "captcha-secret-9f3a";
pub const RESEND_API_KEY: &str = "re_test_key_77b1";
pub const WEBHOOK_SECRET: &str = "whsec_test_4c2d";

/// Baseline config for tests: loopback listener, test-only secret env
/// names, metrics off.
pub fn test_config() -> GatewayConfig {
    std::env::set_var("TEST_RECAPTCHA_SECRET", CAPTCHA_SECRET);
    std::env::set_var("TEST_RESEND_API_KEY", RESEND_API_KEY);
    std::env::set_var("TEST_WEBHOOK_SECRET", WEBHOOK_SECRET);

    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config.captcha.secret_env = "TEST_RECAPTCHA_SECRET".to_string();
    config.subscribe.api_key_env = "TEST_RESEND_API_KEY".to_string();
    config.subscribe.allowed_audiences = vec!["aud_test".to_string()];
    config.webhook.secret_env = "TEST_WEBHOOK_SECRET".to_string();
    config.webhook.allowed_webhooks = vec!["https://hook.example/a".to_string()];
    config
}

/// Boot the gateway on an ephemeral loopback port. The returned `Shutdown`
/// must be kept alive for the duration of the test.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let vault = SecretVault::from_env(&config).expect("test secrets must resolve");
    let server = GatewayServer::new(config, vault).expect("server must build");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown, rx) = Shutdown::new();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Start a programmable mock downstream speaking just enough HTTP/1.1.
/// The closure decides status and JSON body per request.
pub async fn start_json_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request(&mut socket).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            422 => "422 Unprocessable Entity",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Drain one HTTP request (headers plus Content-Length body) so the client
/// never sees a reset before it finishes writing.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 4096];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(_) => return,
        }
        if let Some(header_end) = find_subsequence(&buf, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..header_end]);
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Test HTTP client that ignores any ambient proxy settings.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the enabled proxy routes
//! - Wire up middleware (CORS, tracing, limits, request ID, timeout)
//! - Bind server to listener and serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::audit::AuditSink;
use crate::config::{ConfigError, GatewayConfig};
use crate::downstream::DownstreamClient;
use crate::gateway::handlers;
use crate::gateway::Route;
use crate::secrets::SecretVault;
use crate::security::origin::cors_layer;
use crate::security::RateLimiter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub vault: Arc<SecretVault>,
    pub limiter: Arc<RateLimiter>,
    pub downstream: Arc<DownstreamClient>,
    pub audit: Arc<AuditSink>,
}

/// HTTP server for the proxy gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server from validated config and a resolved vault.
    pub fn new(config: GatewayConfig, vault: SecretVault) -> Result<Self, ConfigError> {
        let downstream = DownstreamClient::new(&config)?;

        let state = AppState {
            config: Arc::new(config.clone()),
            vault: Arc::new(vault),
            limiter: Arc::new(RateLimiter::new()),
            downstream: Arc::new(downstream),
            audit: Arc::new(AuditSink::new(config.audit.max_body_bytes)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers. Disabled routes
    /// are simply not mounted and answer 404.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new().route("/health", get(handlers::health));

        if config.captcha.enabled {
            router = router.route(Route::Captcha.path(), post(handlers::recaptcha_proxy));
        }
        if config.subscribe.enabled {
            router = router.route(Route::Subscribe.path(), post(handlers::resend_proxy));
        }
        if config.webhook.enabled {
            router = router.route(Route::Webhook.path(), post(handlers::webhook_proxy));
        }

        // Top layer runs first on the way in: a request gets its id before
        // anything traces it, and the timeout bounds the whole stack.
        router
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(cors_layer(&config.cors.allowed_origins))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            captcha = self.config.captcha.enabled,
            subscribe = self.config.subscribe.enabled,
            webhook = self.config.webhook.enabled,
            "Gateway listening"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

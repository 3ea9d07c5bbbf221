//! Web server module

mod middleware;
mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::config::Config;
use crate::service::DashboardService;
use middleware::RequestLoggingLayer;

pub struct AppState {
    pub dashboard: DashboardService,
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/analytics", get(routes::api_analytics))
        // Aggregates are computed fresh per request
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", api)
        .layer(RequestLoggingLayer::new())
        .with_state(state)
}

pub async fn start_server(config: &Config, dashboard: DashboardService) -> Result<()> {
    let state = Arc::new(AppState { dashboard });
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.http_port);

    if config.tls_enabled() {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            &config.server.tls_cert,
            &config.server.tls_key,
        )
        .await?;
        let socket: SocketAddr = addr.parse()?;
        info!("Web server starting on https://{}", addr);
        axum_server::bind_rustls(socket, tls)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;
    } else {
        info!("Web server starting on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    }

    Ok(())
}

pub mod api;

use crate::cli::Args;
use api::{ router, AppState };
use log::{ error, info, warn };
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(addr: String, state: AppState, args: Args) -> Self {
        if state.chat_client.is_none() {
            warn!("No upstream credential configured. Relay requests will be rejected with 500.");
        }
        Self { addr, state, args }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = router(self.state, &self.args.relay_path);

        if let Some((cert_path, key_path)) = self.args.tls_paths() {
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            let handle = axum_server::Handle::new();
            let shutdown = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            info!("Relay listening on https://{}{}", addr, self.args.relay_path);
            axum_server
                ::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service()).await?;
        } else {
            if self.args.enable_tls {
                warn!("ENABLE_TLS set without both TLS_CERT_PATH and TLS_KEY_PATH; serving plain HTTP.");
            }
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind relay to {}: {}. Try a different port.", addr, e);
                e
            })?;
            info!("Relay listening on http://{}{}", addr, self.args.relay_path);
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_signal()).await?;
        }

        info!("Relay stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub mod api;

use crate::cli::ServeArgs;
use crate::llm::chat::new_client;
use crate::llm::mask_api_key;
use log::{ info, warn, error };
use std::error::Error;
use std::net::SocketAddr;

use self::api::{ create_router, AppState };

pub struct Server {
    args: ServeArgs,
}

impl Server {
    pub fn new(args: ServeArgs) -> Self {
        Self { args }
    }

    fn build_state(&self) -> Result<AppState, Box<dyn Error + Send + Sync>> {
        let config = self.args.llm_config();
        match config.credential() {
            Some(key) => info!("Using API key: {}", mask_api_key(key)),
            None => warn!("API key is missing. Chat requests will fail until OPENROUTER_API_KEY is set."),
        }
        let upstream = new_client(&config)?;
        Ok(AppState::new(upstream))
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = format!("{}:{}", self.args.host, self.args.port).parse::<SocketAddr>()?;
        let app = create_router(self.build_state()?, &self.args.static_dir);

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                _ => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("TLS enabled without cert/key".into());
                }
            };
            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await?;

            info!("Server is running on https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                e
            })?;
            info!("Server is running on http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}

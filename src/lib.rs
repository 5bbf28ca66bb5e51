pub mod cli;
pub mod client;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use cli::{ Args, Command };
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve_args) => {
            info!("--- Relay Configuration ---");
            info!("Listen Address: {}:{}", serve_args.host, serve_args.port);
            info!("Static Directory: {}", serve_args.static_dir.display());
            info!("Upstream URL: {}", serve_args.upstream_url);
            info!("Upstream Model: {}", serve_args.model);
            info!("Max Tokens: {}", serve_args.max_tokens);
            info!("Temperature: {}", serve_args.temperature);
            info!("TLS Enabled: {}", serve_args.enable_tls);
            info!("---------------------------");

            Server::new(serve_args).run().await
        }
        Command::Chat(chat_args) => client::repl::run_chat(chat_args).await,
    }
}

pub mod bot;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod console;
pub mod conversation;
pub mod models;
pub mod render;
pub mod server;

use bot::ChatBot;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use classifier::{ classify, Classifier, Intent };
pub use conversation::ConversationState;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Mode: {}", args.mode);
    info!("Replies Path: {}", args.replies_path.as_deref().unwrap_or("built-in"));
    if args.mode.eq_ignore_ascii_case("server") {
        info!("Server Address: {}", args.server_addr);
        info!("HTTP Port: {:?}", args.http_port);
        info!("TLS Enabled: {}", args.enable_tls);
        info!("Max Message Size: {}", args.max_message_size);
        info!("Connection Rate: {}/s", args.connection_rate);
    }
    info!("-------------------------");

    let bot = ChatBot::new(&args)?;

    match args.mode.to_lowercase().as_str() {
        "console" => {
            tokio::task::spawn_blocking(move || {
                let stdin = io::stdin();
                let stdout = io::stdout();
                console::run_console(&bot, stdin.lock(), stdout.lock())
            }).await??;
            Ok(())
        }
        "server" => {
            let addr = args.server_addr.clone();
            info!("Starting server on: {}", addr);
            let server = Server::new(addr, Arc::new(Mutex::new(bot)), args.clone());
            server.run().await
        }
        other => Err(format!("Unsupported mode: {}", other).into()),
    }
}

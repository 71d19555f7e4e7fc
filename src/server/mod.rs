pub mod api;
pub mod auth;
pub mod websocket;

use crate::bot::ChatBot;
use crate::cli::Args;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct Server {
    addr: String,
    bot: Arc<Mutex<ChatBot>>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, bot: Arc<Mutex<ChatBot>>, args: Args) -> Self {
        Self { addr, bot, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(http_port) = self.args.http_port {
            api::start_http_server(http_port, self.bot.clone(), self.args.clone()).await?;
        }

        websocket::start_ws_server(&self.addr, self.bot.clone(), self.args.clone()).await
    }
}

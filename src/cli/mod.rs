use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- General App Args ---
    /// How the chat is hosted (console, server)
    #[arg(long, env = "CHAT_MODE", default_value = "console")]
    pub mode: String,

    /// Optional path to a JSON reply table overriding the built-in replies (e.g., json/replies.json).
    #[arg(long, env = "REPLIES_PATH")]
    pub replies_path: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional shared secret. If set, clients must sign the handshake timestamp with it.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Accepted clock skew in seconds for signed handshakes.
    #[arg(long, env = "AUTH_WINDOW_SECS", default_value = "300")]
    pub auth_window_secs: i64,

    /// Optional port for the HTTP API (health, classify, reload).
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Largest accepted WebSocket frame in bytes.
    #[arg(long, env = "MAX_MESSAGE_SIZE", default_value = "1048576")]
    pub max_message_size: usize,

    /// Accepted connections per second across all clients.
    #[arg(long, env = "CONNECTION_RATE", default_value = "10")]
    pub connection_rate: u32,

    /// Optional path to the TLS certificate file (PEM format) for enabling WSS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling WSS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

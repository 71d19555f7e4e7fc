use crate::bot::{ ChatBot, Session };
use crate::cli::Args;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::render::CHAT_TIPS;
use crate::server::auth::verify_handshake_query;

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::sync::{ mpsc, Mutex };
use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response, ErrorResponse };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_rustls::TlsAcceptor;

use rustls::ServerConfig;
use rustls::pki_types::{ CertificateDer, PrivateKeyDer };
use rustls_pemfile::{ certs, pkcs8_private_keys };

use governor::{ RateLimiter, Quota };

use chrono::Utc;
use log::{ info, warn, error, debug };
use futures::{ Sink, SinkExt, StreamExt };

type BoxError = Box<dyn Error + Send + Sync>;

/// Per-connection limits and credentials, copied into every spawned task.
#[derive(Clone, Debug)]
pub struct ConnectionSettings {
    pub api_key: Option<String>,
    pub auth_window_secs: i64,
    pub max_message_size: usize,
}

impl ConnectionSettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            api_key: args.server_api_key.clone().filter(|k| !k.trim().is_empty()),
            auth_window_secs: args.auth_window_secs,
            max_message_size: args.max_message_size,
        }
    }
}

pub(crate) fn load_tls_config(cert_path: &str, key_path: &str) -> Result<Arc<ServerConfig>, BoxError> {
    let cert_file = File::open(cert_path).map_err(|e|
        format!("Failed to open TLS certificate file '{}': {}", cert_path, e)
    )?;
    let key_file = File::open(key_path).map_err(|e|
        format!("Failed to open TLS key file '{}': {}", key_path, e)
    )?;

    let mut cert_reader = BufReader::new(cert_file);
    let mut key_reader = BufReader::new(key_file);
    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Failed to read certificate(s): {}", e))?;

    let mut keys = pkcs8_private_keys(&mut key_reader);
    let key = match keys.next() {
        Some(Ok(k)) => PrivateKeyDer::Pkcs8(k),
        Some(Err(e)) => {
            return Err(format!("Error reading private key: {}", e).into());
        }
        None => {
            return Err("No PKCS8 private key found in key file".into());
        }
    };

    let config = ServerConfig::builder_with_provider(
        Arc::new(rustls::crypto::ring::default_provider())
    )
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;
    Ok(Arc::new(config))
}

pub async fn start_ws_server(
    addr: &str,
    bot: Arc<Mutex<ChatBot>>,
    args: Args
) -> Result<(), BoxError> {
    let rate = NonZeroU32::new(args.connection_rate).ok_or(
        "--connection-rate must be greater than zero"
    )?;
    let limiter = RateLimiter::direct(Quota::per_second(rate));
    let settings = ConnectionSettings::from_args(&args);

    if settings.api_key.is_some() {
        info!("Server configured with signed handshake authentication.");
    } else {
        warn!("Server configured WITHOUT authentication. Connections are open.");
    }

    let listener = TcpListener::bind(addr).await?;

    let tls_acceptor = if args.enable_tls {
        match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let config = load_tls_config(cert_path, key_path)?;
                Some(TlsAcceptor::from(config))
            }
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("Missing TLS certificate or key path".into());
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                return Err("TLS enabled without cert/key".into());
            }
        }
    } else {
        info!("TLS not enabled. Running plain WebSocket (WS) server.");
        None
    };

    let protocol = if tls_acceptor.is_some() { "wss" } else { "ws" };
    info!("{} server listening on: {}", protocol.to_uppercase(), addr);

    loop {
        let (stream, peer) = listener.accept().await?;

        if limiter.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let bot_clone = Arc::clone(&bot);
        let settings_clone = settings.clone();
        let tls_acceptor_clone = tls_acceptor.clone();

        tokio::spawn(async move {
            let process_result = if let Some(acceptor) = tls_acceptor_clone {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        info!("TLS handshake successful for {}", peer);
                        process_connection(peer, tls_stream, bot_clone, settings_clone).await
                    }
                    Err(e) => {
                        error!("TLS handshake error for {}: {}", peer, e);
                        Err(Box::new(e) as BoxError)
                    }
                }
            } else {
                process_connection(peer, stream, bot_clone, settings_clone).await
            };

            if let Err(e) = process_result {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

fn unauthorized(reason: String) -> ErrorResponse {
    let mut res = ErrorResponse::new(Some(reason));
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    bot: Arc<Mutex<ChatBot>>,
    settings: ConnectionSettings
) -> Result<(), BoxError>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let api_key = settings.api_key.clone();
    let window = settings.auth_window_secs;
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let Some(secret) = &api_key else {
            return Ok(response);
        };

        let query = req.uri().query().unwrap_or("");
        match verify_handshake_query(secret, query, Utc::now().timestamp(), window) {
            Ok(()) => {
                info!("{} authenticated", peer);
                Ok(response)
            }
            Err(e) => {
                warn!("{}: handshake rejected: {}", peer, e);
                Err(unauthorized(e.to_string()))
            }
        }
    };

    let ws = match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            return Err(e.into());
        }
    };

    let session = {
        let mut bot_guard = bot.lock().await;
        if let Err(e) = bot_guard.reload_replies_if_changed() {
            error!("Failed to reload replies: {}", e);
        }
        bot_guard.new_session()
    };

    handle_connection(peer, ws, session, settings.max_message_size).await;
    Ok(())
}

async fn send_message<W>(tx: &mut W, msg: &ServerMessage) -> Result<(), BoxError>
    where W: Sink<Message> + Unpin, W::Error: Error + Send + Sync + 'static
{
    let json = serde_json::to_string(msg)?;
    tx.send(Message::Text(json)).await?;
    Ok(())
}

/// Drives one session: every mutation of its state is pushed back as a full `state` frame.
pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    mut session: Session,
    max_message_size: usize
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);
    info!("Assigned conversation ID {} to {}", session.id, peer);

    let (mut tx, mut rx) = websocket.split();

    let (update_tx, mut updates) = mpsc::unbounded_channel::<ServerMessage>();
    let conversation_id = session.id.clone();
    session.state.subscribe(
        Box::new(move |_, messages| {
            let _ = update_tx.send(ServerMessage::State {
                conversation_id: conversation_id.clone(),
                messages: messages.to_vec(),
            });
        })
    );

    let initial = ServerMessage::State {
        conversation_id: session.id.clone(),
        messages: session.state.messages().to_vec(),
    };
    if let Err(e) = send_message(&mut tx, &initial).await {
        error!("Error sending initial state to {}: {}", peer, e);
        return;
    }

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        };

        if message.len() > max_message_size {
            warn!(
                "Message from {} exceeds size limit ({} > {})",
                peer,
                message.len(),
                max_message_size
            );
            let error_msg = ServerMessage::Error {
                message: "Message too large".to_string(),
            };
            if send_message(&mut tx, &error_msg).await.is_err() {
                error!("Failed to send size limit error to {}", peer);
            }
            break;
        }

        match message {
            Message::Text(text) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Chat { content }) => {
                        debug!("{} submitted {} bytes", peer, content.len());
                        session.state.append_exchange(&content);
                        None
                    }
                    Ok(ClientMessage::Clear) => {
                        session.state.clear();
                        None
                    }
                    Ok(ClientMessage::Tips) =>
                        Some(ServerMessage::Tips {
                            tips: CHAT_TIPS.iter().map(|t| t.to_string()).collect(),
                        }),
                    Err(e) => {
                        error!("Failed to parse message from {}: {}", peer, e);
                        Some(ServerMessage::Error {
                            message: format!("Failed to parse message: {}", e),
                        })
                    }
                };

                let mut outgoing: Vec<ServerMessage> = Vec::new();
                while let Ok(update) = updates.try_recv() {
                    outgoing.push(update);
                }
                outgoing.extend(reply);

                let mut failed = false;
                for msg in &outgoing {
                    if let Err(e) = send_message(&mut tx, msg).await {
                        error!("Error sending message to {}: {}", peer, e);
                        failed = true;
                        break;
                    }
                }
                if failed {
                    break;
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection closed for {} (Conv ID: {})", peer, session.id);
}

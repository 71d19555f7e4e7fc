use crate::bot::ChatBot;
use crate::classifier::Intent;
use crate::cli::Args;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use axum::{
    routing::get,
    Router,
    Json,
    extract::{State, Query},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use log::{info, error};

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub text: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ClassifyResponse {
    pub intent: Intent,
    pub reply: String,
}

#[derive(Serialize, Debug)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    bot: Arc<Mutex<ChatBot>>,
}

pub fn router(bot: Arc<Mutex<ChatBot>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/classify", get(classify_handler))
        .route("/api/reload-replies", get(reload_replies_handler))
        .layer(cors)
        .with_state(AppState { bot })
}

pub async fn start_http_server(
    http_port: u16,
    bot: Arc<Mutex<ChatBot>>,
    args: Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = router(bot);

    match (args.enable_tls, &args.tls_cert_path, &args.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            tokio::spawn(async move {
                let result = axum_server::bind_rustls(addr, tls_config)
                    .serve(app.into_make_service())
                    .await;

                if let Err(e) = result {
                    error!("HTTPS server error: {}", e);
                }
            });

            info!("HTTPS server started with TLS enabled");
        }
        _ => {
            tokio::spawn(async move {
                match tokio::net::TcpListener::bind(addr).await {
                    Ok(listener) => {
                        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                            error!("HTTP server error: {}", e);
                        }
                    },
                    Err(e) => {
                        error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                    }
                }
            });

            info!("HTTP server started");
        }
    }

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn classify_handler(
    State(state): State<AppState>,
    Query(req): Query<ClassifyRequest>,
) -> Json<ClassifyResponse> {
    let text = req.text.unwrap_or_default();
    let (intent, reply) = state.bot.lock().await.classify(&text);
    Json(ClassifyResponse { intent, reply })
}

async fn reload_replies_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReloadResponse>) {
    let mut bot = match state.bot.try_lock() {
        Ok(g) => g,
        Err(_) => return (StatusCode::SERVICE_UNAVAILABLE, Json(ReloadResponse {
            success: false,
            message: "Bot busy".into(),
        })),
    };

    match bot.reload_replies_if_changed() {
        Ok(true) => (StatusCode::OK, Json(ReloadResponse {
            success: true,
            message: "Replies reloaded".into(),
        })),
        Ok(false) => (StatusCode::OK, Json(ReloadResponse {
            success: true,
            message: "Replies unchanged".into(),
        })),
        Err(e) => {
            error!("Reply reload failed: {}", e);
            (StatusCode::BAD_REQUEST, Json(ReloadResponse {
                success: false,
                message: format!("Reload error: {}", e),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::replies::{ReplyConfig, GRATITUDE_REPLY};

    fn state() -> AppState {
        AppState {
            bot: Arc::new(Mutex::new(ChatBot::with_replies(ReplyConfig::shared_default()))),
        }
    }

    #[tokio::test]
    async fn classify_returns_intent_and_reply() {
        let Json(resp) = classify_handler(
            State(state()),
            Query(ClassifyRequest { text: Some("Thank you!".into()) }),
        ).await;
        assert_eq!(resp.intent, Intent::Gratitude);
        assert_eq!(resp.reply, GRATITUDE_REPLY);
    }

    #[tokio::test]
    async fn classify_without_text_falls_back() {
        let Json(resp) = classify_handler(State(state()), Query(ClassifyRequest { text: None })).await;
        assert_eq!(resp.intent, Intent::Fallback);
    }

    #[tokio::test]
    async fn reload_reports_busy_bot() {
        let state = state();
        let _guard = state.bot.lock().await;
        let (code, Json(resp)) = reload_replies_handler(State(state.clone())).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn reload_without_file_is_unchanged() {
        let (code, Json(resp)) = reload_replies_handler(State(state())).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(resp.message, "Replies unchanged");
    }
}

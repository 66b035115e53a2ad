use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pinbot::commands::pin::PinHandler;
use pinbot::commands::Dispatcher;
use pinbot::config::Config;
use pinbot::discord::rest::{DiscordApi, HttpApi};
use pinbot::verify::Verifier;
use pinbot::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pinbot=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    if config.public_key.is_none() {
        tracing::warn!(
            "DISCORD_BOT_PUBLIC_KEY is not set, request signature verification is disabled"
        );
    }

    let api: Arc<dyn DiscordApi> = match &config.api_base_url {
        Some(base_url) => Arc::new(HttpApi::with_base_url(&config.bot_token, base_url)),
        None => Arc::new(HttpApi::new(&config.bot_token)),
    };

    let dispatcher = Dispatcher::new(api).with_message_command("Pin", Arc::new(PinHandler));

    let state = Arc::new(AppState {
        verifier: config.public_key.map(Verifier::new),
        dispatcher,
    });

    let app = pinbot::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Pinbot listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;

    Ok(())
}

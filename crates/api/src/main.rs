use std::sync::Arc;

use grantscout_core::advisory::{AdvisoryComposer, AdvisoryOptions};
use grantscout_core::grants::grants_gov::GrantsGovClient;
use grantscout_core::grants::GrantsSearch;
use grantscout_core::llm::openai::OpenAiClient;
use grantscout_core::llm::CompletionClient;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = grantscout_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let grants: Arc<dyn GrantsSearch> = Arc::new(GrantsGovClient::from_settings(&settings)?);

    let llm: Option<Arc<dyn CompletionClient>> = match settings.openai_api_key {
        Some(_) => {
            let client = OpenAiClient::from_settings(&settings)?;
            tracing::info!(model = client.model(), "completion client configured");
            Some(Arc::new(client) as Arc<dyn CompletionClient>)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY missing; /api/search-grants will return grants without suggestions");
            None
        }
    };

    let advisory = AdvisoryComposer::new(
        grants.clone(),
        llm,
        AdvisoryOptions::from_settings(&settings),
    );
    let app = routes::router(routes::AppState { grants, advisory });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &grantscout_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_api::{
    app,
    state::{AppState, AuthConfig, Collaborators},
};
use wayfare_booking::MockPaymentAdapter;
use wayfare_core::assistant::Assistant;
use wayfare_core::mailer::Mailer;
use wayfare_core::payment::PaymentAdapter;
use wayfare_core::places::{DisabledPlaces, PlacesProvider};
use wayfare_store::{
    app_config::{Config, PaymentProvider},
    llm::HttpAssistant,
    mailer::{LogMailer, SmtpMailer},
    places::GooglePlaces,
    stripe::StripePaymentAdapter,
    DbClient, Repositories,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let repos = if config.database.is_memory() {
        tracing::warn!("Running on the in-memory store; data is lost on exit");
        Repositories::in_memory()
    } else {
        let db = DbClient::new(&config.database)
            .await
            .context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        Repositories::postgres(db.pool)
    };

    let app_state = AppState::new(
        repos,
        collaborators(&config)?,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        config.insights.history_limit,
    )?;

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Pick the external adapters the configuration asks for. Optional services
/// degrade instead of failing startup.
fn collaborators(config: &Config) -> anyhow::Result<Collaborators> {
    let payments: Arc<dyn PaymentAdapter> = match (config.payments.provider, &config.payments.secret_key) {
        (PaymentProvider::Stripe, Some(key)) => {
            Arc::new(StripePaymentAdapter::new(key.clone(), config.payments.api_url.clone()))
        }
        (PaymentProvider::Stripe, None) => anyhow::bail!("payments.secret_key is required for stripe"),
        (PaymentProvider::Mock, _) => {
            tracing::warn!("Using the mock payment processor");
            Arc::new(MockPaymentAdapter::new())
        }
    };

    let api_key = config
        .llm
        .api_key
        .clone()
        .context("llm.api_key is required")?;
    let assistant: Arc<dyn Assistant> = Arc::new(HttpAssistant::new(api_key, &config.llm));

    let places: Arc<dyn PlacesProvider> = match &config.maps.api_key {
        Some(key) => Arc::new(GooglePlaces::new(key.clone())),
        None => {
            tracing::warn!("maps.api_key not set; place autocomplete is disabled");
            Arc::new(DisabledPlaces)
        }
    };

    let mailer: Arc<dyn Mailer> = match SmtpMailer::from_config(&config.mail)? {
        Some(smtp) => Arc::new(smtp),
        None => {
            tracing::warn!("mail.smtp_host not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    Ok(Collaborators {
        payments,
        assistant,
        places,
        mailer,
    })
}

use std::net::SocketAddr;
use std::sync::Arc;

use skylane_api::mailer::{self, LogMailer, Mailer, MailerDeps, SmtpMailer};
use skylane_api::{app, state::AppState, state::AuthConfig};
use skylane_core::provider::FlightProvider;
use skylane_providers::airlabs::AirLabsClient;
use skylane_providers::aviationstack::AviationStackClient;
use skylane_providers::opensky::OpenSkyClient;
use skylane_providers::{AmadeusClient, AmadeusConfig, SearchOrchestrator, StripeGateway};
use skylane_store::{BookingRepo, FlightRepo, RedisClient, UserRepo};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skylane_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skylane_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skylane API on port {}", config.server.port);

    // Postgres
    let db = skylane_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");
    let db = Arc::new(db);

    // Redis (token cache + rate limiting)
    let redis = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis = Arc::new(redis);

    let users = UserRepo::new(db.pool.clone());
    let flights = FlightRepo::new(db.pool.clone());
    let bookings = BookingRepo::new(db.pool.clone());

    // Live search provider per configuration.
    let provider: Arc<dyn FlightProvider> = match config.search.provider.as_str() {
        "aviationstack" => Arc::new(AviationStackClient::new(
            config.aviationstack.api_key.clone().unwrap_or_default(),
        )),
        "opensky" => Arc::new(OpenSkyClient::new()),
        _ => Arc::new(AmadeusClient::new(
            AmadeusConfig {
                api_key: config.amadeus.api_key.clone(),
                api_secret: config.amadeus.api_secret.clone(),
                base_url: config.amadeus.base_url.clone(),
            },
            redis.clone(),
        )),
    };
    let search = Arc::new(SearchOrchestrator::new(provider, Arc::new(flights.clone())));

    let airports = config
        .airlabs
        .api_key
        .clone()
        .map(|key| Arc::new(AirLabsClient::new(key)));

    let payments = Arc::new(StripeGateway::new(config.stripe.secret_key.clone()));

    // Background email worker.
    let mail_transport: Arc<dyn Mailer> = if config.email.enabled {
        Arc::new(
            SmtpMailer::new(
                &config.email.smtp_host,
                config.email.smtp_port,
                config.email.username.clone(),
                config.email.password.clone(),
                config.email.from_address.clone(),
            )
            .expect("Failed to build SMTP transport"),
        )
    } else {
        Arc::new(LogMailer)
    };
    let (mailer_handle, _worker) = mailer::spawn_worker(MailerDeps {
        users: users.clone(),
        flights: flights.clone(),
        bookings: bookings.clone(),
        mailer: mail_transport,
    });

    let app_state = AppState {
        db,
        redis,
        users,
        flights,
        bookings,
        search,
        airports,
        payments,
        mailer: mailer_handle,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            refresh_expiration: config.auth.refresh_expiration_seconds,
        },
        force_mock_search: config.search.use_mock_data,
        stripe_webhook_secret: config.stripe.webhook_secret.clone(),
        stripe_publishable_key: config.stripe.publishable_key.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

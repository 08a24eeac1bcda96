use std::{net::SocketAddr, process, sync::Arc};

use beancount_example::{
    NAME, VERSION,
    application::{error::AppError, generator::Generator, random::RandomRange},
    cache::DocumentCache,
    config,
    domain::settings::LedgerSettings,
    infra::{
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
    ledger::ExampleLedgerWriter,
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    info!(app = NAME, version = VERSION, "starting");

    info!("Loading settings");
    let ledger_settings = LedgerSettings::from_env()?;
    info!(settings = %ledger_settings, "Ledger settings loaded");

    let state = build_application_context(&settings, ledger_settings);

    info!("Generating random beancount data");
    state.prime().await?;

    serve_http(&settings, state).await
}

fn build_application_context(settings: &config::Settings, ledger: LedgerSettings) -> AppState {
    let rng = Arc::new(match settings.ledger.seed {
        Some(seed) => RandomRange::from_seed(seed),
        None => RandomRange::from_entropy(),
    });
    let writer = Arc::new(ExampleLedgerWriter::new().with_title(settings.ledger.title.clone()));
    let generator = Arc::new(Generator::new(writer, rng));
    let cache = Arc::new(DocumentCache::new(generator));

    AppState::new(ledger, cache)
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "Listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

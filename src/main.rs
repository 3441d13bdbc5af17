use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use roster::health::Readiness;
use roster::middleware::BearerToken;
use roster::server::shutdown_signal;
use roster::users::UserStore;
use roster::{app, logging, Config, Server};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    logging::init(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), roster::Error> {
    let store = Arc::new(UserStore::seeded());
    let readiness = Readiness::new();
    let pipeline = app::pipeline(&store, &readiness, BearerToken::new(&config.token));

    let server = Server::bind(config.addr).await?;
    readiness.set(true);
    info!(users = store.len(), "store seeded");

    // Report not-ready as soon as draining starts.
    let draining = readiness.clone();
    let shutdown = async move {
        shutdown_signal().await;
        draining.set(false);
    };

    server.serve_with_shutdown(pipeline, shutdown).await
}

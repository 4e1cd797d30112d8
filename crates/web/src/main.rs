use std::error::Error;

use database::{DatabaseConnectionInfo, PgDatabase};
use directory::client::Client;
use tracing_subscriber::EnvFilter;
use web::{config::WebConfig, session::Sessions, start_web_server, WebState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    // database
    let database_connection_info = DatabaseConnectionInfo::from_env()
        .ok_or("expected database connection info in env.")?;
    let database = PgDatabase::connect(database_connection_info).await?;

    // web server
    let config = WebConfig::from_env();
    let state = WebState::new(
        Client::new(database),
        Sessions::new(config.session.clone()),
    );
    start_web_server(config, state).await?;

    Ok(())
}

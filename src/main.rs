use anyhow::Context;

use budget_tracker_server::{
    app, config::Config, database, logging::setup_logging, state::AppState, token::TokenService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();
    setup_logging();

    let config = Config::from_env().context("invalid configuration")?;

    let db = database::init_db(&config.data_path)
        .await
        .context("failed to initialize database")?;
    let tokens = TokenService::new(&config.jwt_secret, config.token_expiry_minutes);
    let state = AppState::new(db, tokens);

    let app = app(state, &config);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

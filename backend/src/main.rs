use std::error::Error;
use std::sync::Arc;

use backend::{api, config, logger};
use intake_stream::vendors::openai::OpenAiProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    config::init();
    logger::init();

    let provider = Arc::new(OpenAiProvider::from_env()?);
    let state = api::AppState { provider };

    let bind_addr: String = config::get_env_or("INTAKE_BIND_ADDR", "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "intake backend listening");
    axum::serve(listener, api::router(state)).await?;
    Ok(())
}

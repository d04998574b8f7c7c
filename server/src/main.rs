use server::state::AppState;
use server::{ServerError, port_from_env, serve};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port = port_from_env()?;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve(listener, AppState::new()).await
}

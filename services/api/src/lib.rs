mod auth;
mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use voice_twin::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

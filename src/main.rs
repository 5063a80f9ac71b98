use std::net::Ipv4Addr;

use axum::serve;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;

use covergen::app;
use covergen::app_state::AppState;
use covergen::config::Config;
use covergen::keepalive;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();
    let config = Config::from_env();
    let port = config.port;
    if let Some(url) = config.keep_alive_url.clone() {
        keepalive::spawn(url, config.keep_alive_interval_secs);
    }
    let state = AppState::init(config);
    let app = app(state);
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .unwrap();
    info!("Listening on port {}", port);
    serve(listener, app.into_make_service()).await.unwrap();
}

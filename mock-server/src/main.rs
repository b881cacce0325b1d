use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let username =
        std::env::var("GEOSERVER_USERNAME").unwrap_or_else(|_| mock_geoserver::DEFAULT_USERNAME.to_string());
    let password =
        std::env::var("GEOSERVER_PASSWORD").unwrap_or_else(|_| mock_geoserver::DEFAULT_PASSWORD.to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock GeoServer listening");
    mock_geoserver::serve(listener, mock_geoserver::app_with_credentials(&username, &password)).await
}

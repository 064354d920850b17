use myfit_store::{transport, Collections, ModelRegistry};
use std::path::Path;
use tokio::task::JoinHandle;

/// Starts the router on an ephemeral port over `data_dir`.
pub async fn start_server(data_dir: &Path) -> (String, JoinHandle<()>) {
    let collections = Collections::open(data_dir, &ModelRegistry::with_defaults()).unwrap();
    let router = transport::http::create_router(transport::http::AppState::new(collections));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), server)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap()
}

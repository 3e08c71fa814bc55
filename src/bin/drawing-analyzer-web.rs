use argh::FromArgs;
use drawing_infernum::{
    BackendConfig,
    web::{self, AppState},
};
use std::path::PathBuf;

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(FromArgs)]
/// Web UI for analyzing engineering drawings with a local vision model.
struct WebArgs {
    /// the host to run the server on
    #[argh(option, default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// directory where uploads are staged during analysis
    #[argh(option, default = "PathBuf::from(DEFAULT_UPLOAD_DIR)")]
    upload_dir: PathBuf,

    /// base URL of the Ollama server (default: $OLLAMA_BASE_URL or http://localhost:11434)
    #[argh(option)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: WebArgs = argh::from_env();

    let mut backend = BackendConfig::from_env();
    if let Some(base_url) = args.base_url {
        backend = backend.with_base_url(base_url);
    }

    std::fs::create_dir_all(&args.upload_dir)?;

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    log::info!("🚀 Starting the drawing analyzer");
    log::info!("🔥 Listening on: http://{}", addr);
    log::info!("🧠 Ollama backend: {}", backend.base_url);
    log::info!("🔧 Press Ctrl+C to stop the server");

    let app = web::router(AppState::new(backend, args.upload_dir));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

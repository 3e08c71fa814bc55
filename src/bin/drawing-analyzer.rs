use argh::FromArgs;
use drawing_infernum::{BackendConfig, cli};
use std::{io, path::PathBuf, process::ExitCode};

#[derive(FromArgs)]
/// Analyze engineering drawings using an open-source vision model served by Ollama.
/// Run without arguments for interactive mode.
struct AnalyzerArgs {
    /// path(s) to engineering drawing image(s)
    #[argh(positional)]
    images: Vec<PathBuf>,

    /// question or instruction about the drawing(s)
    #[argh(option, short = 'p')]
    prompt: String,

    /// vision model to use (default: llava). Options: llava, bakllava, moondream
    #[argh(option, short = 'm')]
    model: Option<String>,

    /// base URL of the Ollama server (default: $OLLAMA_BASE_URL or http://localhost:11434)
    #[argh(option)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let config = BackendConfig::from_env();

    if std::env::args_os().len() <= 1 {
        let stdin = io::stdin();
        return match cli::interactive(&config, stdin.lock(), &mut io::stdout()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error initializing analyzer: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let args: AnalyzerArgs = argh::from_env();

    let mut config = config;
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }
    let model = args.model.unwrap_or_else(|| config.model.clone());

    match cli::analyze_once(&config, &args.images, &args.prompt, &model, &mut io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("Analysis failed: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

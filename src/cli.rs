use crate::{
    client::InferenceClient, config::BackendConfig, error::AnalyzerError,
    request::AnalysisRequest,
};
use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

const BANNER_WIDTH: usize = 80;

const QUIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

/// Frames a one-shot result between `=` banners.
pub fn format_result(text: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\nANALYSIS RESULT\n{rule}\n{text}\n{rule}")
}

/// Frames an interactive answer between `-` rules.
pub fn format_answer(text: &str) -> String {
    let rule = "-".repeat(BANNER_WIDTH);
    format!("{rule}\n{text}\n{rule}")
}

/// Splits the interactive path line on commas.
pub fn parse_path_list(line: &str) -> Vec<PathBuf> {
    line.split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn is_quit(input: &str) -> bool {
    QUIT_COMMANDS.contains(&input.to_lowercase().as_str())
}

/// Runs one analysis over `images` and prints the framed result.
///
/// Input is validated and every image encoded before the backend is contacted.
pub async fn analyze_once<P: AsRef<Path>, W: Write>(
    config: &BackendConfig,
    images: &[P],
    prompt: &str,
    model: &str,
    out: &mut W,
) -> Result<(), AnalyzerError> {
    let request = AnalysisRequest::from_paths(model, prompt, images)?;

    writeln!(out, "Initializing Drawing Analyzer...")?;
    let client = InferenceClient::connect(config.clone()).await?;

    writeln!(out, "\nAnalyzing {} drawing(s)...\n", request.image_count())?;
    let response = client.analyze(&request).await?;

    writeln!(out, "{}", format_result(&response.text))?;
    Ok(())
}

/// Reads image paths once, then answers prompts until a quit command or the
/// end of input.
///
/// Only failing to reach the backend ends the session early; errors for a
/// single question are printed and the loop continues.
pub async fn interactive<R: BufRead, W: Write>(
    config: &BackendConfig,
    mut input: R,
    out: &mut W,
) -> Result<(), AnalyzerError> {
    writeln!(out, "Engineering Drawing Analyzer - Interactive Mode")?;
    writeln!(out, "{}", "=".repeat(BANNER_WIDTH))?;
    write!(
        out,
        "Enter path(s) to drawing image(s) (comma-separated for multiple): "
    )?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let paths = parse_path_list(&line);

    let client = InferenceClient::connect(config.clone()).await?;

    writeln!(out, "\nLoaded {} drawing(s)", paths.len())?;
    writeln!(out, "\nEnter your questions (type 'quit' or 'exit' to stop):\n")?;

    loop {
        write!(out, "Your question: ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let prompt = line.trim();
        if is_quit(prompt) {
            writeln!(out, "Exiting...")?;
            break;
        }
        if prompt.is_empty() {
            continue;
        }

        writeln!(out, "\nAnalyzing...\n")?;

        let answer = match AnalysisRequest::from_paths(&config.model, prompt, &paths) {
            Ok(request) => client.analyze(&request).await,
            Err(e) => Err(e),
        };

        match answer {
            Ok(response) => writeln!(out, "{}\n", format_answer(&response.text))?,
            Err(e) => {
                log::debug!("Question failed: {e}");
                writeln!(out, "Error: {e}\n")?
            }
        }
    }

    Ok(())
}

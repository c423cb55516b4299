use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lyra::controller::{build_input, validate_input, SessionController, SessionStatus, SubmitError};
use lyra::render::{render_json, render_text, THINKING_MESSAGE};
use lyra::settings::{config_path, load_settings_or_default, save_settings};
use providers::{GeminiClient, LyraOptimizer};
use shared::attachment::AttachmentKind;
use shared::output::parse_output;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lyra", version, about = "Lyra - multimodal prompt optimizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Optimize a raw request, optionally with image, document and audio input.
    Optimize(OptimizeArgs),
    /// Inspect or create the settings file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
struct OptimizeArgs {
    /// Raw request text; `-` reads it from stdin.
    text: Option<String>,
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long)]
    document: Option<PathBuf>,
    #[arg(long)]
    audio: Option<PathBuf>,
    /// Override the Gemini model from settings.
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    /// Print the model's text as-is.
    #[arg(long, conflicts_with = "json")]
    raw: bool,
    #[arg(long)]
    json: bool,
    /// Copy the optimized prompt to the clipboard.
    #[arg(long)]
    copy: bool,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Path,
    Show,
    Init,
}

#[tokio::main]
async fn main() {
    init_tracing();
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("lyra error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Optimize(args) => run_optimize(args).await,
        Command::Config(cmd) => {
            run_config(cmd)?;
            Ok(0)
        }
    }
}

async fn run_optimize(args: OptimizeArgs) -> Result<i32> {
    let text = match args.text.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
        Some(text) => text.to_string(),
        None => String::new(),
    };
    let input = build_input(
        text,
        [
            (AttachmentKind::Image, args.image.clone()),
            (AttachmentKind::Document, args.document.clone()),
            (AttachmentKind::Audio, args.audio.clone()),
        ],
    )?;

    // Empty input never needs credentials.
    if let Some(rejected) = validate_input(&input) {
        print_status(&args, &rejected)?;
        return Ok(1);
    }

    let mut settings = load_settings_or_default();
    if let Some(model) = &args.model {
        settings.model.gemini_model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        settings.model.temperature = temperature;
    }

    let client = GeminiClient::from_settings(&settings.model)?;
    let optimizer =
        LyraOptimizer::new(Arc::new(client)).with_temperature(settings.model.temperature);
    let controller = SessionController::with_input(optimizer, input);

    if !args.json {
        eprintln!("{}", THINKING_MESSAGE);
    }
    let status = match controller.submit().await {
        Ok(status) => status,
        Err(SubmitError::EmptyInput) => controller.status(),
        Err(e) => bail!(e),
    };

    print_status(&args, &status)?;
    if args.copy {
        if let Some(parsed) = status.raw_output().and_then(parse_output) {
            copy_to_clipboard(&parsed.prompt);
        }
    }

    Ok(if status.raw_output().is_some() { 0 } else { 1 })
}

fn print_status(args: &OptimizeArgs, status: &SessionStatus) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&render_json(status))?);
    } else if args.raw {
        match status {
            SessionStatus::Success(raw) => println!("{}", raw),
            other => println!("{}", render_text(other)),
        }
    } else {
        println!("{}", render_text(status));
        if status.raw_output().map(parse_output).is_some_and(|p| p.is_none()) {
            tracing::warn!("response did not follow the expected format; rerun with --raw to see it");
        }
    }
    Ok(())
}

fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(text.to_string())) {
        Ok(()) => eprintln!("Copied!"),
        Err(e) => tracing::warn!("could not copy to clipboard: {}", e),
    }
}

fn run_config(cmd: ConfigCommand) -> Result<()> {
    let path = config_path().context("no config directory available on this platform")?;
    match cmd {
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Show => {
            let settings = load_settings_or_default();
            println!("{}", serde_json::to_string_pretty(&settings.redacted())?);
        }
        ConfigCommand::Init => {
            if path.exists() {
                println!("Settings already exist at {}", path.display());
            } else {
                save_settings(&path, &Default::default())?;
                println!("Wrote default settings to {}", path.display());
            }
        }
    }
    Ok(())
}

use clap::Parser;
use colored::*;
use rhorde::{
    logger::{self, LoggerConfig},
    pick_example_prompt, AspectRatio, GenerationForm, HordeClient, HordeConfig, JobPhase,
    Orchestrator, RenderedImage, SlotSink, SlotState,
};
use std::path::PathBuf;

/// Generate images on the Stable Horde from the command line.
#[derive(Parser, Debug)]
#[command(name = "rhorde")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// What to draw
    prompt: Option<String>,

    /// Horde model name
    #[arg(short, long, default_value = "stable_diffusion")]
    model: String,

    /// Number of images, generated one after another
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Aspect ratio: 1/1, 16/9 or 9/16
    #[arg(short, long, default_value_t = AspectRatio::Square)]
    ratio: AspectRatio,

    /// Horde API key (anonymous when absent)
    #[arg(long, env = "HORDE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory the finished images are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Pick one of the example prompts when no prompt is given
    #[arg(long)]
    surprise: bool,

    /// Send the built-in negative prompt
    #[arg(long)]
    negative: bool,

    /// List the image models that currently have workers, then exit
    #[arg(long)]
    list_models: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Also append log lines to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Prints one status line per slot change.
struct CliSink;

impl SlotSink for CliSink {
    fn slot_created(&self, index: usize) {
        println!("{} {}", format!("[{}]", index + 1).bright_black(), "queued".dimmed());
    }

    fn slot_progress(&self, index: usize, phase: JobPhase) {
        let label = match phase {
            JobPhase::SubmittingCheap => phase.to_string().yellow(),
            _ => phase.to_string().normal(),
        };
        println!("{} {}", format!("[{}]", index + 1).bright_black(), label);
    }

    fn slot_ready(&self, index: usize, _image: &RenderedImage) {
        println!("{} {}", format!("[{}]", index + 1).bright_black(), "done".green());
    }

    fn slot_failed(&self, index: usize, message: &str) {
        println!("{} {}", format!("[{}]", index + 1).bright_black(), message.red());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let args = Args::parse();

    let mut logger_config = if args.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default().with_level(logger::LogLevel::Warn)
    };
    if let Some(path) = &args.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }

    let mut config = HordeConfig::from_env();
    if let Some(key) = &args.api_key {
        config = config.with_api_key(key.clone());
    }
    if args.negative {
        config = config.with_default_negative_prompt();
    }
    logger::log_config_info(&config);

    let client = HordeClient::new(config.clone())?;

    if args.list_models {
        for model in client.list_models().await? {
            println!(
                "{:<48} {:>3} workers  {:>5} queued  eta {}s",
                model.name, model.count, model.queued, model.eta
            );
        }
        return Ok(());
    }

    let prompt = match args.prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ if args.surprise => {
            let prompt = pick_example_prompt(&mut rand::rng()).to_string();
            println!("{} {}", "Prompt:".bold(), prompt);
            prompt
        }
        _ => return Err("a prompt is required (or pass --surprise)".into()),
    };

    let form = GenerationForm {
        prompt,
        model: args.model,
        count: args.count,
        aspect_ratio: args.ratio,
    };

    let orchestrator = Orchestrator::new(client.clone(), config);
    let slots = orchestrator.run(&form, &CliSink).await?;

    let mut saved = 0;
    for slot in &slots {
        match &slot.state {
            SlotState::Ready(image) => match image.save(&args.output_dir, client.http()).await {
                Ok(path) => {
                    saved += 1;
                    println!("{} {}", "Saved".green().bold(), path.display());
                }
                Err(e) => log::error!("❌ Failed to save image {}: {}", slot.index + 1, e),
            },
            SlotState::Failed(_) | SlotState::Loading => {}
        }
    }

    println!("{} of {} image(s) saved", saved, slots.len());
    Ok(())
}

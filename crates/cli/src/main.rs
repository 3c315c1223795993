use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_agents::{AssistantConfig, LiveAgent};
use relay_core::classify;
use relay_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "relay")]
#[command(about = "Route spoken-style commands to notes and calendar")]
struct Cli {
    /// Optional dotenv file loaded before reading configuration.
    #[arg(long, env = "RELAY_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Disable spoken feedback regardless of VOICE_FEEDBACK_ENABLED.
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive prompt; one command per line.
    Chat,
    /// Print how a command would be classified, without running it.
    Classify { text: Vec<String> },
    /// Run a single command.
    Run { text: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.env_file.exists() {
        dotenv::from_path(&cli.env_file)
            .with_context(|| format!("failed loading {}", cli.env_file.display()))?;
    }
    init_tracing("relay_cli");

    let config = AssistantConfig::from_env();
    config.write_google_secrets().await?;

    match cli.command {
        Command::Classify { text } => {
            let result = classify(&text.join(" "));
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Run { text } => {
            let agent = build_agent(&config, cli.quiet)?;
            let reply = agent.handle_text(&text.join(" ")).await;
            println!("{}", reply.reply_text());
        }
        Command::Chat => {
            let agent = build_agent(&config, cli.quiet)?;
            run_chat(&config, agent).await?;
        }
    }

    Ok(())
}

fn build_agent(config: &AssistantConfig, quiet: bool) -> Result<LiveAgent> {
    let agent = LiveAgent::from_config(config, AppMetrics::shared())?;
    Ok(if quiet { agent.without_speaker() } else { agent })
}

async fn run_chat(config: &AssistantConfig, agent: LiveAgent) -> Result<()> {
    println!("{} - type a command. 'exit' to quit.", config.app_name);

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            println!("\nGoodbye.");
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            println!("Goodbye.");
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent.handle_text(message).await;
        println!("{}", reply.reply_text());
    }

    Ok(())
}

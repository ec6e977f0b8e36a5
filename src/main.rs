use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jivan::{Backend, CompletionClient, Domain, PromptComposer, RetryPolicy};

mod chat;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Completion backend to talk to.
    #[arg(long, global = true, env = "JIVAN_BACKEND", value_enum, default_value_t = Backend::Gemini)]
    backend: Backend,

    /// API key for the selected backend (defaults to GEMINI_API_KEY or OPENROUTER_API_KEY).
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model name; each backend has its own default.
    #[arg(long, global = true, env = "JIVAN_MODEL")]
    model: Option<String>,

    /// Override the backend base URL.
    #[arg(long, global = true, env = "JIVAN_API_BASE")]
    api_base: Option<String>,

    /// Directory with <domain>.txt prompt templates overriding the built-in ones.
    #[arg(long, global = true, env = "JIVAN_TEMPLATE_DIR")]
    template_dir: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "JIVAN_TIMEOUT_SECS", default_value_t = jivan::constants::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Retries for rate-limited (429) or unavailable (503) responses.
    #[arg(long, global = true, env = "JIVAN_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start an interactive conversation.
    Chat {
        #[arg(long, help = "Tradition to start in; asks when omitted.")]
        domain: Option<String>,
    },
    /// Ask a single question and print the reply.
    Ask {
        #[arg(long, default_value = "hindu")]
        domain: String,
        question: String,
    },
    /// Print the prompt that would be sent for a question.
    Prompt {
        #[arg(long, default_value = "hindu")]
        domain: String,
        question: String,
    },
    /// List the available traditions.
    Domains,
}

impl Cli {
    fn composer(&self) -> Result<Arc<PromptComposer>> {
        let composer = match &self.template_dir {
            Some(dir) => PromptComposer::from_dir(dir).context("Failed to load prompt templates")?,
            None => PromptComposer::builtin(),
        };
        Ok(Arc::new(composer))
    }

    fn client(&self) -> Result<Arc<dyn CompletionClient>> {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var(self.backend.api_key_env()).ok())
            .unwrap_or_default();

        let mut config = self
            .backend
            .config(api_key)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(RetryPolicy::with_retries(self.max_retries));
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(base) = &self.api_base {
            config = config.with_base_url(base);
        }

        info!(backend = ?self.backend, model = %config.model, "Configured completion client");
        self.backend
            .connect(config)
            .context("Failed to initialize completion client")
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    // Reads log level from RUST_LOG (e.g., RUST_LOG=info,jivan=debug)
    let filter = |default: &str| EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter("info"))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter("warn"))
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    info!("Jivan starting with command: {:?}", cli.command);

    match &cli.command {
        Commands::Chat { domain } => {
            let composer = cli.composer()?;
            let client = cli.client()?;
            let domain = domain.as_deref().map(Domain::from_selector);
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut interrupts = chat::spawn_interrupt_listener();
            chat::run_chat(input, &mut std::io::stdout(), composer, client, domain, &mut interrupts)
                .await
                .context("Chat session failed")?;
            info!("Chat session finished.");
        }
        Commands::Ask { domain, question } => {
            let composer = cli.composer()?;
            let client = cli.client()?;
            let domain = Domain::from_selector(domain);
            let mut session = jivan::ChatSession::new(domain, composer, client);
            match session.send(question).await {
                Ok(Some(reply)) => println!("{}", reply.text),
                Ok(None) => anyhow::bail!("Reply was discarded"),
                Err(e) => anyhow::bail!("Cannot send question: {}", e),
            }
        }
        Commands::Prompt { domain, question } => {
            let composer = cli.composer()?;
            println!("{}", composer.compose_selector(domain, question));
        }
        Commands::Domains => {
            for domain in Domain::ALL {
                let profile = domain.profile();
                println!("{:<10} {} ({})", domain.id(), profile.native_name, profile.tagline);
            }
        }
    }

    Ok(())
}

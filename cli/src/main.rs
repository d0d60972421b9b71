//! kaiwa - Japanese Conversation Tutor in the Terminal
//!
//! Chat with a language model tutor. Replies appear a character at a time
//! and are printed with readings after kanji words.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (OpenAI, key from /key or OPENAI_API_KEY)
//! kaiwa
//!
//! # Local model through Ollama
//! kaiwa --provider ollama --model llama3
//!
//! # Readings from a custom dictionary file instead of IPADIC
//! kaiwa --dictionary ~/.local/share/kaiwa/dictionary.tsv
//!
//! # Verbose logging
//! RUST_LOG=debug kaiwa
//! ```

mod commands;
mod display;
mod vocabulary;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use kaiwa_core::config::{self, ConfigError, ConfigOverrides, KaiwaConfig, ProviderKind};
use kaiwa_core::store::{self, keys, FileStore};
use kaiwa_core::{
    build_backend, BackendConfig, ChatBackend, IpadicTokenizer, LexiconTokenizer, Role,
    Tokenizer, TokenizerHandle, Tutor, TutorConfig, TutorMessage,
};

use commands::Command;
use vocabulary::VocabularyFetch;

/// kaiwa - practice Japanese conversation with furigana
#[derive(Parser, Debug)]
#[command(name = "kaiwa")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "KAIWA_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Chat provider (openai, ollama)
    #[arg(short = 'p', long)]
    provider: Option<ProviderKind>,

    /// Chat model
    #[arg(short = 'm', long)]
    model: Option<String>,

    /// OpenAI API key (saved keys are used otherwise)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Tab-separated reading dictionary replacing the bundled IPADIC
    #[arg(short = 'd', long, value_name = "FILE")]
    dictionary: Option<PathBuf>,

    /// Storage file
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Milliseconds between revealed characters
    #[arg(long, value_name = "MS")]
    reveal_interval_ms: Option<u64>,

    /// Do not fetch vocabulary progress
    #[arg(long)]
    no_vocabulary: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "KAIWA_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider,
            model: self.model.clone(),
            dictionary_path: self.dictionary.clone(),
            store_path: self.store.clone(),
            reveal_interval_ms: self.reveal_interval_ms,
            no_vocabulary: self.no_vocabulary,
        }
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so the conversation on stdout stays readable.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("kaiwa_cli={level},kaiwa_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(args: &Args) -> Result<KaiwaConfig> {
    let path = args.config.clone().or_else(config::default_config_path);
    let mut config = config::load_config_from_path(path)?;
    args.overrides().apply(&mut config);
    config.validate()?;

    info!(
        source = %config.source(),
        provider = %config.provider,
        model = config.effective_model(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Backend for the configured provider
///
/// Without an OpenAI key the backend is still built; requests fail until a
/// key is set with `/key`.
fn make_backend(config: &KaiwaConfig, api_key: Option<&str>) -> Result<Arc<dyn ChatBackend>> {
    let backend_config = match config.backend_config(api_key) {
        Ok(backend_config) => backend_config,
        Err(ConfigError::MissingApiKey(provider)) => {
            warn!(provider = %provider, "No API key, set one with /key");
            BackendConfig::openai("", config.effective_model())
        }
        Err(e) => return Err(e.into()),
    };
    build_backend(&backend_config)
}

/// Tokenizer for furigana, loaded in the background
///
/// A configured dictionary file replaces the embedded IPADIC tokenizer.
fn start_tokenizer(config: &KaiwaConfig) -> TokenizerHandle {
    let handle = TokenizerHandle::new();
    match config.dictionary_path.clone() {
        Some(path) => {
            info!(path = %path.display(), "Loading dictionary");
            handle.load_in_background(async move {
                LexiconTokenizer::load(path)
                    .await
                    .map(|t| Arc::new(t) as Arc<dyn Tokenizer>)
            });
        }
        None => {
            info!("Loading embedded IPADIC dictionary");
            handle.load_in_background(async {
                IpadicTokenizer::load()
                    .await
                    .map(|t| Arc::new(t) as Arc<dyn Tokenizer>)
            });
        }
    }
    handle
}

/// Print what the tutor sent since the last call
fn drain_events(tutor: &Tutor, rx: &mut mpsc::Receiver<TutorMessage>) {
    let mut stdout = std::io::stdout().lock();
    while let Ok(msg) = rx.try_recv() {
        match &msg {
            TutorMessage::MessageAppended {
                role: Role::Assistant,
                ..
            } => {
                let _ = write!(stdout, "先生> ");
            }
            TutorMessage::Revealed { text, .. } => {
                let _ = write!(stdout, "{text}");
            }
            TutorMessage::RevealFinished { index } => {
                let _ = writeln!(stdout);
                if let Some(rendered) = tutor.render(*index) {
                    if display::has_annotations(&rendered.blocks) {
                        let _ = writeln!(stdout, "{}", display::message_to_text(&rendered));
                    }
                }
            }
            TutorMessage::Composing { active: true } => {
                let _ = writeln!(stdout, "...");
            }
            other => {
                if let Some(line) = display::status_line(other) {
                    let _ = writeln!(stdout, "{line}");
                }
            }
        }
    }
    let _ = stdout.flush();
}

/// Handle one input line; returns false to quit
async fn handle_line(
    tutor: &mut Tutor,
    config: &KaiwaConfig,
    vocabulary: &mut VocabularyFetch,
    line: &str,
) -> bool {
    match commands::parse(line) {
        Command::Say(text) => {
            if let Err(e) = tutor.submit(&text).await {
                println!("{e}");
            }
        }
        Command::Skip => {
            tutor.finish_reveal().await;
        }
        Command::Help => println!("{}", commands::HELP),
        Command::Clear => tutor.clear_history().await,
        Command::Quit => return false,
        Command::Bio(text) => {
            tutor.set_biography(&text).await;
            println!("Biography {}", if text.is_empty() { "cleared" } else { "saved" });
        }
        Command::Expression { name, link } => {
            tutor.set_expression(&name, &link).await;
            println!("[{name}: {link}]");
        }
        Command::Expressions => {
            for (name, link) in tutor.catalogue().iter() {
                if link.is_empty() {
                    println!("  {name}");
                } else {
                    println!("  {name}: {link}");
                }
            }
        }
        Command::Prompt => println!("{}", tutor.system_prompt()),
        Command::Key(key) => {
            tutor.set_secret(keys::API_KEY, &key).await;
            println!("API key saved");
            if config.provider == ProviderKind::OpenAi {
                match make_backend(config, Some(&key)) {
                    Ok(backend) => tutor.set_backend(backend).await,
                    Err(e) => println!("Could not use the new key: {e:#}"),
                }
            }
        }
        Command::WaniKani(key) => {
            tutor.set_secret(keys::WANIKANI_API_KEY, &key).await;
            println!("Fetching WaniKani progress...");
            *vocabulary = VocabularyFetch::wanikani(key);
        }
        Command::Unknown(text) => println!("Unknown command: {text} (try /help)"),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("kaiwa starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = load_settings(&args)?;

    let file_store = FileStore::open(&config.store_path)
        .with_context(|| format!("Failed to open store {}", config.store_path.display()))?;
    let api_key = args
        .api_key
        .clone()
        .or_else(|| store::load_secret(&file_store, keys::API_KEY));
    let wanikani_key = store::load_secret(&file_store, keys::WANIKANI_API_KEY);

    let backend = make_backend(&config, api_key.as_deref())?;
    let tokenizer = start_tokenizer(&config);

    let (tx, mut rx) = mpsc::channel(256);
    let tutor_config = TutorConfig {
        base_prompt: config.base_prompt.clone(),
        limits: config.input_limits(),
        ..TutorConfig::default()
    };
    let mut tutor = Tutor::new(backend, Box::new(file_store), tokenizer, tutor_config, tx);

    let mut vocabulary = match wanikani_key {
        Some(key) if config.vocabulary_enabled => VocabularyFetch::wanikani(key),
        _ => VocabularyFetch::idle(),
    };

    tutor.start().await;
    for rendered in tutor.render_all() {
        println!("{}", display::message_to_text(&rendered));
    }
    println!("Type a message, or /help for commands.");
    drain_events(&tutor, &mut rx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(config.reveal_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read input")? {
                    Some(line) => {
                        if !handle_line(&mut tutor, &config, &mut vocabulary, &line).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = ticker.tick() => {
                tutor.poll_completion().await;
                tutor.tick().await;
            }
            Some(snapshot) = vocabulary.rx.recv(), if vocabulary.pending => {
                vocabulary.pending = false;
                tutor.set_vocabulary(snapshot).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
        drain_events(&tutor, &mut rx);
    }

    tutor.shutdown().await;
    drain_events(&tutor, &mut rx);
    info!("kaiwa stopped");
    Ok(())
}

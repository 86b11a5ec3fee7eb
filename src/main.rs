// src/main.rs
// squad-goals: chat with an assistant that keeps track of your goals

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use squad_goals::config::{self, AppConfig, ConfigOverrides, FileConfig, StorageBackend};
use squad_goals::llm::OpenAiCompatClient;
use squad_goals::repl::Repl;
use squad_goals::{CsvTable, GoalSession, GoalStore, SheetsTable};

#[derive(Parser)]
#[command(name = "squad-goals")]
#[command(version, about = "Conversational goal tracker")]
struct Args {
    /// Storage backend: flat_file or remote_table
    #[arg(long, env = "STORAGE_BACKEND")]
    storage_backend: Option<String>,

    /// Goal file for the flat_file backend
    #[arg(long, env = "GOALS_CSV_PATH")]
    goals_csv_path: Option<String>,

    /// Service-account key for the remote_table backend
    #[arg(long, env = "GOOGLE_SHEETS_CREDENTIALS")]
    google_sheets_credentials: Option<String>,

    /// Spreadsheet name for the remote_table backend
    #[arg(long, env = "GOOGLE_SHEETS_NAME")]
    google_sheets_name: Option<String>,

    /// Chat model (e.g. gpt-4, ollama/llama3)
    #[arg(long, env = "LITE_LLM_MODEL_NAME")]
    model: Option<String>,

    /// API key for the chat endpoint
    #[arg(long, env = "LITE_LLM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI API key, used when no other key is set
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "LITE_LLM_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Log filter (RUST_LOG takes precedence)
    #[arg(long, env = "SQUAD_GOALS_LOG")]
    log_level: Option<String>,

    /// Skip the startup "Pong" check against the model
    #[arg(long)]
    skip_connection_test: bool,
}

impl From<&Args> for ConfigOverrides {
    fn from(args: &Args) -> Self {
        Self {
            storage_backend: args.storage_backend.clone(),
            goals_csv_path: args.goals_csv_path.clone(),
            google_sheets_credentials: args.google_sheets_credentials.clone(),
            google_sheets_name: args.google_sheets_name.clone(),
            model: args.model.clone(),
            api_key: args.api_key.clone(),
            openai_api_key: args.openai_api_key.clone(),
            api_base_url: args.api_base_url.clone(),
            log_level: args.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from ~/.squad-goals/.env or current dir)
    let env_path = Some(config::env_path()).filter(|p| p.exists());
    if let Some(path) = env_path {
        let _ = dotenvy::from_path(&path);
    } else {
        let _ = dotenvy::dotenv();
    }

    let args = Args::parse();

    // CLI args > env vars (handled by clap) > config file > defaults
    let config = AppConfig::resolve(ConfigOverrides::from(&args), FileConfig::load())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = match config.backend {
        StorageBackend::FlatFile => {
            let table = CsvTable::open(&config.csv_path)
                .await
                .with_context(|| format!("cannot open goal file {}", config.csv_path.display()))?;
            info!(path = %table.path().display(), "Using flat-file storage");
            GoalStore::new(table)
        }
        StorageBackend::RemoteTable => {
            info!(sheet = %config.sheet_name, "Using Google Sheets storage");
            GoalStore::new(SheetsTable::new(
                config.credentials_path.clone(),
                config.sheet_name.clone(),
            ))
        }
    };

    let client = OpenAiCompatClient::new(
        config.model.base_url.clone(),
        config.model.api_key.clone(),
        config.model.wire_name(),
    );
    if !args.skip_connection_test {
        client
            .connection_test()
            .await
            .with_context(|| format!("model connection test failed for {}", config.model.name))?;
    }

    let session = GoalSession::start(Arc::new(client), store).await;
    let mut repl = Repl::new(session, config::history_path())?;
    repl.run().await
}

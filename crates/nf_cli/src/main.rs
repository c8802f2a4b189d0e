use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nf_core::SummarizeRequest;
use nf_extract::HtmlExtractor;
use nf_inference::{create_model, ModelKind, Summarizer};
use nf_storage::{create_storage, MemoryStorage, Storage, StorageConfig, StorageKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "sqlite")]
const DEFAULT_STORAGE: &str = "sqlite";
#[cfg(not(feature = "sqlite"))]
const DEFAULT_STORAGE: &str = "memory";

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize news articles with a generative model", long_about = None)]
pub struct Cli {
    #[arg(long, env = "NEWSFLASH_STORAGE", default_value = DEFAULT_STORAGE)]
    storage: String,
    #[arg(long, env = "NEWSFLASH_DB", default_value = "newsflash.db")]
    database_path: String,
    #[arg(
        long,
        env = "NEWSFLASH_MODEL",
        default_value = "gemini",
        help = "Model to use for inference. Available models: gemini (default), openai, dummy"
    )]
    model: String,
    /// Provider model id, e.g. gemini-1.5-flash or deepseek-chat
    #[arg(long, env = "NEWSFLASH_MODEL_NAME")]
    model_name: Option<String>,
    #[arg(long, env = "NEWSFLASH_MODEL_URL")]
    model_url: Option<String>,
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Seconds to wait for the model before giving up
    #[arg(long, env = "NEWSFLASH_MODEL_TIMEOUT", default_value_t = 60)]
    model_timeout: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "NEWSFLASH_BIND", default_value = "0.0.0.0:3000")]
        bind: String,
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: Option<String>,
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        google_client_id: Option<String>,
        #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
        news_api_key: Option<String>,
        /// Also accept anonymous callers on /public/ai/summarize
        #[arg(long, env = "NEWSFLASH_PUBLIC_SUMMARIZE")]
        public_summarize: bool,
        /// Include error details in API error responses
        #[arg(long, env = "NEWSFLASH_ERROR_DETAILS")]
        expose_error_details: bool,
    },
    /// Summarize one text or page and print the result as JSON
    Summarize {
        #[arg(long, conflicts_with = "url")]
        content: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
}

impl Cli {
    fn model_config(&self) -> nf_inference::Config {
        nf_inference::Config {
            api_key: self.api_key.clone(),
            model_name: self.model_name.clone(),
            model_url: self.model_url.clone(),
            timeout: Duration::from_secs(self.model_timeout),
        }
    }

    fn storage_config(&self) -> Result<StorageConfig> {
        let kind: StorageKind = self.storage.parse()?;
        Ok(StorageConfig {
            kind,
            path: self.database_path.clone().into(),
        })
    }

    fn summarizer(&self, storage: &Storage) -> Result<Summarizer> {
        let kind: ModelKind = self.model.parse()?;
        let model = create_model(kind, &self.model_config())?;
        let extractor = Arc::new(HtmlExtractor::new()?);
        Ok(Summarizer::new(storage.articles.clone(), extractor, model))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            bind,
            jwt_secret,
            google_client_id,
            news_api_key,
            public_summarize,
            expose_error_details,
        } => {
            let Some(jwt_secret) = jwt_secret.clone().filter(|s| !s.is_empty()) else {
                bail!("JWT_SECRET (or --jwt-secret) is required to serve the API");
            };

            let storage = create_storage(&cli.storage_config()?).await?;
            info!("✨ Storage initialized successfully (using {})", cli.storage);
            let summarizer = cli.summarizer(&storage)?;

            let config = nf_web::Config {
                jwt_secret,
                google_client_id: google_client_id.clone(),
                news_api_key: news_api_key.clone(),
                public_summarize: *public_summarize,
                expose_error_details: *expose_error_details,
            };
            info!(?config, "Starting API");
            let state = nf_web::AppState::new(config, storage, summarizer)?;

            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("binding {}", bind))?;
            info!("🌐 Listening on http://{}", listener.local_addr()?);
            nf_web::serve(listener, state).await?;
        }
        Commands::Summarize { content, url } => {
            if content.is_none() && url.is_none() {
                bail!("pass --content or --url");
            }
            let storage = Storage::from_backend(MemoryStorage::new());
            let summarizer = cli.summarizer(&storage)?;
            let request = SummarizeRequest {
                content: content.clone(),
                url: url.clone(),
                persist: false,
                ..Default::default()
            };
            let response = summarizer.summarize(&request, None).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

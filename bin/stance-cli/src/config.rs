use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use stance_core::cache::CacheConfig;
use stance_core::database::DatabaseConfig;
use stance_core::embedder::OpenAiEmbedderConfig;
use stance_core::llm_client::LlmConfig;
use stance_core::StanceStrategy;
use validator::Validate;

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "stance",
    about = "Political stance detection pipeline: filter, translate, summarize, classify, ingest"
)]
pub struct Args {
    #[clap(long, global = true, help = "Model name for LLM operations")]
    pub model: Option<String>,

    #[clap(long, global = true, help = "Base URL of the OpenAI-compatible endpoint")]
    pub base_url: Option<String>,

    #[clap(long, global = true, help = "Sampling temperature for LLM operations")]
    pub temperature: Option<f32>,

    #[clap(long, global = true, help = "Directory for the persistent LLM response cache")]
    pub cache_dir: Option<PathBuf>,

    #[clap(
        long,
        global = true,
        conflicts_with = "cache_dir",
        help = "Cache LLM responses in memory for this run only"
    )]
    pub memory_cache: bool,

    #[clap(
        long,
        global = true,
        requires = "cache_dir",
        help = "Empty the persistent response cache before running"
    )]
    pub clear_cache: bool,

    #[clap(subcommand)]
    pub command: Command,
}

impl Args {
    /// Response cache requested on the command line, if any
    pub fn cache_config(&self) -> Option<CacheConfig> {
        match (&self.cache_dir, self.memory_cache) {
            (Some(dir), _) => Some(CacheConfig::disk(dir.to_string_lossy().into_owned())),
            (None, true) => Some(CacheConfig::memory()),
            (None, false) => None,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Keep political, text-only, long-enough tweets
    Filter {
        input: PathBuf,
        output: PathBuf,
        #[clap(long, help = "Minimum number of word tokens")]
        min_tokens: Option<usize>,
        #[clap(long, value_delimiter = ',', help = "Comma-separated bio keywords")]
        keywords: Option<Vec<String>>,
    },

    /// Translate a text column to English
    Translate {
        input: PathBuf,
        output: PathBuf,
        #[clap(long, default_value = "Content")]
        column: String,
        #[clap(long, default_value_t = 1000, help = "Pause between requests in milliseconds")]
        delay_ms: u64,
        #[clap(long, default_value_t = 10, help = "Write a checkpoint every N rows")]
        checkpoint_every: usize,
        #[clap(long, help = "Only translate rows without a translation")]
        only_missing: bool,
    },

    /// Term frequencies with entity tags, plus a word cloud
    Summarize {
        input: PathBuf,
        #[clap(long, help = "Output CSV with Word, Frequency and NER columns")]
        output: PathBuf,
        #[clap(long, help = "Output SVG word cloud")]
        cloud: Option<PathBuf>,
        #[clap(long, default_value = "translation")]
        column: String,
        #[clap(long, default_value_t = 100)]
        top_n: usize,
        #[clap(long, value_enum, default_value_t = NerBackend::Heuristic)]
        ner: NerBackend,
        #[clap(long, default_value_t = 2_000_000)]
        max_ner_chars: usize,
    },

    /// Classify stance toward the target entity
    Classify(ClassifyArgs),

    /// Build a knowledge graph from Wikipedia pages of the top entities
    Ingest(IngestArgs),

    /// Print the prompt templates
    Prompts {
        #[clap(help = "Only print the template with this name")]
        name: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[clap(long, value_enum, default_value_t = StrategyArg::ZeroShot)]
    pub strategy: StrategyArg,

    #[clap(long, conflicts_with = "input", help = "Classify a single tweet")]
    pub tweet: Option<String>,

    #[clap(long, requires = "output", help = "Classify every row of a CSV table")]
    pub input: Option<PathBuf>,

    #[clap(long)]
    pub output: Option<PathBuf>,

    #[clap(long, help = "Target entity (default: Awami League)")]
    pub entity: Option<String>,

    #[clap(long)]
    pub context: Option<String>,

    #[clap(long)]
    pub tweet_info: Option<String>,

    #[clap(long)]
    pub relational_text: Option<String>,

    #[clap(long)]
    pub unstructured_data: Option<String>,

    #[clap(long)]
    pub text_column: Option<String>,

    #[clap(long)]
    pub entity_column: Option<String>,

    #[clap(long)]
    pub context_column: Option<String>,

    #[clap(long)]
    pub tweet_info_column: Option<String>,

    #[clap(long)]
    pub relational_text_column: Option<String>,

    #[clap(long)]
    pub unstructured_data_column: Option<String>,

    #[clap(long, default_value_t = 0, help = "Pause between requests in milliseconds")]
    pub delay_ms: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct IngestArgs {
    pub input: PathBuf,

    #[clap(long, default_value = "Word")]
    pub column: String,

    #[clap(long, default_value_t = 20)]
    pub top_n: usize,

    #[clap(long, default_value_t = 256)]
    pub chunk_size: usize,

    #[clap(long, default_value_t = 50)]
    pub chunk_overlap: usize,

    #[clap(long, default_value = "en")]
    pub lang: String,

    #[clap(long, default_value_t = 25)]
    pub max_docs: usize,

    #[clap(long, default_value_t = 4000)]
    pub max_chars: usize,

    #[clap(long, help = "Store chunk embeddings and create a vector index")]
    pub embed: bool,

    #[clap(long, help = "Do not store source chunks as Document nodes")]
    pub no_source: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerBackend {
    Heuristic,
    Llm,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    ZeroShot,
    FewShot,
    FewShotContext,
    GraspChoq,
}

impl From<StrategyArg> for StanceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ZeroShot => StanceStrategy::ZeroShot,
            StrategyArg::FewShot => StanceStrategy::FewShot,
            StrategyArg::FewShotContext => StanceStrategy::FewShotContext,
            StrategyArg::GraspChoq => StanceStrategy::GraspChoq,
        }
    }
}

/// Completion endpoint settings
#[derive(Debug, Clone, Default)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
}

impl LlmSettings {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("OPENROUTER_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok(),
            model: env::var("MODEL_NAME").ok(),
            base_url: env::var("LLM_BASE_URL").ok(),
            temperature: env::var("LLM_TEMPERATURE").ok().and_then(|t| t.parse().ok()),
            max_tokens: env::var("LLM_MAX_TOKENS").ok().and_then(|t| t.parse().ok()),
            timeout_secs: env::var("LLM_TIMEOUT_SECS").ok().and_then(|t| t.parse().ok()),
            max_retries: env::var("LLM_MAX_RETRIES").ok().and_then(|r| r.parse().ok()),
        }
    }

    pub fn from_cli_and_env(args: &Args) -> Self {
        Self::from_env().with_overrides(args)
    }

    /// CLI flags take precedence over the environment
    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(model) = &args.model {
            self.model = Some(model.clone());
        }
        if let Some(base_url) = &args.base_url {
            self.base_url = Some(base_url.clone());
        }
        if let Some(temperature) = args.temperature {
            self.temperature = Some(temperature);
        }
        self
    }

    pub fn to_llm_config(&self) -> Result<LlmConfig> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            anyhow!("OPENROUTER_API_KEY or OPENAI_API_KEY must be set for LLM operations")
        })?;

        let mut config = LlmConfig::default().with_api_key(api_key);
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(timeout_secs));
        }
        if let Some(max_retries) = self.max_retries {
            config = config.with_max_retries(max_retries);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Neo4j connection settings
#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl Neo4jSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            uri: env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: env::var("NEO4J_USER")
                .or_else(|_| env::var("NEO4J_USERNAME"))
                .unwrap_or_else(|_| "neo4j".to_string()),
            password: env::var("NEO4J_PASSWORD")
                .map_err(|_| anyhow!("NEO4J_PASSWORD must be set for ingestion"))?,
            database: env::var("NEO4J_DATABASE").ok(),
        })
    }

    pub fn to_database_config(&self) -> Result<DatabaseConfig> {
        let mut config = DatabaseConfig::neo4j(
            self.uri.clone(),
            self.user.clone(),
            self.password.clone(),
        );
        if let Some(database) = &self.database {
            config = config.with_database(database.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Embedding endpoint settings
#[derive(Debug, Clone)]
pub struct EmbedderSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub dimension: Option<usize>,
}

impl EmbedderSettings {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("EMBEDDER_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok(),
            model: env::var("EMBEDDER_MODEL_NAME").ok(),
            base_url: env::var("EMBEDDER_BASE_URL").ok(),
            dimension: env::var("EMBEDDER_DIMENSION").ok().and_then(|d| d.parse().ok()),
        }
    }

    pub fn to_embedder_config(&self) -> OpenAiEmbedderConfig {
        let mut config = OpenAiEmbedderConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            ..OpenAiEmbedderConfig::default()
        };
        if let Some(model) = &self.model {
            config.embedding_model = model.clone();
        }
        if let Some(dimension) = self.dimension {
            config.embedding_dim = dimension;
        }
        config
    }
}

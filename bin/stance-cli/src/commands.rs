use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use stance_core::cache::Cache;
use stance_core::database::StoreOptions;
use stance_core::knowledge_graph::{IngestConfig, SplitterConfig, WikipediaConfig};
use stance_core::lexicon::{
    entries_to_table, CapitalizedSpanRecognizer, EntityRecognizer, LlmEntityRecognizer,
    SummarizerConfig,
};
use stance_core::prompts::get_prompt_library;
use stance_core::stance::{ClassifyTableConfig, StanceInput};
use stance_core::{
    filter_dataset, CachedLlmClient, FilterConfig, GraphStore, KnowledgeGraphIngestor,
    LexicalSummarizer, LlmClient, LlmGraphExtractor, Neo4jGraphStore, OpenAiClient,
    OpenAiEmbedder, StanceClassifier, Table, Translator, TranslatorConfig, WikipediaSource,
};
use tracing::{info, warn};
use validator::Validate;

use crate::config::{
    Args, ClassifyArgs, EmbedderSettings, IngestArgs, LlmSettings, Neo4jSettings, NerBackend,
};

fn read_table(path: &Path) -> Result<Table> {
    Table::read_csv(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_table(table: &Table, path: &Path) -> Result<()> {
    table
        .write_csv(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Response cache selected by the global flags, emptied first with `--clear-cache`
async fn open_cache(args: &Args) -> Result<Option<Arc<dyn Cache>>> {
    let Some(config) = args.cache_config() else {
        return Ok(None);
    };
    let cache = config.build().context("Failed to open LLM response cache")?;
    if args.clear_cache {
        cache.clear().await?;
        info!("Cleared LLM response cache");
    }
    Ok(Some(cache))
}

async fn log_cache_stats(cache: Option<&Arc<dyn Cache>>) {
    let Some(cache) = cache else {
        return;
    };
    match cache.stats().await {
        Ok(stats) => info!(
            "LLM cache: {} hits, {} misses ({:.0}% hit rate), {} entries",
            stats.hits,
            stats.misses,
            stats.hit_rate() * 100.0,
            stats.entries
        ),
        Err(e) => warn!("Could not read cache statistics: {}", e),
    }
}

/// Completion client for `settings`, wrapped in the response cache when one
/// is configured
fn build_llm_client(
    settings: &LlmSettings,
    cache: Option<&Arc<dyn Cache>>,
) -> Result<Arc<dyn LlmClient>> {
    let config = settings.to_llm_config()?;
    let namespace = format!("{}@{}", config.model, config.temperature);
    let client: Arc<dyn LlmClient> =
        Arc::new(OpenAiClient::new(config).context("Failed to create LLM client")?);

    match cache {
        Some(cache) => Ok(Arc::new(CachedLlmClient::new(client, cache.clone(), namespace))),
        None => Ok(client),
    }
}

pub fn run_filter(
    input: &Path,
    output: &Path,
    min_tokens: Option<usize>,
    keywords: Option<Vec<String>>,
) -> Result<()> {
    let mut config = FilterConfig::default();
    if let Some(min_tokens) = min_tokens {
        config = config.with_min_tokens(min_tokens);
    }
    if let Some(keywords) = keywords {
        config = config.with_keywords(keywords);
    }
    config.validate()?;

    let table = read_table(input)?;
    let (filtered, report) = filter_dataset(&table, &config);
    write_table(&filtered, output)?;

    println!("{}", report);
    info!("Filtered dataset written to {}", output.display());
    Ok(())
}

pub async fn run_translate(
    args: &Args,
    input: &Path,
    output: &Path,
    column: &str,
    delay_ms: u64,
    checkpoint_every: usize,
    only_missing: bool,
) -> Result<()> {
    // Translation always decodes greedily
    let mut settings = LlmSettings::from_cli_and_env(args);
    settings.temperature = Some(0.0);
    let cache = open_cache(args).await?;
    let client = build_llm_client(&settings, cache.as_ref())?;

    let config = TranslatorConfig {
        text_column: column.to_string(),
        ..TranslatorConfig::default()
    }
    .with_delay(Duration::from_millis(delay_ms))
    .with_checkpoint(output, checkpoint_every)
    .with_only_missing(only_missing);
    config.validate()?;

    let mut table = read_table(input)?;
    let report = Translator::new(client, config)
        .translate_table(&mut table)
        .await?;
    write_table(&table, output)?;

    info!(
        "Translated {} rows ({} failed, {} empty, {} already translated)",
        report.translated,
        report.failed.len(),
        report.skipped_empty,
        report.skipped_existing
    );
    if !report.failed.is_empty() {
        println!(
            "Rows without a translation: {:?}. Re-run with --only-missing to retry them.",
            report.failed
        );
    }
    log_cache_stats(cache.as_ref()).await;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_summarize(
    args: &Args,
    input: &Path,
    output: &Path,
    cloud: Option<&Path>,
    column: &str,
    top_n: usize,
    ner: NerBackend,
    max_ner_chars: usize,
) -> Result<()> {
    let config = SummarizerConfig {
        column: column.to_string(),
        top_n,
        max_ner_chars,
        ..SummarizerConfig::default()
    };
    config.validate()?;

    let cache = match ner {
        NerBackend::Heuristic => None,
        NerBackend::Llm => open_cache(args).await?,
    };
    let recognizer: Arc<dyn EntityRecognizer> = match ner {
        NerBackend::Heuristic => Arc::new(CapitalizedSpanRecognizer::default()),
        NerBackend::Llm => {
            let settings = LlmSettings::from_cli_and_env(args);
            Arc::new(LlmEntityRecognizer::new(build_llm_client(
                &settings,
                cache.as_ref(),
            )?))
        }
    };

    let table = read_table(input)?;
    let summary = LexicalSummarizer::new(recognizer, config)
        .summarize_table(&table)
        .await?;

    write_table(&entries_to_table(&summary.entries)?, output)?;
    info!("Wrote {} terms to {}", summary.entries.len(), output.display());

    if let Some(cloud) = cloud {
        summary
            .word_cloud
            .write_svg(cloud)
            .with_context(|| format!("Failed to write {}", cloud.display()))?;
        info!("Word cloud written to {}", cloud.display());
    }
    log_cache_stats(cache.as_ref()).await;
    Ok(())
}

pub async fn run_classify(args: &Args, classify: &ClassifyArgs) -> Result<()> {
    let settings = LlmSettings::from_cli_and_env(args);
    let cache = open_cache(args).await?;
    let client = build_llm_client(&settings, cache.as_ref())?;

    let mut classifier = StanceClassifier::new(client, classify.strategy.into());
    if let Some(entity) = &classify.entity {
        classifier = classifier.with_default_entity(entity.clone());
    }

    match (&classify.tweet, &classify.input) {
        (Some(tweet), _) => {
            let mut input = StanceInput::new(tweet.clone());
            if let Some(context) = &classify.context {
                input = input.with_context(context.clone());
            }
            if let Some(tweet_info) = &classify.tweet_info {
                input = input.with_tweet_info(tweet_info.clone());
            }
            if let Some(relational_text) = &classify.relational_text {
                input = input.with_relational_text(relational_text.clone());
            }
            if let Some(unstructured_data) = &classify.unstructured_data {
                input = input.with_unstructured_data(unstructured_data.clone());
            }

            let outcome = classifier.classify(&input).await?;
            let printed = serde_json::json!({
                "strategy": classifier.strategy().as_str(),
                "label": outcome.label,
                "raw": outcome.raw,
            });
            println!("{}", serde_json::to_string_pretty(&printed)?);
            log_cache_stats(cache.as_ref()).await;
            Ok(())
        }
        (None, Some(input)) => {
            let output = classify
                .output
                .as_ref()
                .ok_or_else(|| anyhow!("--output is required with --input"))?;
            let config = ClassifyTableConfig {
                text_column: classify.text_column.clone(),
                entity_column: classify.entity_column.clone(),
                context_column: classify.context_column.clone(),
                tweet_info_column: classify.tweet_info_column.clone(),
                relational_text_column: classify.relational_text_column.clone(),
                unstructured_data_column: classify.unstructured_data_column.clone(),
                delay: Duration::from_millis(classify.delay_ms),
            };

            let mut table = read_table(input)?;
            let report = classifier.classify_table(&mut table, &config).await?;
            write_table(&table, output)?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            log_cache_stats(cache.as_ref()).await;
            Ok(())
        }
        (None, None) => Err(anyhow!("Either --tweet or --input must be given")),
    }
}

pub async fn run_ingest(args: &Args, ingest: &IngestArgs) -> Result<()> {
    let settings = LlmSettings::from_cli_and_env(args);
    let cache = open_cache(args).await?;
    let client = build_llm_client(&settings, cache.as_ref())?;

    let database = Neo4jSettings::from_env()?.to_database_config()?;
    let store = Neo4jGraphStore::new(database)
        .await
        .context("Failed to connect to Neo4j")?;
    if !store.health_check().await? {
        return Err(anyhow!("Neo4j health check returned no rows"));
    }

    let source = WikipediaSource::new(WikipediaConfig {
        lang: ingest.lang.clone(),
        max_docs: ingest.max_docs,
        max_chars: ingest.max_chars,
        ..WikipediaConfig::default()
    })?;

    let config = IngestConfig {
        entity_column: ingest.column.clone(),
        top_entities: ingest.top_n,
        splitter: SplitterConfig {
            chunk_size: ingest.chunk_size,
            chunk_overlap: ingest.chunk_overlap,
        },
        store: StoreOptions {
            include_source: !ingest.no_source,
            ..StoreOptions::default()
        },
    };

    let mut ingestor = KnowledgeGraphIngestor::new(
        Arc::new(source),
        Arc::new(LlmGraphExtractor::new(client)),
        Arc::new(store),
        config,
    )?;
    if ingest.embed {
        let embedder = OpenAiEmbedder::new(EmbedderSettings::from_env().to_embedder_config())?;
        ingestor = ingestor.with_embedder(Arc::new(embedder));
    }

    let table = read_table(&ingest.input)?;
    let report = ingestor.ingest_table(&table).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    log_cache_stats(cache.as_ref()).await;
    Ok(())
}

pub fn run_prompts(name: Option<&str>) -> Result<()> {
    let library = get_prompt_library();
    let templates: Vec<_> = library
        .all()
        .into_iter()
        .filter(|t| name.map_or(true, |n| t.name == n))
        .collect();
    if templates.is_empty() {
        return Err(anyhow!("No prompt named {}", name.unwrap_or_default()));
    }

    for template in templates {
        println!("== {} (v{}) slots: {}", template.name, template.version, template.slots.join(", "));
        if let Some(system) = template.system {
            println!("-- system\n{}", system);
        }
        println!("-- user\n{}\n", template.template);
    }
    Ok(())
}

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so reports on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stance=info,stance_core=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match &args.command {
        Command::Filter {
            input,
            output,
            min_tokens,
            keywords,
        } => commands::run_filter(input, output, *min_tokens, keywords.clone()),
        Command::Translate {
            input,
            output,
            column,
            delay_ms,
            checkpoint_every,
            only_missing,
        } => {
            commands::run_translate(
                &args,
                input,
                output,
                column,
                *delay_ms,
                *checkpoint_every,
                *only_missing,
            )
            .await
        }
        Command::Summarize {
            input,
            output,
            cloud,
            column,
            top_n,
            ner,
            max_ner_chars,
        } => {
            commands::run_summarize(
                &args,
                input,
                output,
                cloud.as_deref(),
                column,
                *top_n,
                *ner,
                *max_ner_chars,
            )
            .await
        }
        Command::Classify(classify) => commands::run_classify(&args, classify).await,
        Command::Ingest(ingest) => commands::run_ingest(&args, ingest).await,
        Command::Prompts { name } => commands::run_prompts(name.as_deref()),
    };

    match result {
        Ok(()) => {
            info!("Done");
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}

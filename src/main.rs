use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod assemble;
mod batch;
mod classifier;
mod config;
mod corpus;
mod error;
mod extract;
mod forest;
mod generator;
mod models;
mod report;
mod schema;

use classifier::Classifier;
use config::TrainingConfig;

#[derive(Parser)]
#[command(name = "symptom-triage")]
#[command(about = "Ranks probable diagnoses from vitals and free-text symptoms", long_about = None)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModelArgs {
    /// Number of synthetic training cases
    #[arg(
        long,
        global = true,
        env = "TRIAGE_CASES",
        default_value_t = config::DEFAULT_CASES
    )]
    cases: usize,
    /// Seed for the synthetic corpus and the forest
    #[arg(
        long,
        global = true,
        env = "TRIAGE_SEED",
        default_value_t = config::DEFAULT_SEED
    )]
    seed: u64,
    /// Trees in the ensemble
    #[arg(
        long,
        global = true,
        env = "TRIAGE_TREES",
        default_value_t = config::DEFAULT_TREES
    )]
    trees: usize,
}

impl ModelArgs {
    fn config(&self) -> TrainingConfig {
        TrainingConfig {
            cases: self.cases,
            seed: self.seed,
            trees: self.trees,
            ..TrainingConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rank diagnoses for one JSON request
    Predict {
        #[arg(long)]
        json: String,
    },
    /// Show the symptom flags found in free text
    Extract { text: String },
    /// Write the synthetic training corpus as CSV
    Corpus {
        #[arg(long, default_value = "corpus.csv")]
        out: PathBuf,
    },
    /// Score a CSV of requests and optionally write a markdown report
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

async fn train(config: TrainingConfig) -> anyhow::Result<Arc<Classifier>> {
    let classifier = tokio::task::spawn_blocking(move || Classifier::train(&config))
        .await
        .context("training task failed")?
        .context("refusing to serve an untrainable model")?;
    Ok(Arc::new(classifier))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.model.config();

    match cli.command {
        Commands::Predict { json } => {
            let classifier = train(config).await?;
            let response = classifier::respond(&classifier, &json);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Extract { text } => {
            let flags = extract::extract_flags(Some(&text));
            println!("{}", serde_json::to_string_pretty(&flags)?);
        }
        Commands::Corpus { out } => {
            config.validate()?;
            let mut rng = StdRng::seed_from_u64(config.seed);
            let cases = generator::generate_cases(config.cases, &mut rng);
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            corpus::write_corpus(&cases, file)?;

            println!("Wrote {} cases to {}.", cases.len(), out.display());
            for (label, count) in generator::label_counts(&cases) {
                println!("- {label}: {count}");
            }
        }
        Commands::Batch { csv, out, limit } => {
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let cases = batch::read_cases(file)?;
            let classifier = train(config).await?;
            let classes = classifier.classes().to_vec();
            let outcomes = batch::score_cases(classifier, cases).await?;

            if outcomes.is_empty() {
                println!("No cases found in {}.", csv.display());
                return Ok(());
            }

            let rejected = outcomes.iter().filter(|o| o.result.is_err()).count();
            println!("Scored {} cases ({rejected} rejected).", outcomes.len());
            for outcome in outcomes.iter().take(limit) {
                match &outcome.result {
                    Ok(prediction) => {
                        if let Some(best) = prediction.best() {
                            println!("- {}: {} ({:.2})", outcome.case_id, best.label, best.prob);
                        }
                    }
                    Err(err) => println!("- {}: rejected, {err}", outcome.case_id),
                }
            }

            if let Some(path) = out {
                let report = report::build_report(
                    &csv.display().to_string(),
                    chrono::Utc::now(),
                    &classes,
                    &outcomes,
                    limit,
                );
                std::fs::write(&path, report)?;
                println!("Report written to {}.", path.display());
            }
        }
    }

    Ok(())
}

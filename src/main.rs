mod config;
mod export;
mod finder;
mod llm;
mod session;
mod strategy;
mod web;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use config::Config;
use finder::{ContentFinder, DayCount};
use strategy::{StrategyWeights, DEFAULT_WEIGHT};

#[derive(Parser)]
#[command(
    name = "content-finder",
    about = "Find teaching content tailored to learning strategies and turn it into a plan"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web form
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8501")]
        bind: String,
    },
    /// Run a single search from the command line
    Search {
        /// The topic to teach
        topic: String,

        #[command(flatten)]
        weights: WeightArgs,

        /// Also create a learning plan from the results
        #[arg(long)]
        plan: bool,

        /// Number of days for the plan
        #[arg(short, long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=30))]
        days: u32,
    },
}

#[derive(Args)]
struct WeightArgs {
    /// Apprentice - Mentor-Student interaction
    #[arg(long, default_value_t = DEFAULT_WEIGHT, value_parser = clap::value_parser!(u8).range(0..=100))]
    apprentice: u8,
    /// Incidental - Case Studies
    #[arg(long, default_value_t = DEFAULT_WEIGHT, value_parser = clap::value_parser!(u8).range(0..=100))]
    incidental: u8,
    /// Inductive - Examples
    #[arg(long, default_value_t = DEFAULT_WEIGHT, value_parser = clap::value_parser!(u8).range(0..=100))]
    inductive: u8,
    /// Deductive - Application
    #[arg(long, default_value_t = DEFAULT_WEIGHT, value_parser = clap::value_parser!(u8).range(0..=100))]
    deductive: u8,
    /// Discovery - Experimentation
    #[arg(long, default_value_t = DEFAULT_WEIGHT, value_parser = clap::value_parser!(u8).range(0..=100))]
    discovery: u8,
}

impl WeightArgs {
    fn to_weights(&self) -> Result<StrategyWeights> {
        Ok(StrategyWeights::new([
            self.apprentice.into(),
            self.incidental.into(),
            self.inductive.into(),
            self.deductive.into(),
            self.discovery.into(),
        ])?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve { bind } => web::serve(&config, &bind).await?,
        Commands::Search {
            topic,
            weights,
            plan,
            days,
        } => {
            if topic.trim().is_empty() {
                anyhow::bail!("Please enter a topic to search.");
            }

            let finder = ContentFinder::new(&config);
            let weights = weights.to_weights()?;

            let results = finder
                .search(topic.trim(), &weights)
                .await
                .context("Search failed")?;
            println!("\n=== Search Results ===\n\n{}\n", results);

            if plan {
                let days = DayCount::new(i64::from(days))?;
                let learning_plan = finder
                    .plan(&results, days, &weights)
                    .await
                    .context("Plan failed")?;
                println!("=== Learning Plan ===\n\n{}\n", learning_plan);
            }
        }
    }

    Ok(())
}

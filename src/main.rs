/// CLI: анализ опроса о сне

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use sleep_ml::{config::PipelineConfig, export::write_enriched_csv, pipeline};

#[derive(Debug, Parser)]
#[command(name = "sleep-ml", version, about = "Sleep & lifestyle regression report")]
struct Cli {
    /// CSV с данными опроса
    input: PathBuf,

    /// JSON с настройками конвейера
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed для разбиения (перекрывает значение из конфига)
    #[arg(long)]
    seed: Option<u64>,

    /// Seed для синтетических дат
    #[arg(long)]
    date_seed: Option<u64>,

    /// Вывести полный отчёт в JSON
    #[arg(long)]
    json: bool,

    /// Сохранить обогащённую таблицу в CSV
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("config stage failed for {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.date_seed.is_some() {
        config.date_seed = cli.date_seed;
    }

    tracing::info!("Running pipeline on {} (seed {})", cli.input.display(), config.seed);

    let output = pipeline::run(&cli.input, &config)
        .with_context(|| format!("analysis of {} aborted", cli.input.display()))?;

    if let Some(path) = &cli.export {
        write_enriched_csv(path, &output.table.records).context("export stage failed")?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        print!("{}", output.report);
    }

    Ok(())
}

//! Survey delta CLI
//!
//! Command-line tool for turning field-survey exports into incremental
//! reference updates.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use survey_core::{
    incremental_path, load_reference, parse_block, parse_csv, write_csv, BlockKind,
    PipelineConfig,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "survey-cli")]
#[command(about = "Field survey delta pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and update the reference dataset
    Run {
        /// Survey panel export (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Reference dataset (CSV); created if missing
        #[arg(short, long)]
        reference: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Date stamped on the incremental file (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Report the delta without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the flattened wide table of an export
    Flatten {
        /// Survey panel export (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse one blob with a chosen parser and print it as JSON
    ParseBlock {
        /// Parser name (basic_details, phase_status, brochure, payment_plan,
        /// tower_details, certificate, options, prices, url_list)
        #[arg(short, long)]
        kind: String,

        /// File holding the raw blob text
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Write the default configuration as a starting point
    InitConfig {
        /// Output path for the configuration file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> survey_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            reference,
            config,
            date,
            dry_run,
        } => cmd_run(&input, &reference, config.as_deref(), date, dry_run),
        Commands::Flatten {
            input,
            output,
            config,
        } => cmd_flatten(&input, &output, config.as_deref()),
        Commands::ParseBlock { kind, file } => cmd_parse_block(&kind, &file),
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> survey_core::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path),
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_run(
    input: &Path,
    reference: &Path,
    config: Option<&Path>,
    date: Option<NaiveDate>,
    dry_run: bool,
) -> survey_core::Result<()> {
    let config = load_config(config)?;
    let export = parse_csv(input, config.skip_rows)?;
    let current_reference = load_reference(reference)?;

    let output = survey_core::run(&export, &current_reference, &config)?;

    println!("Input: {} ({} visits)", input.display(), output.processed_rows);
    println!("Flattened rows: {}", output.flattened.row_count());
    println!("Entities: {}", output.aggregated.row_count());
    println!("New: {}", output.delta.new_keys.len());
    println!("Changed: {}", output.delta.changed_keys.len());

    if output.delta.is_empty() {
        println!("\nReference is up to date; nothing to write.");
        return Ok(());
    }

    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let incremental = incremental_path(reference, date);

    if dry_run {
        println!("\nDry run, not writing:");
        println!("  {}", incremental.display());
        println!("  {}", reference.display());
        return Ok(());
    }

    write_csv(&incremental, &output.delta.table, &config.na_placeholder)?;
    write_csv(reference, &output.updated_reference, &config.na_placeholder)?;

    println!("\nWrote {} rows to {}", output.delta.table.row_count(), incremental.display());
    println!(
        "Reference {} now holds {} rows",
        reference.display(),
        output.updated_reference.row_count()
    );

    Ok(())
}

fn cmd_flatten(input: &Path, output: &Path, config: Option<&Path>) -> survey_core::Result<()> {
    let config = load_config(config)?;
    let export = parse_csv(input, config.skip_rows)?;
    let flat = survey_core::flatten_table(&export, &config)?;

    write_csv(output, &flat, "")?;
    println!(
        "Flattened {} visits into {} rows ({} columns) at {}",
        export.row_count(),
        flat.row_count(),
        flat.column_count(),
        output.display()
    );

    Ok(())
}

fn cmd_parse_block(kind: &str, file: &Path) -> survey_core::Result<()> {
    let kind = BlockKind::from_name(kind)
        .ok_or_else(|| survey_core::Error::UnknownBlockKind(kind.to_string()))?;
    let text = fs::read_to_string(file).map_err(|e| survey_core::Error::FileRead {
        path: file.to_path_buf(),
        source: e,
    })?;

    let block = parse_block(kind, &text);
    println!("{}", serde_json::to_string_pretty(&block)?);

    Ok(())
}

fn cmd_init_config(output: &Path) -> survey_core::Result<()> {
    let config = PipelineConfig::default();
    config.save(output)?;

    println!("Created config file: {}", output.display());
    println!("Blob columns: {}", config.blob_columns.len());
    println!();
    println!("Edit the file to match your export, then run:");
    println!(
        "  survey-cli run --input <export.csv> --reference <Final.csv> --config {}",
        output.display()
    );

    Ok(())
}

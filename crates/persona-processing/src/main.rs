//! CLI entry point for the personality preprocessing stages.

use anyhow::{Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenv::dotenv;
use persona_processing::{
    ColumnCheckMode, DataTransformationArtifact, DataTransformer, DataValidationArtifact,
    DataValidator, PipelineConfig, PipelineOutcome, SchemaConfig, StagePipeline,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Schema validation and feature transformation for the personality dataset",
    long_about = "Validates ingested train/test CSV splits against a YAML schema and turns \
                  them into model-ready numeric arrays.\n\n\
                  EXAMPLES:\n  \
                  # Validate, then transform if validation passes\n  \
                  persona-processing run --train data/train.csv --test data/test.csv\n\n  \
                  # Only write the validation report\n  \
                  persona-processing validate --strict-columns\n\n  \
                  # Transform without oversampling, JSON summary on stdout\n  \
                  persona-processing transform --no-balance --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the train/test splits and write the report
    Validate(StageArgs),
    /// Fit the preprocessing pipeline and write the transformed arrays
    Transform(StageArgs),
    /// Validate, then transform only if validation passed
    Run(StageArgs),
}

#[derive(ClapArgs, Debug)]
struct StageArgs {
    /// Schema YAML file
    #[arg(long, default_value = persona_processing::config::SCHEMA_FILE_PATH)]
    schema: PathBuf,

    /// Raw training split (default: <artifact-dir>/data_ingestion/ingested/train.csv)
    #[arg(long)]
    train: Option<PathBuf>,

    /// Raw test split (default: <artifact-dir>/data_ingestion/ingested/test.csv)
    #[arg(long)]
    test: Option<PathBuf>,

    /// Root directory for all artifacts
    #[arg(short, long, default_value = persona_processing::config::ARTIFACT_DIR)]
    artifact_dir: PathBuf,

    /// Target column
    #[arg(short, long, default_value = persona_processing::TARGET_COLUMN)]
    target: String,

    /// Fail validation when any required column is missing
    #[arg(long)]
    strict_columns: bool,

    /// Skip SMOTE on the training split
    #[arg(long)]
    no_balance: bool,

    /// Neighbours used by SMOTE
    #[arg(long, default_value = "5")]
    k_neighbors: usize,

    /// Seed for SMOTE
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Print the outcome as JSON instead of a human-readable summary
    ///
    /// Disables logging so stdout only carries the JSON document.
    #[arg(long)]
    json: bool,
}

impl StageArgs {
    fn to_config(&self) -> Result<PipelineConfig> {
        let mut builder = PipelineConfig::builder()
            .schema_path(&self.schema)
            .artifact_dir(&self.artifact_dir)
            .target_column(&self.target)
            .balance_classes(!self.no_balance)
            .smote_k_neighbors(self.k_neighbors)
            .random_state(self.seed);

        if self.strict_columns {
            builder = builder.column_check_mode(ColumnCheckMode::Strict);
        }
        if let Some(ref train) = self.train {
            builder = builder.train_file_path(train);
        }
        if let Some(ref test) = self.test {
            builder = builder.test_file_path(test);
        }

        Ok(builder.build()?)
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Logging stays off with `--json` so stdout only carries the report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let args = match &cli.command {
        Command::Validate(args) | Command::Transform(args) | Command::Run(args) => args,
    };

    init_logging(&args.log_level, args.quiet, args.json);
    dotenv().ok();

    let config = args.to_config()?;
    if !config.schema_path.exists() {
        return Err(anyhow!(
            "Schema file not found: {}",
            config.schema_path.display()
        ));
    }
    let schema = SchemaConfig::from_file(&config.schema_path)?;

    match &cli.command {
        Command::Validate(_) => run_validate(config, schema, args.json),
        Command::Transform(_) => run_transform(config, schema, args.json),
        Command::Run(_) => run_all(config, schema, args.json),
    }
}

fn run_validate(config: PipelineConfig, schema: SchemaConfig, json: bool) -> Result<()> {
    let artifact = DataValidator::new(config, schema)
        .validate_files()
        .map_err(|e| anyhow!("Validation failed: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        print_validation(&artifact);
    }

    if artifact.validation_status {
        Ok(())
    } else {
        Err(anyhow!("Validation did not pass: {}", artifact.message))
    }
}

fn run_transform(config: PipelineConfig, schema: SchemaConfig, json: bool) -> Result<()> {
    let artifact = DataTransformer::new(config, schema).run().map_err(|e| {
        error!("Transformation failed: {}", e);
        anyhow!("Transformation failed: {}", e)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        print_transformation(&artifact);
    }
    Ok(())
}

fn run_all(config: PipelineConfig, schema: SchemaConfig, json: bool) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting validation and transformation...");
    info!("{}", "=".repeat(80));

    let outcome = StagePipeline::builder()
        .config(config)
        .schema(schema)
        .build()?
        .run()
        .map_err(|e| anyhow!("Pipeline failed: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if outcome.succeeded() {
        Ok(())
    } else {
        Err(anyhow!(
            "Validation did not pass: {}",
            outcome.validation.message
        ))
    }
}

fn print_outcome(outcome: &PipelineOutcome) {
    print_validation(&outcome.validation);
    if let Some(ref transformation) = outcome.transformation {
        print_transformation(transformation);
    } else {
        println!("Transformation skipped.");
    }
}

/// Note: `println!` is used on purpose; this is the command's output, not logging.
fn print_validation(artifact: &DataValidationArtifact) {
    println!("\n{}", "=".repeat(80));
    println!("DATA VALIDATION");
    println!("{}", "=".repeat(80));
    println!(
        "  Status: {}",
        if artifact.validation_status {
            "PASSED"
        } else {
            "FAILED"
        }
    );
    if !artifact.message.is_empty() {
        for message in artifact.message.split("; ") {
            println!("  - {}", message);
        }
    }
    println!(
        "  Report: {}",
        artifact.validation_report_file_path.display()
    );
    println!();
}

fn print_transformation(artifact: &DataTransformationArtifact) {
    let summary = &artifact.summary;

    println!("{}", "=".repeat(80));
    println!("DATA TRANSFORMATION");
    println!("{}", "=".repeat(80));

    println!("\nROWS");
    println!("{}", "-".repeat(40));
    println!("  Train: {} -> {} after balancing", summary.train_rows, summary.train_rows_balanced);
    println!("  Synthetic rows: {}", summary.synthetic_rows);
    println!("  Test: {}", summary.test_rows);

    println!("\nFEATURES ({})", summary.n_features_out);
    println!("{}", "-".repeat(40));
    for name in &summary.feature_names {
        println!("  - {}", name);
    }

    println!("\nCLASS DISTRIBUTION (train)");
    println!("{}", "-".repeat(40));
    println!("{:<20} {:>10} {:>10}", "Class", "Before", "After");
    for (label, before) in &summary.class_counts_before {
        let after = summary.class_counts_after.get(label).copied().unwrap_or(0);
        println!("{:<20} {:>10} {:>10}", label, before, after);
    }

    if !summary.outliers.is_empty() {
        println!("\nOUTLIER FENCES");
        println!("{}", "-".repeat(40));
        for bounds in &summary.outliers {
            println!(
                "  {:<28} [{:>8.2}, {:>8.2}]  clipped {}",
                bounds.column, bounds.lower, bounds.upper, bounds.clipped
            );
        }
    }

    if !summary.warnings.is_empty() {
        println!("\nWARNINGS");
        println!("{}", "-".repeat(40));
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
    }

    println!("\nOUTPUT FILES");
    println!("{}", "-".repeat(40));
    println!("  Transformer: {}", artifact.transformed_object_file_path.display());
    println!("  Train array: {}", artifact.transformed_train_file_path.display());
    println!("  Test array:  {}", artifact.transformed_test_file_path.display());
    println!("\n{}", "=".repeat(80));
    println!("Completed in {}ms", summary.duration_ms);
    println!("{}", "=".repeat(80));
}

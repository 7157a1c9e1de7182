//! Command Execution Logic
//!
//! Each subcommand loads its configuration, applies flag overrides, calls
//! into the library and renders the result.

use std::path::Path;

use anyhow::Context;
use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use tracing::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use surface_sim::analysis::hit_rate::hit_rate;
use surface_sim::analysis::mae::{records_mae, DEFAULT_PREDICTION_KEYS};
use surface_sim::analysis::thresholds::search_thresholds;
use surface_sim::core::config::{ExternalScorerConfig, SurfaceSimConfig};
use surface_sim::io::batch::{score_records_with_progress, BatchSummary};
use surface_sim::io::external::ExternalScorer;
use surface_sim::io::records::{read_jsonl, write_jsonl, CodePair};
use surface_sim::lang::registry::registered_languages;
use surface_sim::SurfaceScorer;

/// Load a configuration file, or defaults when none is given
pub async fn load_configuration(config_path: Option<&Path>) -> anyhow::Result<SurfaceSimConfig> {
    let config = match config_path {
        Some(path) => SurfaceSimConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SurfaceSimConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Score one pair of files
pub async fn score_command(args: ScoreArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref()).await?;
    let language = args.language.unwrap_or(config.language);

    let reference = tokio::fs::read_to_string(&args.reference)
        .await
        .with_context(|| format!("Failed to read {}", args.reference.display()))?;
    let candidate = tokio::fs::read_to_string(&args.candidate)
        .await
        .with_context(|| format!("Failed to read {}", args.candidate.display()))?;

    let scorer = SurfaceScorer::for_language(&language)?;
    let result = scorer.score(&reference, &candidate);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
        OutputFormat::Pretty => print_score_table(scorer.language(), &result),
    }
    Ok(())
}

/// Score every pair in a JSONL file
pub async fn batch_command(args: BatchArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref()).await?;
    let language = args.language.unwrap_or(config.language);
    let mut batch_config = config.batch;
    if args.no_parallel {
        batch_config.parallel = false;
    }
    if args.max_snippet_chars.is_some() {
        batch_config.max_snippet_chars = args.max_snippet_chars;
    }
    batch_config.validate()?;

    let records = read_jsonl(&args.input)?;
    info!("Loaded {} records from {}", records.len(), args.input.display());

    let pb = batch_progress_bar(records.len(), args.quiet)?;
    let progress = pb.clone();
    let scored = tokio::task::spawn_blocking(move || {
        score_records_with_progress(records, &language, &batch_config, &|| progress.inc(1))
    })
    .await??;
    pb.finish_with_message("Scoring complete");

    write_jsonl(&args.output, scored.iter().map(|row| &row.record))?;
    print_batch_summary(&BatchSummary::from_records(&scored), &args.output);
    Ok(())
}

/// Grid-search region thresholds
pub async fn thresholds_command(args: ThresholdsArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref()).await?;
    let mut search = config.threshold_search;
    if let Some(step) = args.step {
        search.step = step;
    }
    if let Some(min_dfs) = args.min_dfs {
        search.min_dfs = min_dfs;
    }
    if let Some(min_sfd) = args.min_sfd {
        search.min_sfd = min_sfd;
    }
    if let Some(min_control) = args.min_control {
        search.min_control = min_control;
    }
    if let Some(top_k) = args.top_k {
        search.top_k = top_k;
    }

    let records = read_jsonl(&args.input)?;
    let report = tokio::task::spawn_blocking(move || search_thresholds(&records, &search)).await??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_threshold_report(&report);
    }
    Ok(())
}

/// Hit rates at configured or given thresholds
pub async fn hit_rate_command(args: HitRateArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref()).await?;
    let mut thresholds = config.regions;
    if let Some(x_lo) = args.x_lo {
        thresholds.x_lo = x_lo;
    }
    if let Some(x_hi) = args.x_hi {
        thresholds.x_hi = x_hi;
    }
    if let Some(y_lo) = args.y_lo {
        thresholds.y_lo = y_lo;
    }
    if let Some(y_hi) = args.y_hi {
        thresholds.y_hi = y_hi;
    }
    thresholds.validate()?;

    let records = read_jsonl(&args.input)?;
    let result = hit_rate(&records, &thresholds);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_hit_rate(&result);
    }
    Ok(())
}

/// MAE between a truth field and prediction fields
pub async fn mae_command(args: MaeArgs) -> anyhow::Result<()> {
    let records = read_jsonl(&args.input)?;
    let summary = if args.prediction_keys.is_empty() {
        records_mae(&records, &args.truth_field, &DEFAULT_PREDICTION_KEYS)
    } else {
        records_mae(&records, &args.truth_field, &args.prediction_keys)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_mae(&summary);
    }
    Ok(())
}

/// Run the external learned scorer and add its predictions
pub async fn external_command(args: ExternalArgs) -> anyhow::Result<()> {
    let config = load_configuration(args.config.as_deref()).await?;
    let mut external = match (config.external_scorer, args.program) {
        (_, Some(program)) => ExternalScorerConfig::new(program),
        (Some(external), None) => external,
        (None, None) => anyhow::bail!(
            "no external scorer configured; pass --program or add an external_scorer section"
        ),
    };
    if let Some(timeout_secs) = args.timeout_secs {
        external.timeout_secs = timeout_secs;
    }
    let output_field = external.output_field.clone();
    let scorer = ExternalScorer::new(external)?;

    let mut records = read_jsonl(&args.input)?;
    let pairs: Vec<Option<CodePair>> = records
        .iter()
        .map(|record| CodePair::from_record(record, &config.batch))
        .collect();
    let inputs: Vec<(&str, &str)> = pairs
        .iter()
        .flatten()
        .map(|pair| (pair.reference.as_str(), pair.candidate.as_str()))
        .collect();

    info!("Sending {} pairs to {}", inputs.len(), scorer.config().program);
    let mut predictions = scorer.score_pairs(&inputs).await.into_iter();

    let mut missing = 0usize;
    for (record, pair) in records.iter_mut().zip(&pairs) {
        let prediction = match pair {
            Some(_) => predictions.next().flatten(),
            None => None,
        };
        if prediction.is_none() {
            missing += 1;
        }
        record.insert(
            output_field.clone(),
            prediction.map_or(Value::Null, Value::from),
        );
    }
    if missing > 0 {
        warn!("{} of {} records have no prediction", missing, records.len());
    }

    write_jsonl(&args.output, &records)?;
    println!(
        "{} {}",
        "✅ Predictions written to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    Ok(())
}

/// Print default configuration
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default surfacesim configuration".dimmed());
    println!("{}", "# Save this to a file and customize as needed".dimmed());
    println!("{}", "# Usage: surfacesim batch --config your-config.yml ...".dimmed());
    println!();

    let config = SurfaceSimConfig::default();
    let yaml_output = serde_yaml::to_string(&config)?;
    println!("{}", yaml_output);

    Ok(())
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            args.output.display()
        );
    }

    SurfaceSimConfig::default().to_yaml_file(&args.output)?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "🔧 Key settings you can customize:".bright_blue().bold());

    #[derive(Tabled)]
    struct CustomizationRow {
        setting: &'static str,
        description: &'static str,
    }

    let rows = vec![
        CustomizationRow {
            setting: "language",
            description: "Default language tag for scoring",
        },
        CustomizationRow {
            setting: "batch.reference_field / candidate_field",
            description: "JSONL fields holding the code pair",
        },
        CustomizationRow {
            setting: "regions.x_lo / x_hi / y_lo / y_hi",
            description: "Region boundaries for hit-rate analysis",
        },
        CustomizationRow {
            setting: "threshold_search.min_dfs / min_sfd / min_control",
            description: "Sample-size guards for the grid search",
        },
    ];
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);

    Ok(())
}

/// Validate a configuration file
pub async fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );

    let config = load_configuration(Some(&args.config)).await?;
    println!("{}", "✅ Configuration file is valid!".bright_green().bold());

    if args.detailed {
        #[derive(Tabled)]
        struct DetailRow {
            setting: &'static str,
            value: String,
        }

        let r = config.regions;
        let detail_rows = vec![
            DetailRow {
                setting: "Language",
                value: config.language.clone(),
            },
            DetailRow {
                setting: "Batch fields",
                value: format!("{} / {}", config.batch.reference_field, config.batch.candidate_field),
            },
            DetailRow {
                setting: "Parallel",
                value: config.batch.parallel.to_string(),
            },
            DetailRow {
                setting: "Regions",
                value: format!("x {:.2}..{:.2}, y {:.2}..{:.2}", r.x_lo, r.x_hi, r.y_lo, r.y_hi),
            },
            DetailRow {
                setting: "Grid step",
                value: config.threshold_search.step.to_string(),
            },
            DetailRow {
                setting: "External scorer",
                value: config
                    .external_scorer
                    .as_ref()
                    .map_or_else(|| "none".to_string(), |e| e.program.clone()),
            },
        ];
        let mut table = Table::new(detail_rows);
        table.with(TableStyle::rounded());
        println!("{}", table);
    }

    Ok(())
}

/// List supported languages
pub async fn list_languages() -> anyhow::Result<()> {
    let languages = registered_languages();
    println!("{}", "🔤 Supported Languages".bright_blue().bold());
    println!("   Found {} supported languages", languages.len());
    println!();

    #[derive(Tabled)]
    struct LanguageRow {
        key: &'static str,
        language: &'static str,
        aliases: String,
        normalization: &'static str,
    }

    let rows: Vec<LanguageRow> = languages
        .iter()
        .map(|info| LanguageRow {
            key: info.key,
            language: info.name,
            aliases: if info.aliases.is_empty() {
                "-".to_string()
            } else {
                info.aliases.join(", ")
            },
            normalization: info.normalization,
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
    Ok(())
}

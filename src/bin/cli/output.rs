//! Console Output and Progress Display
//!
//! Tables, summaries and progress bars. Result data that other tools consume
//! goes to stdout; decoration stays minimal.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use surface_sim::analysis::hit_rate::HitRate;
use surface_sim::analysis::mae::MaeSummary;
use surface_sim::analysis::regions::RegionCounts;
use surface_sim::analysis::thresholds::ThresholdSearchReport;
use surface_sim::io::batch::BatchSummary;
use surface_sim::SimilarityResult;

/// Format an optional float, `nan` when absent
pub fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => "nan".to_string(),
    }
}

/// Progress bar for a batch run; hidden in quiet mode
pub fn batch_progress_bar(total: usize, quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::with_template(
        "📐 {msg} [{bar:40.bright_blue/blue}] {pos}/{len} {elapsed_precise}",
    )?);
    pb.set_message("Scoring pairs");
    Ok(pb)
}

/// Colored table for one scored pair
pub fn print_score_table(language: &str, result: &SimilarityResult) {
    #[derive(Tabled)]
    struct ScoreRow {
        metric: &'static str,
        score: String,
    }

    println!("{} {}", "📐 Surface similarity".bright_blue().bold(), format!("({language})").dimmed());
    let rows = vec![
        ScoreRow {
            metric: "InverseEdit",
            score: format!("{:.6}", result.inverse_edit),
        },
        ScoreRow {
            metric: "AST",
            score: format!("{:.6}", result.ast),
        },
        ScoreRow {
            metric: "SurfaceSim",
            score: format!("{:.6}", result.surface_sim),
        },
    ];
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}

/// Batch counts
pub fn print_batch_summary(summary: &BatchSummary, output: &std::path::Path) {
    println!("{}", "✅ Batch scoring complete".bright_green().bold());
    println!("   Records:   {}", summary.total);
    println!("   Scored:    {}", summary.scored.to_string().green());
    if summary.skipped > 0 {
        println!("   Skipped:   {}", summary.skipped.to_string().yellow());
    }
    if summary.oversized > 0 {
        println!("   Oversized: {}", summary.oversized.to_string().yellow());
    }
    println!("   Output:    {}", output.display().to_string().cyan());
}

fn counts_line(counts: &RegionCounts) -> String {
    format!(
        "DFS={:5}  SFD={:5}  Control={:5}  Total={:5}",
        counts.dfs,
        counts.sfd,
        counts.control,
        counts.total()
    )
}

/// Best thresholds, per-metric detail and the top-k table
pub fn print_threshold_report(report: &ThresholdSearchReport) {
    let Some(best) = report.best() else {
        return;
    };

    println!("{}", "🎯 Best thresholds (corners = DFS/SFD, else Control)".bright_blue().bold());
    let t = best.thresholds;
    println!(
        "   x_lo = {:.2}  x_hi = {:.2}   y_lo = {:.2}  y_hi = {:.2}",
        t.x_lo, t.x_hi, t.y_lo, t.y_hi
    );
    println!(
        "   Objective (avg MAE gap) = {:.6}   [metrics used: {}/{}]",
        best.objective,
        best.metrics_used,
        report.metrics.len()
    );
    println!("   Counts: {}  (rows {})", counts_line(&best.counts), report.rows);
    println!(
        "   Candidates: {} evaluated, {} passed the guards",
        report.evaluated, report.accepted
    );
    println!();

    #[derive(Tabled)]
    struct MetricRow {
        metric: String,
        mae_dfs: String,
        mae_sfd: String,
        mae_control: String,
        gap_dfs: String,
        gap_sfd: String,
        contribution: String,
    }

    let mut metric_rows: Vec<MetricRow> = best
        .per_metric
        .iter()
        .map(|gap| MetricRow {
            metric: gap.metric.clone(),
            mae_dfs: fmt_opt(gap.mae_dfs),
            mae_sfd: fmt_opt(gap.mae_sfd),
            mae_control: fmt_opt(gap.mae_control),
            gap_dfs: fmt_opt(gap.gap_dfs),
            gap_sfd: fmt_opt(gap.gap_sfd),
            contribution: fmt_opt(gap.contribution),
        })
        .collect();
    metric_rows.sort_by(|a, b| a.metric.cmp(&b.metric));
    let mut table = Table::new(metric_rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
    println!();

    println!("{}", "📦 Per-source counts".bright_blue().bold());
    for (source, counts) in &best.by_source {
        println!("   {:>10}: {}", source.label(), counts_line(counts));
    }
    println!();

    #[derive(Tabled)]
    struct CandidateRow {
        rank: usize,
        x_lo: String,
        x_hi: String,
        y_lo: String,
        y_hi: String,
        objective: String,
        used: usize,
        dfs: usize,
        sfd: usize,
        control: usize,
    }

    println!("{}", format!("🏆 Top {} candidates", report.top.len()).bright_blue().bold());
    let candidate_rows: Vec<CandidateRow> = report
        .top
        .iter()
        .enumerate()
        .map(|(i, c)| CandidateRow {
            rank: i + 1,
            x_lo: format!("{:.2}", c.thresholds.x_lo),
            x_hi: format!("{:.2}", c.thresholds.x_hi),
            y_lo: format!("{:.2}", c.thresholds.y_lo),
            y_hi: format!("{:.2}", c.thresholds.y_hi),
            objective: format!("{:.6}", c.objective),
            used: c.metrics_used,
            dfs: c.counts.dfs,
            sfd: c.counts.sfd,
            control: c.counts.control,
        })
        .collect();
    let mut table = Table::new(candidate_rows);
    table.with(TableStyle::rounded());
    println!("{}", table);
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "nan%".to_string(),
    }
}

/// Hit-rate counts
pub fn print_hit_rate(result: &HitRate) {
    let t = result.thresholds;
    println!("{}", "🎯 Hit rate".bright_blue().bold());
    println!(
        "   Thresholds: X_LO={:.2}, X_HI={:.2}, Y_LO={:.2}, Y_HI={:.2}",
        t.x_lo, t.x_hi, t.y_lo, t.y_hi
    );
    println!(
        "   Totals: MUT={}  OPT={}  (rows {})",
        result.total_mutations, result.total_optimizations, result.rows
    );
    println!(
        "   MUT in SFD : {}  ({} of MUT)",
        result.mutations_in_sfd,
        fmt_pct(result.mutation_pct())
    );
    println!(
        "   OPT in DFS : {}  ({} of OPT)",
        result.optimizations_in_dfs,
        fmt_pct(result.optimization_pct())
    );
}

/// MAE summary
pub fn print_mae(summary: &MaeSummary) {
    println!("{}", "📏 Mean absolute error".bright_blue().bold());
    println!("   MAE:     {}", fmt_opt(summary.mae));
    println!("   Used:    {}", summary.used);
    println!("   Skipped: {}", summary.skipped);
}

use crate::models::{CriterionSummary, ResultRow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print the reduced table and its grouped statistics
pub fn print_results(rows: &[ResultRow], summary: &[CriterionSummary], format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_plain(rows, summary),
        OutputFormat::Json => print_json(rows, summary),
    }
}

/// Per-model blocks followed by the aligned summary table
fn print_plain(rows: &[ResultRow], summary: &[CriterionSummary]) {
    for s in summary {
        println!("model:  {}", s.model);
        println!("metric: {}", s.metric);
        println!("{}", "-".repeat(20));
        println!("len:    {}", s.count);
        println!("mean:   {:.3}", s.mean);
        println!("std:    {:.3}", s.std);
        println!("{}", "=".repeat(60));
    }
    println!();

    if summary.is_empty() {
        println!("No judgments collected.");
        return;
    }

    println!(
        "{:<20} {:<10} {:<8} {:<8} {:<8} {:<8}",
        "Model", "Metric", "Count", "Mean", "Std", "CI90"
    );
    println!("{}", "-".repeat(66));
    for s in summary {
        println!(
            "{:<20} {:<10} {:<8} {:<8.3} {:<8.3} {:<8.3}",
            s.model, s.metric, s.count, s.mean, s.std, s.ci_90
        );
    }

    let judged_words: usize = rows.iter().map(|r| r.candidate_words).sum();
    println!();
    println!("{} judgments, {} candidate words judged", rows.len(), judged_words);
}

#[derive(Serialize)]
struct Report<'a> {
    rows: &'a [ResultRow],
    summary: &'a [CriterionSummary],
}

/// Print rows and summaries as one JSON document
fn print_json(rows: &[ResultRow], summary: &[CriterionSummary]) {
    let report = Report { rows, summary };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results to JSON: {}", e),
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Report generation commands
//!
//! Commands: generate

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use aegis_orchestrator_core::application::orchestrator::Report;

use crate::daemon::{check_daemon_running, DaemonClient, DaemonStatus};

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Assemble the findings/violations report for the current run
    Generate {
        /// Output format: json, markdown, html, or csv
        #[arg(long, default_value = "json")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn handle_command(command: ReportCommand, host: &str, port: u16) -> Result<()> {
    match check_daemon_running(host, port).await {
        Ok(DaemonStatus::Running { .. }) => {}
        _ => {
            println!("{}", "Report generation requires the daemon to be running.".red());
            println!("Run 'aegis daemon start' first.");
            return Ok(());
        }
    }

    let ReportCommand::Generate { format, output } = command;

    let client = DaemonClient::new(host, port);
    let report = client.generate_report(&format).await?;
    let rendered = render(&report, &format);

    match output {
        Some(path) => {
            std::fs::write(&path, rendered).with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("{}", format!("\u{2713} Report written: {}", path.display()).green());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn render(report: &Report, format: &str) -> String {
    match format {
        "markdown" | "md" => render_markdown(report),
        "csv" => render_csv(report),
        "html" => render_html(report),
        _ => serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string()),
    }
}

fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("# AEGIS Assessment Report\n\n");
    out.push_str(&format!("- Assets: {}\n", report.summary.asset_count));
    out.push_str(&format!("- Scan steps: {}\n", report.summary.result_count));
    out.push_str(&format!("- Findings: {}\n", report.summary.finding_count));
    out.push_str(&format!("- Policy violations: {}\n", report.summary.violation_count));
    if let Some(duration) = report.summary.duration_secs {
        out.push_str(&format!("- Duration: {duration:.1}s\n"));
    }
    out.push_str("\n## Findings\n\n");
    for finding in &report.findings {
        out.push_str(&format!(
            "- **{}** ({:?}) on {}: {}\n",
            finding.title, finding.severity, finding.asset_ref, finding.description
        ));
    }
    out.push_str("\n## Policy violations\n\n");
    for violation in &report.violations {
        out.push_str(&format!("- {:?}: {}\n", violation.violation_type, violation.details));
    }
    out
}

fn render_csv(report: &Report) -> String {
    let mut out = String::from("asset_ref,severity,title\n");
    for finding in &report.findings {
        out.push_str(&format!(
            "{},{:?},\"{}\"\n",
            finding.asset_ref,
            finding.severity,
            finding.title.replace('"', "\"\"")
        ));
    }
    out
}

fn render_html(report: &Report) -> String {
    let mut out = String::from("<html><body><h1>AEGIS Assessment Report</h1><ul>");
    out.push_str(&format!("<li>Assets: {}</li>", report.summary.asset_count));
    out.push_str(&format!("<li>Scan steps: {}</li>", report.summary.result_count));
    out.push_str(&format!("<li>Findings: {}</li>", report.summary.finding_count));
    out.push_str(&format!("<li>Policy violations: {}</li>", report.summary.violation_count));
    out.push_str("</ul><h2>Findings</h2><ul>");
    for finding in &report.findings {
        out.push_str(&format!(
            "<li><b>{}</b> ({:?}) on {}: {}</li>",
            finding.title, finding.severity, finding.asset_ref, finding.description
        ));
    }
    out.push_str("</ul></body></html>");
    out
}

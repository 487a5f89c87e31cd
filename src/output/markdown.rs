//! Markdown report generation
//!
//! A human-readable report of one lead batch: run information, totals and a
//! per-business table.

use crate::output::traits::{LeadSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the Markdown report for `summary` to `output_path`
pub fn generate_markdown_report(summary: &LeadSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a lead batch summary as Markdown
pub fn format_markdown_report(summary: &LeadSummary) -> String {
    let mut md = String::new();

    md.push_str("# Lead Harvest Report\n\n");

    md.push_str("## Run Information\n\n");
    if let Some(run_id) = summary.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!("- **Query**: {}\n", summary.query));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n\n", summary.status));

    md.push_str("## Totals\n\n");
    md.push_str(&format!("- **Businesses**: {}\n", summary.total_businesses));
    md.push_str(&format!(
        "- **With Emails**: {} ({:.2}%)\n",
        summary.with_emails,
        summary.hit_rate()
    ));
    md.push_str(&format!("- **Unique Emails**: {}\n", summary.total_emails));
    md.push_str(&format!("- **No Website**: {}\n", summary.without_website));
    md.push_str(&format!("- **Refused**: {}\n", summary.refused));
    md.push_str(&format!("- **Timed Out**: {}\n\n", summary.timed_out));

    if !summary.leads.is_empty() {
        md.push_str("## Leads\n\n");
        md.push_str("| Business | Website | Phone | Emails | Scrape Error |\n");
        md.push_str("|----------|---------|-------|--------|--------------|\n");
        for lead in &summary.leads {
            let phone = if lead.place.national_phone.is_empty() {
                &lead.place.international_phone
            } else {
                &lead.place.national_phone
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                escape_cell(&lead.place.name),
                escape_cell(&lead.place.website_url),
                escape_cell(phone),
                escape_cell(&lead.emails.join(", ")),
                escape_cell(lead.scrape_error.as_deref().unwrap_or("")),
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by Lead Harvester*\n");

    md
}

/// Keeps table cells on one line and their pipes literal
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ")
}

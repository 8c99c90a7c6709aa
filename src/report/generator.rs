//! Report rendering.
//!
//! This module renders the aggregated report as a MediaWiki table, a
//! Markdown table or a JSON document.

use crate::cli::OutputFormat;
use crate::models::{CategoryCounts, DatasetKind, GroupCounts, Report};
use anyhow::Result;

/// Columns shown for every dataset, in order.
const CATEGORY_HEADINGS: [&str; 4] = ["Male", "Female", "Unknown", "Total"];

/// Render the report in the requested format.
pub fn render(report: &Report, format: OutputFormat, caption: &str) -> Result<String> {
    match format {
        OutputFormat::Wikitext => Ok(generate_wikitext_report(report, caption)),
        OutputFormat::Markdown => Ok(generate_markdown_report(report, caption)),
        OutputFormat::Json => generate_json_report(report),
    }
}

fn category_values(counts: &CategoryCounts) -> [usize; 4] {
    [counts.male, counts.female, counts.unknown, counts.total]
}

fn row_values(counts: &GroupCounts) -> impl Iterator<Item = usize> + '_ {
    DatasetKind::ALL
        .into_iter()
        .flat_map(move |kind| category_values(counts.get(kind)))
}

/// Generate a MediaWiki `wikitable`.
pub fn generate_wikitext_report(report: &Report, caption: &str) -> String {
    let mut output = String::new();

    output.push_str("{| class=\"wikitable sortable\" style=\"text-align:right\"\n");
    output.push_str(&format!(
        "|+ {} (as of {})\n",
        caption, report.last_updated_label
    ));

    // Dataset header row
    output.push_str("|-\n");
    output.push_str("! rowspan=\"2\" | Age\n");
    for kind in DatasetKind::ALL {
        output.push_str(&format!(
            "! colspan=\"{}\" | {}\n",
            CATEGORY_HEADINGS.len(),
            kind.heading()
        ));
    }

    // Category header row
    output.push_str("|-\n");
    for _ in DatasetKind::ALL {
        for heading in CATEGORY_HEADINGS {
            output.push_str(&format!("! {}\n", heading));
        }
    }

    for group in &report.age_groups {
        output.push_str("|-\n");
        output.push_str(&format!("! {}\n", group.age_range));
        let cells: Vec<String> = row_values(&group.counts).map(|v| v.to_string()).collect();
        output.push_str(&format!("| {}\n", cells.join(" || ")));
    }

    output.push_str("|- class=\"sortbottom\"\n");
    output.push_str("! Total\n");
    let cells: Vec<String> = row_values(&report.total)
        .map(|v| format!("'''{}'''", v))
        .collect();
    output.push_str(&format!("| {}\n", cells.join(" || ")));

    output.push_str("|}\n");

    output
}

/// Generate a Markdown table with a heading and timestamp.
pub fn generate_markdown_report(report: &Report, caption: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", caption));
    output.push_str(&format!(
        "- **Last Updated:** {}\n\n",
        report.last_updated_label
    ));

    // Header
    let mut header = vec!["Age".to_string()];
    for kind in DatasetKind::ALL {
        for heading in CATEGORY_HEADINGS {
            header.push(format!("{} {}", kind.heading(), heading));
        }
    }
    output.push_str(&format!("| {} |\n", header.join(" | ")));
    output.push_str(&format!(
        "|:---|{}\n",
        ":---:|".repeat(header.len() - 1)
    ));

    for group in &report.age_groups {
        let cells: Vec<String> = row_values(&group.counts).map(|v| v.to_string()).collect();
        output.push_str(&format!(
            "| {} | {} |\n",
            group.age_range,
            cells.join(" | ")
        ));
    }

    let cells: Vec<String> = row_values(&report.total)
        .map(|v| format!("**{}**", v))
        .collect();
    output.push_str(&format!("| **Total** | {} |\n", cells.join(" | ")));
    output.push('\n');

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgeGroupSummary;
    use chrono::DateTime;

    fn create_test_report() -> Report {
        let young = GroupCounts {
            cases: CategoryCounts::new(1, 0, 1),
            recovered: CategoryCounts::new(0, 0, 0),
            deaths: CategoryCounts::new(0, 0, 0),
        };
        let old = GroupCounts {
            cases: CategoryCounts::new(3, 4, 0),
            recovered: CategoryCounts::new(2, 2, 0),
            deaths: CategoryCounts::new(1, 0, 0),
        };

        Report {
            last_updated: DateTime::parse_from_rfc3339("2020-10-19T08:00:00+02:00").unwrap(),
            last_updated_label: "19 October 2020".to_string(),
            age_groups: vec![
                AgeGroupSummary {
                    age_range: "0 - 14".to_string(),
                    counts: young,
                },
                AgeGroupSummary {
                    age_range: "85+".to_string(),
                    counts: old,
                },
            ],
            total: young + old,
        }
    }

    #[test]
    fn test_generate_wikitext_report() {
        let wikitext = generate_wikitext_report(&create_test_report(), "Stats");

        assert!(wikitext.starts_with("{| class=\"wikitable"));
        assert!(wikitext.contains("|+ Stats (as of 19 October 2020)"));
        assert!(wikitext.contains("! colspan=\"4\" | Recovered"));
        assert!(wikitext.contains("! 85+\n| 3 || 4 || 0 || 7 || 2 || 2 || 0 || 4 || 1 || 0 || 0 || 1\n"));
        assert!(wikitext.contains("'''9'''"));
        assert!(wikitext.trim_end().ends_with("|}"));
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report(), "Stats");

        assert!(markdown.contains("# Stats"));
        assert!(markdown.contains("19 October 2020"));
        assert!(markdown.contains("| Age | Cases Male |"));
        assert!(markdown.contains("| 0 - 14 | 1 | 0 | 1 | 2 | 0 | 0 | 0 | 0 | 0 | 0 | 0 | 0 |"));
        assert!(markdown.contains("| **Total** | **4** |"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["age_groups"][1]["age_range"], "85+");
        assert_eq!(value["age_groups"][1]["cases"]["total"], 7);
        assert_eq!(value["total"]["deaths"]["male"], 1);
        assert_eq!(value["last_updated_label"], "19 October 2020");
    }

    #[test]
    fn test_render_dispatch() {
        let report = create_test_report();
        assert!(render(&report, OutputFormat::Json, "Stats")
            .unwrap()
            .starts_with('{'));
        assert!(render(&report, OutputFormat::Wikitext, "Stats")
            .unwrap()
            .starts_with("{|"));
    }
}

//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use rivalscope_domain::{GapMode, KeywordRecord, Target};
use rivalscope_engine::{failure_messages, BacklinkReport, GapReport, MultiGapReport, Outcome};
use rivalscope_provider::ProviderError;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a backlink intersection or opportunity report.
    pub fn format_backlinks(&self, report: &BacklinkReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = report
                    .results
                    .iter()
                    .map(|r| {
                        let per_target: serde_json::Map<String, serde_json::Value> = r
                            .per_target
                            .iter()
                            .map(|(target, links)| {
                                (
                                    target.to_string(),
                                    serde_json::json!({
                                        "backlinks": links.backlinks,
                                        "referring_pages": links.referring_pages
                                    }),
                                )
                            })
                            .collect();
                        serde_json::json!({
                            "referring_domain": r.referring_domain,
                            "coverage_count": r.coverage_count,
                            "targets_hit": r.targets_hit.iter().map(Target::as_str).collect::<Vec<_>>(),
                            "total_backlinks": r.total_backlinks,
                            "total_referring_pages": r.total_referring_pages,
                            "rank": r.rank,
                            "per_target": per_target
                        })
                    })
                    .collect();

                let json = serde_json::json!({
                    "targets": report.targets.iter().map(Target::as_str).collect::<Vec<_>>(),
                    "own_site": report.own_site.as_ref().map(Target::as_str),
                    "outcome": report.outcome.as_str(),
                    "results": rows,
                    "failed_targets": failure_messages(&report.failed_targets)
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if report.results.is_empty() {
                    return Ok(self.with_failures(
                        self.colorize("No referring domains found.", "yellow"),
                        &report.failed_targets,
                        report.outcome,
                    ));
                }

                let mut builder = Builder::default();
                builder.push_record(["Referring Domain", "Coverage", "Links To", "Backlinks", "Pages", "Rank"]);
                for r in &report.results {
                    let linked = r.targets_hit.iter().map(Target::as_str).collect::<Vec<_>>().join(", ");
                    builder.push_record([
                        r.referring_domain.clone(),
                        format!("{}/{}", r.coverage_count, report.targets.len()),
                        linked,
                        r.total_backlinks.to_string(),
                        r.total_referring_pages.to_string(),
                        r.rank.to_string(),
                    ]);
                }

                Ok(self.with_failures(self.render(builder), &report.failed_targets, report.outcome))
            }
        }
    }

    /// Format a two-domain gap or common report.
    pub fn format_gap(&self, report: &GapReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = report
                    .results
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "keyword": r.keyword,
                            "volume": r.volume,
                            "cpc": r.cpc,
                            "difficulty": r.difficulty,
                            "competition_level": r.competition_level.as_str(),
                            "reference_position": r.reference_position,
                            "comparison_position": r.comparison_position,
                            "rank_delta": r.rank_delta()
                        })
                    })
                    .collect();

                let json = serde_json::json!({
                    "reference": report.reference.as_str(),
                    "competitor": report.competitor.as_str(),
                    "mode": report.mode.as_str(),
                    "outcome": report.outcome.as_str(),
                    "results": rows,
                    "failed_targets": failure_messages(&report.failed_targets)
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if report.results.is_empty() {
                    return Ok(self.with_failures(
                        self.colorize("No keywords found.", "yellow"),
                        &report.failed_targets,
                        report.outcome,
                    ));
                }

                let mut builder = Builder::default();
                match report.mode {
                    GapMode::Gap => {
                        builder.push_record(["Keyword", "Volume", "CPC", "Difficulty", "Competition", "Their Pos"])
                    }
                    GapMode::Common => builder.push_record([
                        "Keyword",
                        "Volume",
                        "CPC",
                        "Difficulty",
                        "Competition",
                        "Your Pos",
                        "Their Pos",
                        "Delta",
                    ]),
                }

                for r in &report.results {
                    let mut row = vec![
                        r.keyword.clone(),
                        r.volume.to_string(),
                        format!("{:.2}", r.cpc),
                        format_difficulty(r.difficulty),
                        r.competition_level.as_str().to_string(),
                    ];
                    if report.mode == GapMode::Common {
                        row.push(format_position(r.reference_position));
                    }
                    row.push(format_position(r.comparison_position));
                    if report.mode == GapMode::Common {
                        row.push(self.format_delta(r.rank_delta()));
                    }
                    builder.push_record(row);
                }

                Ok(self.with_failures(self.render(builder), &report.failed_targets, report.outcome))
            }
        }
    }

    /// Format a multi-competitor gap report.
    pub fn format_multi_gap(&self, report: &MultiGapReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = report
                    .results
                    .iter()
                    .map(|r| {
                        let positions: serde_json::Map<String, serde_json::Value> = r
                            .competitors
                            .iter()
                            .map(|(target, position)| (target.to_string(), serde_json::json!(position)))
                            .collect();
                        serde_json::json!({
                            "keyword": r.keyword,
                            "competitor_count": r.competitor_count,
                            "volume": r.volume,
                            "cpc": r.cpc,
                            "positions": positions
                        })
                    })
                    .collect();

                let json = serde_json::json!({
                    "reference": report.reference.as_str(),
                    "competitors": report.competitors.iter().map(Target::as_str).collect::<Vec<_>>(),
                    "outcome": report.outcome.as_str(),
                    "results": rows,
                    "failed_targets": failure_messages(&report.failed_targets)
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if report.results.is_empty() {
                    return Ok(self.with_failures(
                        self.colorize("No shared gap keywords found.", "yellow"),
                        &report.failed_targets,
                        report.outcome,
                    ));
                }

                let mut builder = Builder::default();
                builder.push_record(["Keyword", "Competitors", "Volume", "CPC", "Positions"]);
                for r in &report.results {
                    let positions = r
                        .competitors
                        .iter()
                        .map(|(target, position)| format!("{} #{}", target, format_position(*position)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    builder.push_record([
                        r.keyword.clone(),
                        format!("{}/{}", r.competitor_count, report.competitors.len()),
                        r.volume.to_string(),
                        format!("{:.2}", r.cpc),
                        positions,
                    ]);
                }

                Ok(self.with_failures(self.render(builder), &report.failed_targets, report.outcome))
            }
        }
    }

    /// Format related keywords.
    pub fn format_keywords(&self, records: &[KeywordRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = records
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "keyword": r.keyword,
                            "search_volume": r.search_volume,
                            "cpc": r.cpc,
                            "competition_level": r.competition_level.as_str(),
                            "difficulty": r.difficulty,
                            "depth": r.depth,
                            "serp_features": r.serp_features,
                            "related_keywords": r.related_keywords
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&rows)?)
            }
            OutputFormat::Table => {
                if records.is_empty() {
                    return Ok(self.colorize("No related keywords found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Keyword", "Volume", "CPC", "Difficulty", "Competition", "Depth"]);
                for r in records {
                    builder.push_record([
                        r.keyword.clone(),
                        r.search_volume.to_string(),
                        format!("{:.2}", r.cpc),
                        format_difficulty(r.difficulty),
                        r.competition_level.as_str().to_string(),
                        r.depth.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Append one warning line per failed target below the table.
    fn with_failures(&self, body: String, failed: &BTreeMap<Target, ProviderError>, outcome: Outcome) -> String {
        if failed.is_empty() {
            return body;
        }

        let mut lines = vec![body];
        if outcome == Outcome::AllFailed {
            lines.push(self.warning("Every target fetch failed"));
        }
        for (target, error) in failed {
            lines.push(self.warning(&format!("{}: {}", target, error)));
        }
        lines.join("\n")
    }

    fn format_delta(&self, delta: Option<f64>) -> String {
        match delta {
            None => "-".to_string(),
            Some(d) if d > 0.0 => self.colorize(&format!("+{}", trim_float(d)), "red"),
            Some(d) if d < 0.0 => self.colorize(&trim_float(d), "green"),
            Some(_) => "0".to_string(),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Format a ranking position, `-` when unranked.
pub fn format_position(position: Option<f64>) -> String {
    position.map(trim_float).unwrap_or_else(|| "-".to_string())
}

fn format_difficulty(difficulty: Option<u8>) -> String {
    difficulty.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

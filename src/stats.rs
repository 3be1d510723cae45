//! Learning statistics view.
//!
//! One `GET /stats` per load, projected into three summary cells and two
//! ranked tables. Nothing is retried and the source data is never mutated.
//! On failure every cell reads [`ERROR_TEXT`].

use std::fmt;

use colored::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::ApiClient;

pub const ERROR_TEXT: &str = "Error loading data";
pub const NO_DATA_TEXT: &str = "No data available";
pub const NONE_TEXT: &str = "None";

/// Summary cell limit for the most common query.
pub const MOST_COMMON_MAX_CHARS: usize = 20;
/// Table cell limit for a used query.
pub const QUERY_MAX_CHARS: usize = 40;

// -- Wire types ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTypeStat {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedQuery {
    pub query: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub total_qa_pairs: u64,
    #[serde(default)]
    pub query_types: Vec<QueryTypeStat>,
    #[serde(default)]
    pub most_used_queries: Vec<UsedQuery>,
}

// -- Helpers ------------------------------------------------------------------

/// Cut `text` to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Turn a category key such as `query_type` or `webSearch` into a label.
pub fn humanize_type(kind: &str) -> String {
    let mut spaced = String::with_capacity(kind.len() + 4);
    for c in kind.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
            spaced.push(c);
        } else if c == '_' {
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Share of `count` in `total` as a percentage rounded to one decimal.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

// -- View ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRow {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRow {
    pub query: String,
    pub count: u64,
}

/// Contents of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows<T> {
    Data(Vec<T>),
    /// Source collection was empty; renders a single "no data" row.
    NoData,
    /// Load failed; renders a single error row.
    Error,
}

impl<T> Rows<T> {
    fn from_vec(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Rows::NoData
        } else {
            Rows::Data(rows)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub total_qa_pairs: String,
    pub category_count: String,
    pub most_common_query: String,
    pub query_types: Rows<TypeRow>,
    pub most_used: Rows<QueryRow>,
}

impl StatsView {
    /// Fetch `/stats` once and project the result.
    pub async fn load(client: &ApiClient) -> Self {
        match client.stats().await {
            Ok(stats) => {
                info!(
                    total = stats.total_qa_pairs,
                    categories = stats.query_types.len(),
                    "stats loaded"
                );
                Self::from_response(&stats)
            }
            Err(err) => {
                warn!(error = %err, "stats load failed");
                Self::failed()
            }
        }
    }

    pub fn failed() -> Self {
        Self {
            total_qa_pairs: ERROR_TEXT.to_string(),
            category_count: ERROR_TEXT.to_string(),
            most_common_query: ERROR_TEXT.to_string(),
            query_types: Rows::Error,
            most_used: Rows::Error,
        }
    }

    pub fn from_response(stats: &StatsResponse) -> Self {
        let total: u64 = stats.query_types.iter().map(|t| t.count).sum();
        let mut sorted: Vec<&QueryTypeStat> = stats.query_types.iter().collect();
        // Stable: equal counts keep their received order.
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        let type_rows = sorted
            .into_iter()
            .map(|t| TypeRow {
                label: humanize_type(&t.kind),
                count: t.count,
                percentage: percentage(t.count, total),
            })
            .collect();

        let query_rows = stats
            .most_used_queries
            .iter()
            .map(|q| QueryRow {
                query: truncate(&q.query, QUERY_MAX_CHARS),
                count: q.count,
            })
            .collect();

        let most_common_query = stats
            .most_used_queries
            .first()
            .map(|q| truncate(&q.query, MOST_COMMON_MAX_CHARS))
            .unwrap_or_else(|| NONE_TEXT.to_string());

        Self {
            total_qa_pairs: stats.total_qa_pairs.to_string(),
            category_count: stats.query_types.len().to_string(),
            most_common_query,
            query_types: Rows::from_vec(type_rows),
            most_used: Rows::from_vec(query_rows),
        }
    }
}

fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

impl fmt::Display for StatsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "Learning statistics".bold().bright_cyan())?;
        writeln!(f, "  {:<22} {}", "Total Q&A pairs:".dimmed(), self.total_qa_pairs)?;
        writeln!(f, "  {:<22} {}", "Query categories:".dimmed(), self.category_count)?;
        writeln!(f, "  {:<22} {}", "Most common query:".dimmed(), self.most_common_query)?;

        writeln!(f)?;
        writeln!(f, "{}", "Query types".bold())?;
        match &self.query_types {
            Rows::Data(rows) => {
                for row in rows {
                    writeln!(
                        f,
                        "  {:<20} {:>6}  {} {:>5.1}%",
                        row.label,
                        row.count,
                        bar(row.percentage, 20).bright_blue(),
                        row.percentage
                    )?;
                }
            }
            Rows::NoData => writeln!(f, "  {}", NO_DATA_TEXT.dimmed())?,
            Rows::Error => writeln!(f, "  {}", ERROR_TEXT.bright_red())?,
        }

        writeln!(f)?;
        writeln!(f, "{}", "Most used queries".bold())?;
        match &self.most_used {
            Rows::Data(rows) => {
                for row in rows {
                    writeln!(f, "  {:<44} {:>6}", row.query, row.count)?;
                }
            }
            Rows::NoData => writeln!(f, "  {}", NO_DATA_TEXT.dimmed())?,
            Rows::Error => writeln!(f, "  {}", ERROR_TEXT.bright_red())?,
        }
        Ok(())
    }
}

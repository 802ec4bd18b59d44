//! Typed per-section view-model shapes.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which assembly strategy a section uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Stats,
    ChartList,
    ActivityList,
    TableRows,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Stats => "stats",
            SectionKind::ChartList => "chart_list",
            SectionKind::ActivityList => "activity_list",
            SectionKind::TableRows => "table_rows",
        }
    }
}

/// Chart kinds the visualization engine exposes entry points for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Doughnut,
}

impl ChartKind {
    /// Parse a chart kind case-insensitively; unknown or missing kinds
    /// default to `Bar`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "line" => ChartKind::Line,
            "pie" => ChartKind::Pie,
            "doughnut" | "donut" => ChartKind::Doughnut,
            _ => ChartKind::Bar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
        }
    }
}

/// One dataset within a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub values: Vec<f64>,
    pub color: Option<String>,
}

/// Canonical chart description, independent of any charting library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<ChartDataset>,
}

impl ChartSeries {
    /// The structural invariant: every dataset's value count matches the
    /// label count.
    pub fn is_valid(&self) -> bool {
        self.series
            .iter()
            .all(|dataset| dataset.values.len() == self.labels.len())
    }
}

/// Stat-card values keyed by canonical field name; always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct StatsViewModel {
    pub values: FxHashMap<String, f64>,
}

impl StatsViewModel {
    pub fn get(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }
}

/// One entry of an activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub title: String,
    pub detail: String,
    pub timestamp: Option<String>,
}

/// Row-oriented table data with a stable column order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct TableViewModel {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// The assembled view-model for one dashboard section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum SectionViewModel {
    Stats(StatsViewModel),
    Charts(Vec<ChartSeries>),
    Activities(Vec<ActivityItem>),
    Table(TableViewModel),
}

impl SectionViewModel {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionViewModel::Stats(_) => SectionKind::Stats,
            SectionViewModel::Charts(_) => SectionKind::ChartList,
            SectionViewModel::Activities(_) => SectionKind::ActivityList,
            SectionViewModel::Table(_) => SectionKind::TableRows,
        }
    }

    pub fn as_stats(&self) -> Option<&StatsViewModel> {
        match self {
            SectionViewModel::Stats(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn as_charts(&self) -> Option<&[ChartSeries]> {
        match self {
            SectionViewModel::Charts(charts) => Some(charts),
            _ => None,
        }
    }
}

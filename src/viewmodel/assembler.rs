//! Maps normalized records into typed per-section view-models.
//!
//! Assembly never fails: missing fields fall back to typed defaults,
//! numeric coercion collapses garbage to 0, and chart datasets violating
//! the label/value length invariant are dropped rather than propagated.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::aliases::{resolve, resolve_first};
use crate::envelope::normalizer::lossy_f64;
use crate::envelope::NormalizedRecord;

use super::structs::{
    ActivityItem, ChartDataset, ChartKind, ChartSeries, SectionKind, SectionViewModel,
    StatsViewModel, TableViewModel,
};

/// Assemble the view-model for one section kind from a normalized record.
pub fn assemble(record: &NormalizedRecord, kind: SectionKind) -> SectionViewModel {
    match kind {
        SectionKind::Stats => SectionViewModel::Stats(assemble_stats(record)),
        SectionKind::ChartList => SectionViewModel::Charts(assemble_charts(record)),
        SectionKind::ActivityList => SectionViewModel::Activities(assemble_activities(record)),
        SectionKind::TableRows => SectionViewModel::Table(assemble_table(record)),
    }
}

fn assemble_stats(record: &NormalizedRecord) -> StatsViewModel {
    // A dedicated stats/summary sub-object wins; otherwise every scalar
    // field of the record is a stat card.
    let source: &Map<String, Value> = record
        .map("stats")
        .or_else(|| record.map("summary"))
        .unwrap_or_else(|| record.fields());

    let mut values = FxHashMap::default();
    for (key, value) in source {
        match value {
            Value::Array(_) | Value::Object(_) | Value::Null => {}
            scalar => {
                values.insert(key.clone(), lossy_f64(scalar));
            }
        }
    }
    StatsViewModel { values }
}

fn assemble_charts(record: &NormalizedRecord) -> Vec<ChartSeries> {
    let declared = record.list("charts");
    if !declared.is_empty() {
        return declared
            .iter()
            .filter_map(|item| item.as_object().and_then(chart_from_map))
            .collect();
    }

    // No chart list declared: the record itself may be a single chart
    // payload (scenario: one envelope per chart endpoint).
    chart_from_map(record.fields()).into_iter().collect()
}

/// Build one chart from a payload object, enforcing the length invariant.
/// Datasets that fail validation are dropped silently; a payload with
/// neither labels nor surviving datasets yields no chart at all.
fn chart_from_map(map: &Map<String, Value>) -> Option<ChartSeries> {
    let kind = resolve_first(map, &["type", "kind"])
        .and_then(Value::as_str)
        .map(ChartKind::parse)
        .unwrap_or_default();

    let labels: Vec<String> = match resolve(map, "labels") {
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        _ => Vec::new(),
    };

    let raw_datasets = match resolve_first(map, &["datasets", "series"]) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    let mut series = Vec::new();
    for raw in raw_datasets {
        let Some(dataset) = raw.as_object() else {
            continue;
        };
        let values: Vec<f64> = match resolve_first(dataset, &["data", "values"]) {
            Some(Value::Array(items)) => items.iter().map(lossy_f64).collect(),
            _ => Vec::new(),
        };
        if values.len() != labels.len() {
            debug!(
                expected = labels.len(),
                got = values.len(),
                "dropping chart dataset violating label/value length invariant"
            );
            continue;
        }
        series.push(ChartDataset {
            label: resolve_first(dataset, &["label", "name"])
                .map(value_text)
                .unwrap_or_default(),
            values,
            color: resolve_first(dataset, &["color", "backgroundColor"])
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }

    if labels.is_empty() && series.is_empty() {
        return None;
    }

    Some(ChartSeries {
        kind,
        labels,
        series,
    })
}

fn assemble_activities(record: &NormalizedRecord) -> Vec<ActivityItem> {
    let mut source = record.list("activities");
    if source.is_empty() {
        source = record.list("items");
    }

    source
        .iter()
        .filter_map(|item| {
            let map = item.as_object()?;
            Some(ActivityItem {
                title: resolve_first(map, &["title", "name"])
                    .map(value_text)
                    .unwrap_or_default(),
                detail: resolve_first(map, &["description", "detail", "message"])
                    .map(value_text)
                    .unwrap_or_default(),
                timestamp: resolve_first(map, &["timestamp", "createdAt", "date"])
                    .map(value_text)
                    .filter(|t| !t.is_empty()),
            })
        })
        .collect()
}

fn assemble_table(record: &NormalizedRecord) -> TableViewModel {
    let mut source = record.list("rows");
    if source.is_empty() {
        source = record.list("items");
    }

    // Explicit column order wins; otherwise columns are the union of row
    // keys in first-seen order.
    let mut columns: Vec<String> = match record.get("columns") {
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        _ => Vec::new(),
    };
    if columns.is_empty() {
        for row in source {
            if let Some(map) = row.as_object() {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }
    }

    let rows = source
        .iter()
        .filter_map(|row| {
            let map = row.as_object()?;
            Some(
                columns
                    .iter()
                    .map(|column| resolve(map, column).cloned().unwrap_or(Value::Null))
                    .collect::<Vec<Value>>(),
            )
        })
        .collect();

    TableViewModel { columns, rows }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::normalize;
    use serde_json::json;

    #[test]
    fn test_stats_from_data_wrapper() {
        let record = normalize(&json!({"success": true, "data": {"totalStudents": 42}}));
        let vm = assemble(&record, SectionKind::Stats);
        assert_eq!(vm.as_stats().unwrap().get("totalStudents"), 42.0);
    }

    #[test]
    fn test_stats_from_declared_sub_object() {
        let record = normalize(&json!({"data": {"stats": {"revenue": "310.5"}, "noise": [1]}}));
        let vm = assemble(&record, SectionKind::Stats);
        let stats = vm.as_stats().unwrap();
        assert_eq!(stats.get("revenue"), 310.5);
        assert_eq!(stats.get("noise"), 0.0);
    }

    #[test]
    fn test_stats_garbage_collapses_to_zero() {
        let record = normalize(&json!({"data": {"total": "n/a"}}));
        let vm = assemble(&record, SectionKind::Stats);
        assert_eq!(vm.as_stats().unwrap().get("total"), 0.0);
    }

    #[test]
    fn test_single_chart_payload() {
        let record = normalize(&json!({
            "type": "Bar",
            "labels": ["Jan", "Feb"],
            "datasets": [{"label": "Rev", "data": [10, 20]}]
        }));
        let vm = assemble(&record, SectionKind::ChartList);
        let charts = vm.as_charts().unwrap();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].kind, ChartKind::Bar);
        assert_eq!(charts[0].labels, vec!["Jan", "Feb"]);
        assert_eq!(charts[0].series[0].label, "Rev");
        assert_eq!(charts[0].series[0].values, vec![10.0, 20.0]);
    }

    #[test]
    fn test_invalid_dataset_dropped_silently() {
        let record = normalize(&json!({
            "labels": ["Jan", "Feb", "Mar"],
            "datasets": [
                {"label": "good", "data": [1, 2, 3]},
                {"label": "short", "data": [1, 2]}
            ]
        }));
        let vm = assemble(&record, SectionKind::ChartList);
        let charts = vm.as_charts().unwrap();
        assert_eq!(charts[0].series.len(), 1);
        assert_eq!(charts[0].series[0].label, "good");
        assert!(charts[0].is_valid());
    }

    #[test]
    fn test_chart_list_field() {
        let record = normalize(&json!({"data": {"charts": [
            {"kind": "pie", "labels": ["a"], "series": [{"name": "s", "values": ["3"]}]},
            {"labels": [], "datasets": []}
        ]}}));
        let vm = assemble(&record, SectionKind::ChartList);
        let charts = vm.as_charts().unwrap();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].kind, ChartKind::Pie);
        assert_eq!(charts[0].series[0].values, vec![3.0]);
    }

    #[test]
    fn test_unknown_chart_kind_defaults_to_bar() {
        let record = normalize(&json!({"labels": ["x"], "datasets": [{"data": [1]}]}));
        let vm = assemble(&record, SectionKind::ChartList);
        assert_eq!(vm.as_charts().unwrap()[0].kind, ChartKind::Bar);
    }

    #[test]
    fn test_activities_alias_fields() {
        let record = normalize(&json!({"data": {"Activities": [
            {"Title": "Enrolled", "Description": "new student", "CreatedAt": "2024-01-01"},
            "not-an-object",
            {"name": "Paid", "message": "invoice 9"}
        ]}}));
        let vm = assemble(&record, SectionKind::ActivityList);
        match vm {
            SectionViewModel::Activities(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].title, "Enrolled");
                assert_eq!(items[0].timestamp.as_deref(), Some("2024-01-01"));
                assert_eq!(items[1].title, "Paid");
                assert_eq!(items[1].detail, "invoice 9");
            }
            other => panic!("expected activities, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_lists_are_empty_not_null() {
        let record = normalize(&json!({"data": {}}));
        match assemble(&record, SectionKind::ActivityList) {
            SectionViewModel::Activities(items) => assert!(items.is_empty()),
            other => panic!("expected activities, got {:?}", other),
        }
        match assemble(&record, SectionKind::ChartList) {
            SectionViewModel::Charts(charts) => assert!(charts.is_empty()),
            other => panic!("expected charts, got {:?}", other),
        }
    }

    #[test]
    fn test_table_column_union_and_row_shape() {
        let record = normalize(&json!({"data": {"rows": [
            {"name": "Ana", "amount": 10},
            {"name": "Bo", "dueDate": "2024-02-01"}
        ]}}));
        let vm = assemble(&record, SectionKind::TableRows);
        match vm {
            SectionViewModel::Table(table) => {
                assert_eq!(table.columns, vec!["amount", "name", "dueDate"]);
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[0][1], json!("Ana"));
                assert_eq!(table.rows[1][0], Value::Null);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_table_explicit_columns() {
        let record = normalize(&json!({"data": {
            "columns": ["name"],
            "rows": [{"name": "Ana", "amount": 10}]
        }}));
        match assemble(&record, SectionKind::TableRows) {
            SectionViewModel::Table(table) => {
                assert_eq!(table.columns, vec!["name"]);
                assert_eq!(table.rows[0], vec![json!("Ana")]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }
}

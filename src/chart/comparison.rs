//! Cross-company aggregation for the comparison dashboard. Metrics are
//! matched by chart title, since each company may store the same figure
//! under a different data key.

use std::collections::{BTreeSet, HashSet};

use super::series::latest_year;
use crate::model::numeric::parse_leading_int;
use crate::model::Company;

pub const PREFERRED_METRIC: &str = "EBITDA";

/// Sorted, de-duplicated chart titles across all companies.
pub fn available_metrics(companies: &[Company]) -> Vec<String> {
    companies
        .iter()
        .flat_map(|c| c.charts.iter().map(|chart| chart.title.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn default_metric(companies: &[Company]) -> Option<String> {
    let metrics = available_metrics(companies);
    if metrics.iter().any(|m| m == PREFERRED_METRIC) {
        return Some(PREFERRED_METRIC.to_string());
    }
    metrics.into_iter().next()
}

/// One year of the trend chart: the value per company id, in the order the
/// companies were given. Companies lacking that year are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub year: String,
    pub values: Vec<(String, f64)>,
}

pub fn trend_rows(companies: &[Company], metric: &str, selected: &HashSet<String>) -> Vec<TrendRow> {
    let participating: Vec<(&Company, &str)> = companies
        .iter()
        .filter(|c| selected.contains(&c.id))
        .filter_map(|c| c.chart_by_title(metric).map(|chart| (c, chart.data_key.as_str())))
        .collect();

    let mut years: Vec<&str> = participating
        .iter()
        .flat_map(|(c, _)| c.production_data.iter().map(|y| y.year.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    years.sort_by_key(|y| parse_leading_int(y).unwrap_or(i64::MAX));

    years
        .into_iter()
        .map(|year| TrendRow {
            year: year.to_string(),
            values: participating
                .iter()
                .filter_map(|(c, key)| {
                    c.production_data
                        .iter()
                        .find(|y| y.year == year)
                        .and_then(|y| y.metric(key))
                        .map(|v| (c.id.clone(), v))
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestValue {
    pub company: String,
    pub year: String,
    pub value: f64,
}

/// Each selected company's most recent figure, highest first.
pub fn latest_snapshot(companies: &[Company], metric: &str, selected: &HashSet<String>) -> Vec<LatestValue> {
    let mut rows: Vec<LatestValue> = companies
        .iter()
        .filter(|c| selected.contains(&c.id))
        .filter_map(|c| {
            let chart = c.chart_by_title(metric)?;
            let latest = latest_year(&c.production_data)?;
            let value = latest.metric(&chart.data_key)?;
            Some(LatestValue {
                company: c.name.clone(),
                year: latest.year.clone(),
                value,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows
}

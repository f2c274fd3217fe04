use std::cmp::Reverse;

use crate::model::numeric::{format_number, parse_leading_int};
use crate::model::{ChartConfig, ProductionYear};

/// One bar of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
    /// `"12 (+20%)"`. Absent for the first point and whenever the previous
    /// value is zero.
    pub annotation: Option<String>,
}

impl ChartPoint {
    /// Text drawn above the bar.
    pub fn label(&self) -> String {
        self.annotation.clone().unwrap_or_else(|| format_number(self.y))
    }
}

/// Maps year records onto the metric a chart plots. Records are taken in
/// the order given. A year without the metric charts as 0.
pub fn chart_series(data: &[ProductionYear], chart: &ChartConfig) -> Vec<ChartPoint> {
    let values: Vec<f64> = data
        .iter()
        .map(|year| year.metric(&chart.data_key).unwrap_or(0.0))
        .collect();

    data.iter()
        .zip(&values)
        .enumerate()
        .map(|(i, (year, &value))| {
            let annotation = i
                .checked_sub(1)
                .and_then(|prev| percent_change(values[prev], value))
                .map(|change| format!("{} ({}%)", format_number(value), format_change(change)));
            ChartPoint {
                x: year.year.clone(),
                y: value,
                annotation,
            }
        })
        .collect()
}

/// Relative change in percent, or `None` when the base is zero.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

/// One decimal, trailing `.0` dropped, `+` on anything that rounds to zero
/// or above.
pub fn format_change(change: f64) -> String {
    let mut text = format!("{:.1}", change);
    if text == "-0.0" {
        text = "0.0".to_string();
    }
    if let Some(stripped) = text.strip_suffix(".0") {
        text = stripped.to_string();
    }
    if text.starts_with('-') {
        text
    } else {
        format!("+{}", text)
    }
}

/// The record with the highest numeric year. Years that do not start with
/// a number rank below all others; on ties the earliest record wins.
pub fn latest_year(data: &[ProductionYear]) -> Option<&ProductionYear> {
    let mut sorted: Vec<&ProductionYear> = data.iter().collect();
    sorted.sort_by_key(|y| Reverse(parse_leading_int(&y.year)));
    sorted.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(key: &str, values: &[f64]) -> Vec<ProductionYear> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ProductionYear::new((2021 + i).to_string()).with(key, *v))
            .collect()
    }

    fn chart(key: &str) -> ChartConfig {
        ChartConfig::new(key, "Chart", "")
    }

    #[test]
    fn annotates_consecutive_changes() {
        let points = chart_series(&series("ebitda", &[10.0, 12.0, 11.0, 14.0]), &chart("ebitda"));
        let annotations: Vec<Option<&str>> = points.iter().map(|p| p.annotation.as_deref()).collect();

        assert_eq!(
            annotations,
            [None, Some("12 (+20%)"), Some("11 (-8.3%)"), Some("14 (+27.3%)")]
        );
        assert_eq!(points[0].label(), "10");
    }

    #[test]
    fn zero_base_suppresses_the_annotation() {
        let points = chart_series(&series("ebitda", &[0.0, 5.0]), &chart("ebitda"));
        assert_eq!(points[1].annotation, None);
        assert_eq!(points[1].label(), "5");
    }

    #[test]
    fn two_year_ebitda_profile() {
        let data = vec![
            ProductionYear::new("2021").with("ebitda", 10.0),
            ProductionYear::new("2022").with("ebitda", 12.0),
        ];
        let points = chart_series(&data, &chart("ebitda"));

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].x, "2021");
        assert_eq!(points[1].x, "2022");
        assert_eq!(points[1].annotation.as_deref(), Some("12 (+20%)"));
    }

    #[test]
    fn missing_metric_charts_as_zero() {
        let data = vec![
            ProductionYear::new("2021").with("ebitda", 4.0),
            ProductionYear::new("2022").with("production", 9.0),
            ProductionYear::new("2023").with("ebitda", 6.0),
        ];
        let points = chart_series(&data, &chart("ebitda"));

        assert_eq!(points[1].y, 0.0);
        assert_eq!(points[1].annotation.as_deref(), Some("0 (-100%)"));
        assert_eq!(points[2].annotation, None);
    }

    #[test]
    fn change_formatting() {
        assert_eq!(format_change(20.0), "+20");
        assert_eq!(format_change(0.0), "+0");
        assert_eq!(format_change(-0.04), "+0");
        assert_eq!(format_change(-8.333), "-8.3");
        assert_eq!(format_change(100.04), "+100");
        assert_eq!(format_change(2.55), "+2.5");
    }

    #[test]
    fn percent_change_of_negative_base() {
        assert_relative_eq!(percent_change(-10.0, -5.0).unwrap(), -50.0);
        assert_eq!(percent_change(0.0, 3.0), None);
    }

    #[test]
    fn latest_year_uses_numeric_order() {
        let data = vec![
            ProductionYear::new("2023"),
            ProductionYear::new("FY"),
            ProductionYear::new("2024").with("a", 1.0),
            ProductionYear::new("999"),
            ProductionYear::new("2024").with("a", 2.0),
        ];
        let latest = latest_year(&data).unwrap();
        assert_eq!(latest.year, "2024");
        assert_eq!(latest.metric("a"), Some(1.0));
        assert!(latest_year(&[]).is_none());
    }
}

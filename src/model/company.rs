use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::numeric::{coerce_value, deserialize_lenient};
use crate::error::{OutreachError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub executives: Vec<Executive>,
    #[serde(default)]
    pub contact: ContactDetails,
    #[serde(default)]
    pub locations: Vec<GeoLocation>,
    #[serde(default)]
    pub production_data: Vec<ProductionYear>,
    #[serde(default)]
    pub highlighted_countries: Vec<String>,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
    #[serde(default)]
    pub intro_sources: Vec<Source>,
    #[serde(default)]
    pub financial_sources: Vec<Source>,
    #[serde(default)]
    pub location_sources: Vec<Source>,

    // Per-chart axis labels from before charts were configurable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_label_ebitda: Option<String>,
    #[serde(default, skip_serializing)]
    pub(crate) axis_label_ebdat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_label_production: Option<String>,
}

impl Company {
    #[cfg(test)]
    pub fn is_highlighted(&self, country: &str) -> bool {
        self.highlighted_countries.iter().any(|c| c == country)
    }

    #[cfg(test)]
    pub fn location(&self, id: &str) -> Option<&GeoLocation> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn chart_by_title(&self, title: &str) -> Option<&ChartConfig> {
        self.charts.iter().find(|c| c.title == title)
    }

    pub fn sources(&self, section: SourceSection) -> &[Source] {
        match section {
            SourceSection::Intro => &self.intro_sources,
            SourceSection::Financial => &self.financial_sources,
            SourceSection::Location => &self.location_sources,
        }
    }

    pub fn sources_mut(&mut self, section: SourceSection) -> &mut Vec<Source> {
        match section {
            SourceSection::Intro => &mut self.intro_sources,
            SourceSection::Financial => &mut self.financial_sources,
            SourceSection::Location => &mut self.location_sources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Executive {
    pub id: String,
    #[serde(default)]
    pub role_title: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    #[default]
    Office,
    Operation,
}

/// A pin on the world map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub lat: f64,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub lng: f64,
    #[serde(rename = "type", default)]
    pub kind: LocationKind,
}

/// Selects which metric of the year series a chart plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub id: String,
    pub data_key: String,
    pub title: String,
    #[serde(default = "default_x_axis_label")]
    pub x_axis_label: String,
    #[serde(default, alias = "axisLabel")]
    pub y_axis_label: String,
}

fn default_x_axis_label() -> String {
    "Years".to_string()
}

impl ChartConfig {
    pub fn new(data_key: &str, title: &str, y_axis_label: &str) -> Self {
        Self {
            id: super::generate_id(),
            data_key: data_key.trim().to_string(),
            title: title.trim().to_string(),
            x_axis_label: default_x_axis_label(),
            y_axis_label: y_axis_label.to_string(),
        }
    }

    /// Metric keys are free-form, so this is the only place they are checked.
    pub fn validate(&self) -> Result<()> {
        if self.data_key.trim().is_empty() {
            return Err(OutreachError::InvalidChartConfig(
                "data key must not be blank".to_string(),
            ));
        }
        if self.data_key.trim() == "year" {
            return Err(OutreachError::InvalidChartConfig(
                "`year` is reserved for the x axis".to_string(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(OutreachError::InvalidChartConfig(format!(
                "chart `{}` needs a title",
                self.data_key
            )));
        }
        Ok(())
    }

    /// Label shown on the value axis, falling back to the title.
    pub fn value_label(&self) -> &str {
        if self.y_axis_label.trim().is_empty() {
            &self.title
        } else {
            &self.y_axis_label
        }
    }
}

/// One year of figures. The metric set is open: any chart's `data_key`
/// can live here without a schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProductionYear")]
pub struct ProductionYear {
    pub year: String,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, f64>,
}

impl ProductionYear {
    pub fn new(year: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }
}

#[derive(Deserialize)]
struct RawProductionYear {
    #[serde(default)]
    year: Value,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl From<RawProductionYear> for ProductionYear {
    fn from(raw: RawProductionYear) -> Self {
        let year = match raw.year {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let metrics = raw
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), coerce_value(v)))
            .collect();
        Self { year, metrics }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSection {
    Intro,
    Financial,
    Location,
}

impl SourceSection {
    pub fn title(self) -> &'static str {
        match self {
            SourceSection::Intro => "Company Profile",
            SourceSection::Financial => "Financial & Production Report",
            SourceSection::Location => "Map Data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn production_year_keeps_open_metric_set() {
        let year: ProductionYear = serde_json::from_value(json!({
            "year": "2023",
            "ebitda": 11,
            "production": 5.5,
            "coalTonnes": "42"
        }))
        .unwrap();

        assert_eq!(year.year, "2023");
        assert_eq!(year.metric("ebitda"), Some(11.0));
        assert_eq!(year.metric("production"), Some(5.5));
        assert_eq!(year.metric("coalTonnes"), Some(42.0));
        assert_eq!(year.metric("missing"), None);

        let back = serde_json::to_value(&year).unwrap();
        assert_eq!(back["year"], json!("2023"));
        assert_eq!(back["production"], json!(5.5));
    }

    #[test]
    fn numeric_year_labels_are_stringified() {
        let year: ProductionYear = serde_json::from_value(json!({"year": 2020, "ebitda": null})).unwrap();
        assert_eq!(year.year, "2020");
        assert_eq!(year.metric("ebitda"), Some(0.0));
    }

    #[test]
    fn location_reads_type_and_tolerates_bad_coordinates() {
        let loc: GeoLocation = serde_json::from_value(json!({
            "id": "a1",
            "name": "Mine",
            "lat": "-26.2",
            "lng": null,
            "type": "operation"
        }))
        .unwrap();
        assert_eq!(loc.kind, LocationKind::Operation);
        assert_eq!(loc.lat, -26.2);
        assert_eq!(loc.lng, 0.0);
    }

    #[test]
    fn chart_config_validation() {
        assert!(ChartConfig::new("ebitda", "EBITDA", "R bn").validate().is_ok());
        assert!(ChartConfig::new("  ", "EBITDA", "").validate().is_err());
        assert!(ChartConfig::new("year", "Year", "").validate().is_err());
        assert!(ChartConfig::new("ebitda", "", "").validate().is_err());
    }

    #[test]
    fn chart_config_reads_single_axis_label() {
        let chart: ChartConfig = serde_json::from_value(json!({
            "id": "c1",
            "dataKey": "production",
            "title": "Production",
            "axisLabel": "Production (Kt)"
        }))
        .unwrap();
        assert_eq!(chart.x_axis_label, "Years");
        assert_eq!(chart.value_label(), "Production (Kt)");
    }
}

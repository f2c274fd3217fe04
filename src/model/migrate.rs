use std::collections::HashSet;

use super::company::Company;
use super::defaults::{default_charts, EBITDA_AXIS_LABEL, EBITDA_KEY};
use super::generate_id;

const LEGACY_EBITDA_KEY: &str = "ebdat";
const LEGACY_EBITDA_LABELS: [&str; 2] = ["EBITDA ($M)", "EBDAT ($M)"];

impl Company {
    /// Brings a stored record up to the current shape. Safe to run on
    /// records that are already current.
    pub fn migrate_legacy(&mut self) {
        for year in &mut self.production_data {
            if let Some(value) = year.metrics.remove(LEGACY_EBITDA_KEY) {
                year.metrics.entry(EBITDA_KEY.to_string()).or_insert(value);
            }
        }

        if let Some(label) = self.axis_label_ebdat.take() {
            self.axis_label_ebitda = Some(label);
        }
        if let Some(label) = &self.axis_label_ebitda {
            if LEGACY_EBITDA_LABELS.contains(&label.as_str()) {
                self.axis_label_ebitda = Some(EBITDA_AXIS_LABEL.to_string());
            }
        }

        if self.charts.is_empty() {
            self.charts = default_charts(
                self.axis_label_ebitda.as_deref(),
                self.axis_label_production.as_deref(),
            );
        }

        let mut seen = HashSet::new();
        for location in &mut self.locations {
            if location.id.is_empty() || !seen.insert(location.id.clone()) {
                location.id = generate_id();
                seen.insert(location.id.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_record() -> serde_json::Value {
        json!({
            "id": "abc123xyz",
            "name": "Exxaro Resources",
            "logoUrl": null,
            "description": "Coal",
            "executives": [],
            "contact": {"address": "", "emails": [""], "phones": [""]},
            "locations": [
                {"id": "0.5", "name": "HQ", "lat": -25.8, "lng": 28.2, "type": "office"},
                {"id": "0.5", "name": "Grootegeluk", "lat": -23.7, "lng": 27.6, "type": "operation"}
            ],
            "productionData": [
                {"year": "2021", "ebdat": 10, "production": 5},
                {"year": "2022", "ebdat": 12, "ebitda": 13, "production": 6}
            ],
            "highlightedCountries": ["South Africa"],
            "axisLabelEbdat": "EBDAT ($M)",
            "axisLabelProduction": "Production (Mt)"
        })
    }

    #[test]
    fn upgrades_legacy_records() {
        let mut company: Company = serde_json::from_value(legacy_record()).unwrap();
        company.migrate_legacy();

        assert!(company.intro_sources.is_empty());
        assert_eq!(company.production_data[0].metric("ebitda"), Some(10.0));
        assert_eq!(company.production_data[0].metric("ebdat"), None);
        // An explicit ebitda wins over the legacy field.
        assert_eq!(company.production_data[1].metric("ebitda"), Some(13.0));

        assert_eq!(company.axis_label_ebitda.as_deref(), Some(EBITDA_AXIS_LABEL));
        assert_eq!(company.charts.len(), 2);
        assert_eq!(company.charts[0].y_axis_label, EBITDA_AXIS_LABEL);
        assert_eq!(company.charts[1].y_axis_label, "Production (Mt)");
    }

    #[test]
    fn repairs_duplicate_location_ids() {
        let mut company: Company = serde_json::from_value(legacy_record()).unwrap();
        company.migrate_legacy();

        assert_eq!(company.locations[0].id, "0.5");
        assert_ne!(company.locations[1].id, "0.5");
    }

    #[test]
    fn is_idempotent_on_current_records() {
        let mut company = Company::new_default("Glencore");
        let before = company.clone();
        company.migrate_legacy();
        assert_eq!(company, before);
    }
}

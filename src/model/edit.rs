//! Editing operations applied by the owner of a company record. The map and
//! the editor forms only propose changes; these functions apply them.

use super::company::{ChartConfig, Company, GeoLocation, LocationKind, ProductionYear, Source, SourceSection};
use super::defaults::new_executive;
use super::generate_id;
use super::numeric::{coerce_numeric, parse_leading_int};
use crate::error::{OutreachError, Result};

const FIRST_YEAR_FALLBACK: i64 = 2020;

pub fn clamp_lat(lat: f64) -> f64 {
    if lat.is_finite() {
        lat.clamp(-90.0, 90.0)
    } else {
        0.0
    }
}

pub fn clamp_lng(lng: f64) -> f64 {
    if lng.is_finite() {
        lng.clamp(-180.0, 180.0)
    } else {
        0.0
    }
}

impl Company {
    pub fn toggle_highlight(&mut self, country: &str) {
        if let Some(pos) = self.highlighted_countries.iter().position(|c| c == country) {
            self.highlighted_countries.remove(pos);
        } else {
            self.highlighted_countries.push(country.to_string());
        }
    }

    /// Returns false when no pin has that id.
    pub fn move_pin(&mut self, id: &str, lat: f64, lng: f64) -> bool {
        match self.locations.iter_mut().find(|l| l.id == id) {
            Some(location) => {
                location.lat = clamp_lat(lat);
                location.lng = clamp_lng(lng);
                true
            }
            None => false,
        }
    }

    pub fn add_location(&mut self) -> &GeoLocation {
        self.locations.push(GeoLocation {
            id: generate_id(),
            name: "New Office".to_string(),
            lat: 0.0,
            lng: 0.0,
            kind: LocationKind::Office,
        });
        &self.locations[self.locations.len() - 1]
    }

    pub fn remove_location(&mut self, id: &str) {
        self.locations.retain(|l| l.id != id);
    }

    pub fn set_location_lat(&mut self, id: &str, input: &str) {
        if let Some(location) = self.locations.iter_mut().find(|l| l.id == id) {
            location.lat = clamp_lat(coerce_numeric(input));
        }
    }

    pub fn set_location_lng(&mut self, id: &str, input: &str) {
        if let Some(location) = self.locations.iter_mut().find(|l| l.id == id) {
            location.lng = clamp_lng(coerce_numeric(input));
        }
    }

    /// Appends the year after the last one, with every charted metric at 0.
    pub fn add_year(&mut self) -> &ProductionYear {
        let last = self
            .production_data
            .last()
            .and_then(|y| parse_leading_int(&y.year))
            .unwrap_or(FIRST_YEAR_FALLBACK);

        let next = last.checked_add(1).unwrap_or(last);
        let mut year = ProductionYear::new(next.to_string());
        for chart in &self.charts {
            year.metrics.insert(chart.data_key.clone(), 0.0);
        }
        self.production_data.push(year);
        &self.production_data[self.production_data.len() - 1]
    }

    pub fn remove_year(&mut self, index: usize) {
        if index < self.production_data.len() {
            self.production_data.remove(index);
        }
    }

    pub fn set_year_label(&mut self, index: usize, label: &str) {
        if let Some(year) = self.production_data.get_mut(index) {
            year.year = label.to_string();
        }
    }

    pub fn set_metric(&mut self, index: usize, key: &str, input: &str) {
        if let Some(year) = self.production_data.get_mut(index) {
            year.metrics.insert(key.to_string(), coerce_numeric(input));
        }
    }

    pub fn add_executive(&mut self) {
        self.executives.push(new_executive("New Role"));
    }

    pub fn remove_executive(&mut self, id: &str) {
        self.executives.retain(|e| e.id != id);
    }

    pub fn add_source(&mut self, section: SourceSection) {
        self.sources_mut(section).push(Source {
            id: generate_id(),
            label: "New Link".to_string(),
            url: String::new(),
        });
    }

    pub fn remove_source(&mut self, section: SourceSection, id: &str) {
        self.sources_mut(section).retain(|s| s.id != id);
    }

    pub fn add_chart(&mut self, chart: ChartConfig) -> Result<()> {
        chart.validate()?;
        if self.charts.iter().any(|c| c.data_key == chart.data_key) {
            return Err(OutreachError::InvalidChartConfig(format!(
                "a chart for `{}` already exists",
                chart.data_key
            )));
        }
        self.charts.push(chart);
        Ok(())
    }

    pub fn remove_chart(&mut self, id: &str) {
        self.charts.retain(|c| c.id != id);
    }
}

use std::collections::HashSet;

use egui::{ComboBox, Grid, RichText, ScrollArea, Ui};

use super::app::Action;
use super::chart_view::{trend_chart, SERIES_COLORS};
use super::theme::MUTED;
use super::widgets::{muted, section_heading};
use crate::chart::comparison::{available_metrics, default_metric, latest_snapshot, trend_rows};
use crate::model::numeric::format_number;
use crate::model::Company;

/// Metric selection and company filter for the comparison dashboard. The
/// defaults (every company, the preferred metric) are applied the first
/// time companies are available.
#[derive(Default)]
pub struct ComparisonView {
    metric: Option<String>,
    selected: HashSet<String>,
    initialised: bool,
}

impl ComparisonView {
    fn initialise(&mut self, companies: &[Company]) {
        if self.initialised || companies.is_empty() {
            return;
        }
        self.selected = companies.iter().map(|c| c.id.clone()).collect();
        self.metric = default_metric(companies);
        self.initialised = true;
    }

    /// A fresh listing brings the defaults back.
    pub fn companies_reloaded(&mut self) {
        self.initialised = false;
    }

    pub fn show(&mut self, ui: &mut Ui, companies: &[Company], loading: bool, actions: &mut Vec<Action>) {
        self.initialise(companies);

        ui.horizontal(|ui| {
            if ui.button("⬅ Dashboard").clicked() {
                actions.push(Action::ShowDashboard);
            }
            ui.heading("Comparison");
        });
        if loading && companies.is_empty() {
            ui.spinner();
            return;
        }

        let metrics = available_metrics(companies);
        if metrics.is_empty() {
            muted(ui, "No charts configured for any company.");
            return;
        }

        ui.horizontal(|ui| {
            ui.label("Metric:");
            ComboBox::from_id_salt("comparison_metric")
                .selected_text(self.metric.clone().unwrap_or_default())
                .show_ui(ui, |ui| {
                    for metric in &metrics {
                        ui.selectable_value(&mut self.metric, Some(metric.clone()), metric);
                    }
                });
            if ui.small_button("All").clicked() {
                self.selected = companies.iter().map(|c| c.id.clone()).collect();
            }
            if ui.small_button("None").clicked() {
                self.selected.clear();
            }
        });

        ui.horizontal_wrapped(|ui| {
            for company in companies {
                let mut on = self.selected.contains(&company.id);
                if ui.checkbox(&mut on, &company.name).changed() {
                    if on {
                        self.selected.insert(company.id.clone());
                    } else {
                        self.selected.remove(&company.id);
                    }
                }
            }
        });

        let Some(metric) = self.metric.clone() else { return };
        let rows = trend_rows(companies, &metric, &self.selected);
        let snapshot = latest_snapshot(companies, &metric, &self.selected);
        let charted: Vec<&Company> = companies
            .iter()
            .filter(|c| self.selected.contains(&c.id) && c.chart_by_title(&metric).is_some())
            .collect();
        let series: Vec<String> = charted.iter().map(|c| c.id.clone()).collect();

        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            section_heading(ui, &format!("Historical trend: {}", metric));
            let width = ui.available_width().min(820.0);
            trend_chart(ui, &rows, &series, egui::vec2(width, 300.0));
            ui.horizontal_wrapped(|ui| {
                for (n, company) in charted.iter().enumerate() {
                    ui.label(RichText::new(format!("● {}", company.name)).color(SERIES_COLORS[n % SERIES_COLORS.len()]));
                }
            });

            section_heading(ui, &format!("Latest {}", metric));
            if snapshot.is_empty() {
                muted(ui, "No data for the selected companies.");
                return;
            }
            let max = snapshot.iter().map(|s| s.value.abs()).fold(0.0_f64, f64::max);
            Grid::new("latest_snapshot").striped(true).show(ui, |ui| {
                for row in &snapshot {
                    ui.label(&row.company);
                    ui.label(RichText::new(&row.year).color(MUTED));
                    let fraction = if max > 0.0 { (row.value.abs() / max) as f32 } else { 0.0 };
                    ui.add(
                        egui::ProgressBar::new(fraction)
                            .desired_width(width * 0.5)
                            .text(format_number(row.value)),
                    );
                    ui.end_row();
                }
            });
        });
    }
}

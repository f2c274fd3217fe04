use egui::{RichText, ScrollArea, Ui};

use super::app::Action;
use super::chart_view::bar_chart;
use super::image_cache::ImageCache;
use super::theme::{ACCENT, MUTED};
use super::widgets::{error_text, muted, section_heading};
use crate::error::Result;
use crate::map::{MapController, MapInputs, WorldMap};
use crate::model::{Company, SourceSection};

/// The shareable profile page. Nothing here edits the company.
pub struct PreviewView {
    pub id: String,
    pub map: MapController,
    company: Option<Company>,
    load_error: Option<String>,
    chart_tab: usize,
}

impl PreviewView {
    pub fn new(id: String) -> Self {
        Self {
            id,
            map: MapController::default(),
            company: None,
            load_error: None,
            chart_tab: 0,
        }
    }

    pub fn loaded(&mut self, result: Result<Company>) {
        match result {
            Ok(company) => self.company = Some(company),
            Err(e) => {
                log::error!("could not open company {}: {}", self.id, e);
                self.load_error = Some(e.to_string());
            }
        }
    }

    pub fn show(&mut self, ui: &mut Ui, images: &mut ImageCache, actions: &mut Vec<Action>) {
        if let Some(error) = &self.load_error {
            error_text(ui, format!("Company not found: {}", error));
            if ui.button("Back to dashboard").clicked() {
                actions.push(Action::ShowDashboard);
            }
            return;
        }
        let Some(company) = &self.company else {
            ui.spinner();
            return;
        };

        ui.horizontal(|ui| {
            if ui.button("⬅ Dashboard").clicked() {
                actions.push(Action::ShowDashboard);
            }
            if ui.button("Edit").clicked() {
                actions.push(Action::Edit(company.id.clone()));
            }
        });

        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.horizontal(|ui| {
                if let Some(texture) = company.logo_url.as_deref().and_then(|url| images.get(ui.ctx(), url)) {
                    ui.add(egui::Image::new(&texture).fit_to_exact_size(egui::vec2(96.0, 96.0)));
                }
                ui.heading(RichText::new(&company.name).size(28.0).strong());
            });
            ui.label(&company.description);
            sources(ui, company, SourceSection::Intro);

            section_heading(ui, "Leadership");
            ui.horizontal_wrapped(|ui| {
                for exec in &company.executives {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(240.0);
                        ui.vertical(|ui| {
                            if let Some(texture) = exec.image_url.as_deref().and_then(|url| images.get(ui.ctx(), url)) {
                                ui.add(egui::Image::new(&texture).fit_to_exact_size(egui::vec2(96.0, 96.0)).rounding(48.0));
                            }
                            ui.label(RichText::new(&exec.name).strong());
                            ui.label(RichText::new(&exec.role_title).color(ACCENT));
                            if !exec.education.is_empty() {
                                muted(ui, exec.education.as_str());
                            }
                            ui.label(&exec.bio);
                        });
                    });
                }
            });

            section_heading(ui, "Global Footprint");
            let width = ui.available_width().min(800.0);
            let mut events = Vec::new();
            ui.add(
                WorldMap::new(
                    &mut self.map,
                    MapInputs {
                        locations: &company.locations,
                        highlighted: &company.highlighted_countries,
                        edit_mode: false,
                    },
                    &mut events,
                )
                .width(width),
            );
            for location in &company.locations {
                muted(ui, format!("● {} ({:?})", location.name, location.kind));
            }
            sources(ui, company, SourceSection::Location);

            section_heading(ui, "Performance");
            if !company.charts.is_empty() {
                ui.horizontal(|ui| {
                    for (i, chart) in company.charts.iter().enumerate() {
                        ui.selectable_value(&mut self.chart_tab, i, &chart.title);
                    }
                });
                let tab = self.chart_tab.min(company.charts.len() - 1);
                bar_chart(ui, &company.charts[tab], &company.production_data, egui::vec2(width, 260.0));
            }
            sources(ui, company, SourceSection::Financial);

            section_heading(ui, "Contact");
            if !company.contact.address.is_empty() {
                ui.label(&company.contact.address);
            }
            for email in company.contact.emails.iter().filter(|e| !e.is_empty()) {
                ui.hyperlink_to(email, format!("mailto:{}", email));
            }
            for phone in company.contact.phones.iter().filter(|p| !p.is_empty()) {
                ui.label(phone);
            }
        });
    }
}

fn sources(ui: &mut Ui, company: &Company, section: SourceSection) {
    let links = company.sources(section);
    if links.is_empty() {
        return;
    }
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new("Sources:").small().color(MUTED));
        for source in links {
            if source.url.is_empty() {
                ui.label(RichText::new(&source.label).small());
            } else {
                ui.hyperlink_to(RichText::new(&source.label).small(), &source.url);
            }
        }
    });
}

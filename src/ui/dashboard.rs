use egui::{RichText, ScrollArea, Ui};

use super::app::Action;
use super::image_cache::ImageCache;
use super::theme::{ACCENT, DANGER, SURFACE};
use super::widgets::{error_text, muted};
use crate::model::Company;

#[derive(Default)]
pub struct DashboardView {
    adding: bool,
    new_name: String,
    confirm_delete: Option<String>,
}

pub struct Listing<'a> {
    pub companies: &'a [Company],
    pub loading: bool,
    pub error: Option<&'a str>,
}

impl DashboardView {
    pub fn show(&mut self, ui: &mut Ui, listing: Listing<'_>, images: &mut ImageCache, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.heading("Company Overview");
                muted(ui, "Manage outreach campaigns and company profiles.");
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("+ Add Company").clicked() {
                    self.adding = true;
                }
                if ui.button("Compare").clicked() {
                    actions.push(Action::Compare);
                }
            });
        });

        if self.adding {
            ui.group(|ui| {
                ui.label("Company Name");
                ui.horizontal(|ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.new_name)
                            .hint_text("e.g. Anglo American")
                            .desired_width(320.0),
                    );
                    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let name = self.new_name.trim().to_string();
                    if ui.add_enabled(!name.is_empty(), egui::Button::new("Create")).clicked()
                        || (submitted && !name.is_empty())
                    {
                        actions.push(Action::Create(name));
                        self.new_name.clear();
                        self.adding = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.new_name.clear();
                        self.adding = false;
                    }
                });
            });
        }

        if let Some(error) = listing.error {
            error_text(ui, format!("Could not load companies: {}", error));
            if ui.button("Retry").clicked() {
                actions.push(Action::Refresh);
            }
        }
        if listing.loading && listing.companies.is_empty() {
            ui.spinner();
            return;
        }
        if listing.companies.is_empty() {
            muted(ui, "No companies yet.");
            return;
        }

        ui.add_space(8.0);
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for company in listing.companies {
                    self.card(ui, company, images, actions);
                }
            });
        });
    }

    fn card(&mut self, ui: &mut Ui, company: &Company, images: &mut ImageCache, actions: &mut Vec<Action>) {
        egui::Frame::none()
            .fill(SURFACE)
            .rounding(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(300.0);
                ui.horizontal(|ui| {
                    if let Some(texture) = company.logo_url.as_deref().and_then(|url| images.get(ui.ctx(), url)) {
                        ui.add(egui::Image::new(&texture).fit_to_exact_size(egui::vec2(40.0, 40.0)));
                    }
                    ui.vertical(|ui| {
                        ui.label(RichText::new(&company.name).strong().size(17.0));
                        let summary = if company.description.is_empty() {
                            "No description".to_string()
                        } else {
                            company.description.chars().take(60).collect()
                        };
                        muted(ui, summary);
                    });
                });
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.link("Preview").clicked() {
                        actions.push(Action::Preview(company.id.clone()));
                    }
                    if ui.link(RichText::new("Edit Profile").color(ACCENT)).clicked() {
                        actions.push(Action::Edit(company.id.clone()));
                    }
                    if self.confirm_delete.as_deref() == Some(company.id.as_str()) {
                        if ui.button(RichText::new("Confirm delete").color(DANGER)).clicked() {
                            actions.push(Action::Delete(company.id.clone()));
                            self.confirm_delete = None;
                        }
                        if ui.small_button("Keep").clicked() {
                            self.confirm_delete = None;
                        }
                    } else if ui.link(RichText::new("Delete").color(DANGER)).clicked() {
                        self.confirm_delete = Some(company.id.clone());
                    }
                });
            });
    }
}

use std::path::PathBuf;
use std::time::Instant;

use egui::{ComboBox, Grid, Id, RichText, ScrollArea, Ui};

use super::app::{Action, UploadTarget};
use super::chart_view::bar_chart;
use super::image_cache::ImageCache;
use super::session::{EditorSession, SaveStatus};
use super::theme::{ACCENT, MUTED};
use super::widgets::{
    error_text, muted, numeric_field, remove_button, section_heading, text_area, text_field,
};
use crate::error::Result;
use crate::map::{MapController, MapInputs, WorldMap};
use crate::model::{ChartConfig, Company, LocationKind, SourceSection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditorTab {
    Executives,
    Contact,
    Map,
    Data,
}

impl EditorTab {
    const ALL: [EditorTab; 4] = [EditorTab::Executives, EditorTab::Contact, EditorTab::Map, EditorTab::Data];

    fn title(self) -> &'static str {
        match self {
            EditorTab::Executives => "Executives",
            EditorTab::Contact => "Contact",
            EditorTab::Map => "Map",
            EditorTab::Data => "Production Data",
        }
    }
}

#[derive(Default)]
struct ChartDraft {
    data_key: String,
    title: String,
    y_axis_label: String,
}

pub struct EditorView {
    pub id: String,
    pub session: Option<EditorSession>,
    pub map: MapController,
    load_error: Option<String>,
    tab: EditorTab,
    upload_path: String,
    uploading: Option<UploadTarget>,
    upload_error: Option<String>,
    chart_draft: ChartDraft,
    chart_error: Option<String>,
}

impl EditorView {
    pub fn new(id: String) -> Self {
        Self {
            id,
            session: None,
            map: MapController::default(),
            load_error: None,
            tab: EditorTab::Executives,
            upload_path: String::new(),
            uploading: None,
            upload_error: None,
            chart_draft: ChartDraft::default(),
            chart_error: None,
        }
    }

    pub fn loaded(&mut self, result: Result<Company>) {
        match result {
            Ok(company) => self.session = Some(EditorSession::new(company)),
            Err(e) => {
                log::error!("could not open company {}: {}", self.id, e);
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Replaces the freshly loaded record with a working copy that never
    /// reached the store, so it is saved again once the editor goes quiet.
    pub fn restore(&mut self, unsaved: Company) {
        let Some(session) = self.session.as_mut() else { return };
        log::info!("restoring unsaved edits to {}", unsaved.name);
        session.edit(Instant::now(), |c| *c = unsaved);
    }

    pub fn upload_finished(&mut self, target: UploadTarget, result: Result<String>) {
        if self.uploading.as_ref() == Some(&target) {
            self.uploading = None;
        }
        let url = match result {
            Ok(url) => url,
            Err(e) => {
                log::error!("upload failed: {}", e);
                self.upload_error = Some(e.to_string());
                return;
            }
        };
        self.upload_error = None;
        let Some(session) = self.session.as_mut() else { return };
        session.edit(Instant::now(), |c| match &target {
            UploadTarget::Logo => c.logo_url = Some(url),
            UploadTarget::Executive(id) => {
                if let Some(exec) = c.executives.iter_mut().find(|e| &e.id == id) {
                    exec.image_url = Some(url);
                }
            }
        });
    }

    pub fn show(&mut self, ui: &mut Ui, images: &mut ImageCache, actions: &mut Vec<Action>) {
        if let Some(error) = &self.load_error {
            error_text(ui, format!("Could not load company: {}", error));
            if ui.button("Back to dashboard").clicked() {
                actions.push(Action::ShowDashboard);
            }
            return;
        }
        if self.session.is_none() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading data...");
            });
            return;
        }

        if let Some(path) = ui.ctx().input(|i| i.raw.dropped_files.iter().find_map(|f| f.path.clone())) {
            self.upload_path = path.display().to_string();
        }

        self.header(ui, images, actions);
        ui.separator();

        ui.horizontal(|ui| {
            for tab in EditorTab::ALL {
                ui.selectable_value(&mut self.tab, tab, tab.title());
            }
        });
        ui.separator();

        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| match self.tab {
            EditorTab::Executives => self.executives_tab(ui, images, actions),
            EditorTab::Contact => self.contact_tab(ui),
            EditorTab::Map => self.map_tab(ui),
            EditorTab::Data => self.data_tab(ui),
        });
    }

    fn upload(&mut self, target: UploadTarget, actions: &mut Vec<Action>) {
        let path = self.upload_path.trim();
        if path.is_empty() {
            self.upload_error = Some("Choose an image file first".to_string());
            return;
        }
        self.upload_error = None;
        self.uploading = Some(target.clone());
        actions.push(Action::Upload {
            company_id: self.id.clone(),
            target,
            path: PathBuf::from(path),
        });
    }

    fn header(&mut self, ui: &mut Ui, images: &mut ImageCache, actions: &mut Vec<Action>) {
        let Some(session) = self.session.as_mut() else { return };
        let company = session.company().clone();
        let now = Instant::now();

        ui.horizontal(|ui| {
            if ui.button("⬅ Dashboard").clicked() {
                actions.push(Action::ShowDashboard);
            }
            thumbnail(ui, images, company.logo_url.as_deref(), 64.0);
            ui.vertical(|ui| {
                if let Some(name) = text_field(ui, &company.name, "Company name", 320.0) {
                    session.edit(now, |c| c.name = name);
                }
                save_status(ui, session, now);
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Preview").clicked() {
                    actions.push(Action::Preview(self.id.clone()));
                }
            });
        });

        if let Some(description) = text_area(ui, &company.description, "Company description", 3) {
            session.edit(now, |c| c.description = description);
        }

        ui.horizontal(|ui| {
            ui.label("Image file:");
            ui.add(
                egui::TextEdit::singleline(&mut self.upload_path)
                    .hint_text("Drop an image here or type a path")
                    .desired_width(360.0),
            );
            let busy = self.uploading.is_some();
            if ui.add_enabled(!busy, egui::Button::new("Upload as logo")).clicked() {
                self.upload(UploadTarget::Logo, actions);
            }
            if busy {
                ui.spinner();
            }
        });
        if let Some(error) = &self.upload_error {
            error_text(ui, format!("Failed to upload image: {}", error));
        }
    }

    fn executives_tab(&mut self, ui: &mut Ui, images: &mut ImageCache, actions: &mut Vec<Action>) {
        let Some(session) = self.session.as_mut() else { return };
        let company = session.company().clone();
        let now = Instant::now();
        let mut upload_for = None;

        if ui.button("+ Add Executive").clicked() {
            session.edit(now, |c| c.add_executive());
        }

        for exec in &company.executives {
            ui.add_space(8.0);
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        thumbnail(ui, images, exec.image_url.as_deref(), 72.0);
                        let busy = self.uploading.is_some();
                        if ui.add_enabled(!busy, egui::Button::new("Use image").small()).clicked() {
                            upload_for = Some(exec.id.clone());
                        }
                        if self.uploading == Some(UploadTarget::Executive(exec.id.clone())) {
                            ui.spinner();
                        }
                    });
                    ui.vertical(|ui| {
                        Grid::new(("exec", &exec.id)).num_columns(2).show(ui, |ui| {
                            ui.label("Role");
                            if let Some(v) = text_field(ui, &exec.role_title, "e.g. Chief Executive Officer", 300.0) {
                                session.edit(now, |c| set_exec(c, &exec.id, |e| e.role_title = v));
                            }
                            ui.end_row();
                            ui.label("Name");
                            if let Some(v) = text_field(ui, &exec.name, "e.g. John Doe", 300.0) {
                                session.edit(now, |c| set_exec(c, &exec.id, |e| e.name = v));
                            }
                            ui.end_row();
                            ui.label("Education");
                            if let Some(v) = text_field(ui, &exec.education, "e.g. MBA Harvard, BSc Engineering", 300.0) {
                                session.edit(now, |c| set_exec(c, &exec.id, |e| e.education = v));
                            }
                            ui.end_row();
                        });
                        if let Some(v) = text_area(ui, &exec.bio, "Short professional biography...", 3) {
                            session.edit(now, |c| set_exec(c, &exec.id, |e| e.bio = v));
                        }
                    });
                    if remove_button(ui) {
                        session.edit(now, |c| c.remove_executive(&exec.id));
                    }
                });
            });
        }

        if let Some(id) = upload_for {
            self.upload(UploadTarget::Executive(id), actions);
        }
    }

    fn contact_tab(&mut self, ui: &mut Ui) {
        let Some(session) = self.session.as_mut() else { return };
        let company = session.company().clone();
        let now = Instant::now();

        sources_editor(ui, session, &company, SourceSection::Intro, now);

        section_heading(ui, "Address");
        if let Some(address) = text_area(ui, &company.contact.address, "Head office address", 3) {
            session.edit(now, |c| c.contact.address = address);
        }

        section_heading(ui, "Emails");
        string_list(ui, session, now, &company.contact.emails, "info@example.com", |c| &mut c.contact.emails);
        if ui.button("+ Add Email").clicked() {
            session.edit(now, |c| c.contact.emails.push(String::new()));
        }

        section_heading(ui, "Phone numbers");
        string_list(ui, session, now, &company.contact.phones, "+27...", |c| &mut c.contact.phones);
        if ui.button("+ Add Phone").clicked() {
            session.edit(now, |c| c.contact.phones.push(String::new()));
        }
    }

    fn map_tab(&mut self, ui: &mut Ui) {
        let Some(session) = self.session.as_mut() else { return };
        let company = session.company().clone();
        let now = Instant::now();

        muted(ui, "Click a country to highlight it. Drag a pin to move it.");
        let mut events = Vec::new();
        let width = ui.available_width().min(800.0);
        ui.add(
            WorldMap::new(
                &mut self.map,
                MapInputs {
                    locations: &company.locations,
                    highlighted: &company.highlighted_countries,
                    edit_mode: true,
                },
                &mut events,
            )
            .width(width),
        );
        for event in events {
            session.apply_map_event(now, event);
        }

        if !company.highlighted_countries.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label("Highlighted:");
                for country in &company.highlighted_countries {
                    if ui
                        .button(RichText::new(format!("{} ✖", country)).color(ACCENT))
                        .on_hover_text("Remove highlight")
                        .clicked()
                    {
                        session.edit(now, |c| c.toggle_highlight(country));
                    }
                }
            });
        }

        sources_editor(ui, session, &company, SourceSection::Location, now);

        section_heading(ui, "Locations");
        Grid::new("locations").num_columns(5).striped(true).show(ui, |ui| {
            ui.label(RichText::new("Name").color(MUTED));
            ui.label(RichText::new("Type").color(MUTED));
            ui.label(RichText::new("Lat").color(MUTED));
            ui.label(RichText::new("Lng").color(MUTED));
            ui.end_row();

            for location in &company.locations {
                if let Some(name) = text_field(ui, &location.name, "Office Name", 200.0) {
                    session.edit(now, |c| {
                        if let Some(l) = c.locations.iter_mut().find(|l| l.id == location.id) {
                            l.name = name;
                        }
                    });
                }

                let mut kind = location.kind;
                ComboBox::from_id_salt(("kind", &location.id))
                    .selected_text(kind_label(kind))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut kind, LocationKind::Office, kind_label(LocationKind::Office));
                        ui.selectable_value(&mut kind, LocationKind::Operation, kind_label(LocationKind::Operation));
                    });
                if kind != location.kind {
                    session.edit(now, |c| {
                        if let Some(l) = c.locations.iter_mut().find(|l| l.id == location.id) {
                            l.kind = kind;
                        }
                    });
                }

                if let Some(lat) = numeric_field(ui, Id::new(("lat", &location.id)), location.lat, 80.0) {
                    session.edit(now, |c| c.set_location_lat(&location.id, &lat));
                }
                if let Some(lng) = numeric_field(ui, Id::new(("lng", &location.id)), location.lng, 80.0) {
                    session.edit(now, |c| c.set_location_lng(&location.id, &lng));
                }
                if remove_button(ui) {
                    session.edit(now, |c| c.remove_location(&location.id));
                }
                ui.end_row();
            }
        });
        if ui.button("+ Add Location Pin").clicked() {
            session.edit(now, |c| {
                c.add_location();
            });
        }
    }

    fn data_tab(&mut self, ui: &mut Ui) {
        let Some(session) = self.session.as_mut() else { return };
        let company = session.company().clone();
        let now = Instant::now();

        section_heading(ui, "Yearly figures");
        Grid::new("production").striped(true).show(ui, |ui| {
            ui.label(RichText::new("Year").color(MUTED));
            for chart in &company.charts {
                ui.label(RichText::new(&chart.title).color(MUTED));
            }
            ui.end_row();

            for (index, year) in company.production_data.iter().enumerate() {
                if let Some(label) = text_field(ui, &year.year, "Year", 70.0) {
                    session.edit(now, |c| c.set_year_label(index, &label));
                }
                for chart in &company.charts {
                    let value = year.metric(&chart.data_key).unwrap_or(0.0);
                    let id = Id::new(("metric", &company.id, index, &chart.data_key));
                    if let Some(input) = numeric_field(ui, id, value, 90.0) {
                        session.edit(now, |c| c.set_metric(index, &chart.data_key, &input));
                    }
                }
                if remove_button(ui) {
                    session.edit(now, |c| c.remove_year(index));
                }
                ui.end_row();
            }
        });
        if ui.button("+ Add Year").clicked() {
            session.edit(now, |c| {
                c.add_year();
            });
        }

        section_heading(ui, "Charts");
        Grid::new("charts").num_columns(4).show(ui, |ui| {
            ui.label(RichText::new("Title").color(MUTED));
            ui.label(RichText::new("Data key").color(MUTED));
            ui.label(RichText::new("Axis label").color(MUTED));
            ui.end_row();
            for chart in &company.charts {
                if let Some(title) = text_field(ui, &chart.title, "Title", 160.0) {
                    session.edit(now, |c| set_chart(c, &chart.id, |ch| ch.title = title));
                }
                ui.label(RichText::new(&chart.data_key).monospace());
                if let Some(label) = text_field(ui, &chart.y_axis_label, "Axis label", 200.0) {
                    session.edit(now, |c| set_chart(c, &chart.id, |ch| ch.y_axis_label = label));
                }
                if remove_button(ui) {
                    session.edit(now, |c| c.remove_chart(&chart.id));
                }
                ui.end_row();
            }
        });

        ui.horizontal(|ui| {
            let draft = &mut self.chart_draft;
            ui.add(egui::TextEdit::singleline(&mut draft.title).hint_text("Title").desired_width(140.0));
            ui.add(egui::TextEdit::singleline(&mut draft.data_key).hint_text("data key").desired_width(110.0));
            ui.add(egui::TextEdit::singleline(&mut draft.y_axis_label).hint_text("Axis label").desired_width(160.0));
            if ui.button("+ Add Chart").clicked() {
                let chart = ChartConfig::new(&draft.data_key, &draft.title, &draft.y_axis_label);
                match session.edit(now, |c| c.add_chart(chart)) {
                    Ok(()) => {
                        self.chart_draft = ChartDraft::default();
                        self.chart_error = None;
                    }
                    Err(e) => self.chart_error = Some(e.to_string()),
                }
            }
        });
        if let Some(error) = &self.chart_error {
            error_text(ui, error.as_str());
        }

        sources_editor(ui, session, &company, SourceSection::Financial, now);

        section_heading(ui, "Preview");
        let width = ui.available_width().min(560.0);
        for chart in &company.charts {
            bar_chart(ui, chart, &company.production_data, egui::vec2(width, 220.0));
            ui.add_space(10.0);
        }
    }
}

fn set_exec(company: &mut Company, id: &str, f: impl FnOnce(&mut crate::model::Executive)) {
    if let Some(exec) = company.executives.iter_mut().find(|e| e.id == id) {
        f(exec);
    }
}

fn set_chart(company: &mut Company, id: &str, f: impl FnOnce(&mut ChartConfig)) {
    if let Some(chart) = company.charts.iter_mut().find(|c| c.id == id) {
        f(chart);
    }
}

fn kind_label(kind: LocationKind) -> &'static str {
    match kind {
        LocationKind::Office => "Office",
        LocationKind::Operation => "Operation",
    }
}

fn save_status(ui: &mut Ui, session: &mut EditorSession, now: Instant) {
    ui.horizontal(|ui| match session.status().clone() {
        SaveStatus::Saved => muted(ui, "All Saved"),
        SaveStatus::Pending => muted(ui, "Autosave On"),
        SaveStatus::Saving => {
            ui.spinner();
            muted(ui, "Saving...");
        }
        SaveStatus::Failed(error) => {
            error_text(ui, format!("Save failed: {}", error));
            if ui.small_button("Retry").clicked() {
                session.retry(now);
            }
        }
    });
}

fn thumbnail(ui: &mut Ui, images: &mut ImageCache, url: Option<&str>, size: f32) {
    let size = egui::vec2(size, size);
    match url.and_then(|url| images.get(ui.ctx(), url)) {
        Some(texture) => {
            ui.add(egui::Image::new(&texture).fit_to_exact_size(size).rounding(6.0));
        }
        None => {
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            ui.painter().rect_filled(rect, 6.0, super::theme::SURFACE);
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                if url.is_some() { "…" } else { "No image" },
                egui::FontId::proportional(11.0),
                MUTED,
            );
        }
    }
}

fn string_list(
    ui: &mut Ui,
    session: &mut EditorSession,
    now: Instant,
    values: &[String],
    hint: &str,
    field: fn(&mut Company) -> &mut Vec<String>,
) {
    for (index, value) in values.iter().enumerate() {
        ui.horizontal(|ui| {
            if let Some(v) = text_field(ui, value, hint, 320.0) {
                session.edit(now, |c| {
                    if let Some(slot) = field(c).get_mut(index) {
                        *slot = v;
                    }
                });
            }
            if remove_button(ui) {
                session.edit(now, |c| {
                    let list = field(c);
                    if index < list.len() {
                        list.remove(index);
                    }
                });
            }
        });
    }
}

fn sources_editor(ui: &mut Ui, session: &mut EditorSession, company: &Company, section: SourceSection, now: Instant) {
    section_heading(ui, &format!("Sources: {}", section.title()));
    for source in company.sources(section) {
        ui.horizontal(|ui| {
            if let Some(label) = text_field(ui, &source.label, "Label", 200.0) {
                session.edit(now, |c| {
                    if let Some(s) = c.sources_mut(section).iter_mut().find(|s| s.id == source.id) {
                        s.label = label;
                    }
                });
            }
            if let Some(url) = text_field(ui, &source.url, "https://...", 320.0) {
                session.edit(now, |c| {
                    if let Some(s) = c.sources_mut(section).iter_mut().find(|s| s.id == source.id) {
                        s.url = url;
                    }
                });
            }
            if remove_button(ui) {
                session.edit(now, |c| c.remove_source(section, &source.id));
            }
        });
    }
    if ui.small_button("+ Add Link").clicked() {
        session.edit(now, |c| c.add_source(section));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restored_edits_are_dirty_and_saved_again() {
        let stored = Company::new_default("Glencore");
        let mut unsaved = stored.clone();
        unsaved.description = "Copper, cobalt and zinc".to_string();

        let mut view = EditorView::new(stored.id.clone());
        view.loaded(Ok(stored));
        view.restore(unsaved.clone());

        let session = view.session.as_mut().unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.company(), &unsaved);
        assert_eq!(session.status(), &SaveStatus::Pending);
    }
}

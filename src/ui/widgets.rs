use egui::{Color32, Id, RichText, TextEdit, Ui};

use super::theme::{DANGER, MUTED};
use crate::model::numeric::format_number;

/// Single-line text edit over a borrowed value. Returns the new text when
/// the user changed it.
pub fn text_field(ui: &mut Ui, value: &str, hint: &str, width: f32) -> Option<String> {
    let mut buffer = value.to_string();
    let response = ui.add(TextEdit::singleline(&mut buffer).hint_text(hint).desired_width(width));
    response.changed().then_some(buffer)
}

pub fn text_area(ui: &mut Ui, value: &str, hint: &str, rows: usize) -> Option<String> {
    let mut buffer = value.to_string();
    let response = ui.add(
        TextEdit::multiline(&mut buffer)
            .hint_text(hint)
            .desired_rows(rows)
            .desired_width(f32::INFINITY),
    );
    response.changed().then_some(buffer)
}

/// Free-text numeric entry. The raw text is kept while the field has
/// focus so partial input like `-` or `12.` survives; the caller coerces it.
pub fn numeric_field(ui: &mut Ui, id: Id, value: f64, width: f32) -> Option<String> {
    let mut buffer = ui
        .data(|d| d.get_temp::<String>(id))
        .unwrap_or_else(|| format_number(value));
    let response = ui.add(TextEdit::singleline(&mut buffer).id(id).desired_width(width));

    if response.has_focus() {
        ui.data_mut(|d| d.insert_temp(id, buffer.clone()));
    } else {
        ui.data_mut(|d| d.remove::<String>(id));
    }
    response.changed().then_some(buffer)
}

pub fn remove_button(ui: &mut Ui) -> bool {
    ui.add(egui::Button::new(RichText::new("✖").color(DANGER)).frame(false))
        .on_hover_text("Remove")
        .clicked()
}

pub fn section_heading(ui: &mut Ui, text: &str) {
    ui.add_space(6.0);
    ui.label(RichText::new(text).strong().size(16.0));
    ui.add_space(2.0);
}

pub fn muted(ui: &mut Ui, text: impl Into<String>) {
    ui.label(RichText::new(text).color(MUTED).small());
}

pub fn error_text(ui: &mut Ui, text: impl Into<String>) {
    ui.label(RichText::new(text).color(Color32::from_rgb(0xf8, 0x71, 0x71)));
}

use egui::style::{Selection, Visuals, WidgetVisuals, Widgets};
use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle};

pub const ACCENT: Color32 = Color32::from_rgb(0x37, 0xa3, 0xc3);
pub const PANEL: Color32 = Color32::from_rgb(0x0f, 0x17, 0x2a);
pub const SURFACE: Color32 = Color32::from_rgb(0x1e, 0x29, 0x3b);
pub const MUTED: Color32 = Color32::from_rgb(0x94, 0xa3, 0xb8);
pub const DANGER: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);

fn widget(bg_fill: Color32, stroke: Color32, fg: Color32, expansion: f32) -> WidgetVisuals {
    WidgetVisuals {
        bg_fill,
        weak_bg_fill: bg_fill,
        bg_stroke: Stroke::new(1.0, stroke),
        fg_stroke: Stroke::new(1.0, fg),
        rounding: Rounding::same(4.0),
        expansion,
    }
}

/// Slate dark theme with the brand accent for selection and hover.
pub fn dark_style(ctx: &egui::Context) -> Style {
    let mut style = (*ctx.style()).clone();

    style.text_styles = [
        (TextStyle::Heading, FontId::new(22.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
    ]
    .into();

    let slate_600 = Color32::from_rgb(0x47, 0x55, 0x69);
    let slate_700 = Color32::from_rgb(0x33, 0x41, 0x55);

    style.visuals = Visuals::dark();
    style.visuals.override_text_color = Some(Color32::from_rgb(0xe2, 0xe8, 0xf0));
    style.visuals.widgets = Widgets {
        noninteractive: widget(PANEL, slate_700, MUTED, 0.0),
        inactive: widget(SURFACE, slate_600, Color32::WHITE, 0.0),
        hovered: widget(slate_700, ACCENT, Color32::WHITE, 0.5),
        active: widget(slate_600, ACCENT, Color32::WHITE, 1.0),
        open: widget(SURFACE, slate_600, Color32::WHITE, 0.0),
    };
    style.visuals.selection = Selection {
        bg_fill: ACCENT.gamma_multiply(0.6),
        stroke: Stroke::new(1.0, Color32::WHITE),
    };
    style.visuals.hyperlink_color = ACCENT;

    style.visuals.window_rounding = Rounding::same(6.0);
    style.visuals.window_fill = PANEL;
    style.visuals.window_stroke = Stroke::new(1.0, slate_700);
    style.visuals.panel_fill = PANEL;
    style.visuals.extreme_bg_color = SURFACE;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);

    style
}

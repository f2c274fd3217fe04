use egui::{pos2, vec2, Align2, Color32, FontId, Rect, Response, Sense, Shape, Stroke, Ui};

use super::theme::{ACCENT, MUTED, SURFACE};
use crate::chart::comparison::TrendRow;
use crate::chart::{chart_series, ChartPoint};
use crate::model::numeric::format_number;
use crate::model::{ChartConfig, ProductionYear};

const PLOT_MARGIN: f32 = 28.0;

/// Distinct line colours for the comparison chart.
pub const SERIES_COLORS: [Color32; 8] = [
    ACCENT,
    Color32::from_rgb(0xf5, 0x9e, 0x0b),
    Color32::from_rgb(0x10, 0xb9, 0x81),
    Color32::from_rgb(0xef, 0x44, 0x44),
    Color32::from_rgb(0x8b, 0x5c, 0xf6),
    Color32::from_rgb(0xec, 0x48, 0x99),
    Color32::from_rgb(0x84, 0xcc, 0x16),
    Color32::from_rgb(0xf9, 0x73, 0x16),
];

/// Titled bar chart of one metric, each bar annotated with its change.
pub fn bar_chart(ui: &mut Ui, chart: &ChartConfig, data: &[ProductionYear], size: egui::Vec2) -> Response {
    ui.strong(&chart.title);
    let points = chart_series(data, chart);
    let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
    paint_bars(ui, rect, &points, chart.value_label(), &chart.x_axis_label);
    response
}

fn paint_bars(ui: &Ui, rect: Rect, points: &[ChartPoint], y_label: &str, x_label: &str) {
    let painter = ui.painter().with_clip_rect(rect);
    painter.rect_filled(rect, 6.0, SURFACE);
    let small = FontId::proportional(11.0);

    painter.text(rect.left_top() + vec2(8.0, 6.0), Align2::LEFT_TOP, y_label, small.clone(), MUTED);
    painter.text(rect.center_bottom() - vec2(0.0, 4.0), Align2::CENTER_BOTTOM, x_label, small.clone(), MUTED);

    if points.is_empty() {
        painter.text(rect.center(), Align2::CENTER_CENTER, "No data", FontId::proportional(13.0), MUTED);
        return;
    }

    let plot = rect.shrink2(vec2(PLOT_MARGIN, PLOT_MARGIN));
    let max = points.iter().map(|p| p.y).fold(0.0_f64, f64::max);
    let min = points.iter().map(|p| p.y).fold(0.0_f64, f64::min);
    let span = if max > min { max - min } else { 1.0 };
    let to_y = |v: f64| plot.bottom() - ((v - min) / span) as f32 * plot.height();
    let baseline = to_y(0.0);

    painter.line_segment(
        [pos2(plot.left(), baseline), pos2(plot.right(), baseline)],
        Stroke::new(1.0, MUTED),
    );

    let slot = plot.width() / points.len() as f32;
    for (i, point) in points.iter().enumerate() {
        let center_x = plot.left() + slot * (i as f32 + 0.5);
        let top = to_y(point.y);
        let bar = Rect::from_x_y_ranges(
            center_x - slot * 0.3..=center_x + slot * 0.3,
            top.min(baseline)..=top.max(baseline),
        );
        painter.rect_filled(bar, 2.0, ACCENT);
        painter.text(
            pos2(center_x, top.min(baseline) - 2.0),
            Align2::CENTER_BOTTOM,
            point.label(),
            small.clone(),
            Color32::WHITE,
        );
        painter.text(
            pos2(center_x, plot.bottom() + 2.0),
            Align2::CENTER_TOP,
            &point.x,
            small.clone(),
            MUTED,
        );
    }
}

/// One line per company id in `series` across the shared year axis. Gaps
/// are skipped rather than drawn as zero.
pub fn trend_chart(ui: &mut Ui, rows: &[TrendRow], series: &[String], size: egui::Vec2) -> Response {
    let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter().with_clip_rect(rect);
    painter.rect_filled(rect, 6.0, SURFACE);
    let small = FontId::proportional(11.0);

    let values = rows.iter().flat_map(|r| r.values.iter().map(|(_, v)| *v));
    let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if rows.is_empty() || series.is_empty() {
        painter.text(rect.center(), Align2::CENTER_CENTER, "No data", FontId::proportional(13.0), MUTED);
        return response;
    }

    let plot = rect.shrink2(vec2(PLOT_MARGIN * 1.5, PLOT_MARGIN));
    let span = if max > min { max - min } else { 1.0 };
    let step = plot.width() / (rows.len().max(2) - 1) as f32;
    let at = |i: usize, v: f64| {
        pos2(
            plot.left() + step * i as f32,
            plot.bottom() - ((v - min) / span) as f32 * plot.height(),
        )
    };

    painter.text(plot.left_top(), Align2::RIGHT_CENTER, format_number(max), small.clone(), MUTED);
    painter.text(plot.left_bottom(), Align2::RIGHT_CENTER, format_number(min), small.clone(), MUTED);
    for (i, row) in rows.iter().enumerate() {
        painter.text(
            pos2(plot.left() + step * i as f32, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            &row.year,
            small.clone(),
            MUTED,
        );
    }

    for (n, company_id) in series.iter().enumerate() {
        let color = SERIES_COLORS[n % SERIES_COLORS.len()];
        let points: Vec<_> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                row.values
                    .iter()
                    .find(|(id, _)| id == company_id)
                    .map(|(_, v)| at(i, *v))
            })
            .collect();
        if points.len() > 1 {
            painter.add(Shape::line(points.clone(), Stroke::new(2.0, color)));
        }
        for p in points {
            painter.circle_filled(p, 3.0, color);
        }
    }

    response
}

use egui::emath::RectTransform;
use egui::epaint::{CircleShape, Mesh};
use egui::{Align2, Color32, CursorIcon, FontId, Rect, Response, Sense, Shape, Stroke, Ui, Vec2, Widget};

use super::geometry::WorldGeometry;
use super::interaction::{DrawCommand, MapController, MapEvent, MapInputs, MapState, PointerInput, PIN_RADIUS};
use super::projection::CANVAS_SIZE;

const LABEL_FILL: Color32 = Color32::from_rgba_premultiplied(24, 32, 46, 230);

/// Egui front end of [`MapController`]. Translates pointer activity into
/// canvas coordinates, paints whatever the controller renders and hands
/// proposed changes back through `events`.
pub struct WorldMap<'a> {
    controller: &'a mut MapController,
    inputs: MapInputs<'a>,
    events: &'a mut Vec<MapEvent>,
    width: f32,
}

impl<'a> WorldMap<'a> {
    pub fn new(controller: &'a mut MapController, inputs: MapInputs<'a>, events: &'a mut Vec<MapEvent>) -> Self {
        Self {
            controller,
            inputs,
            events,
            width: CANVAS_SIZE.x,
        }
    }

    /// Display width; height follows the canvas aspect ratio.
    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }
}

impl<'a> Widget for WorldMap<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        let size = Vec2::new(self.width, self.width * CANVAS_SIZE.y / CANVAS_SIZE.x);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        let to_screen = RectTransform::from_to(Rect::from_min_size(egui::Pos2::ZERO, CANVAS_SIZE), rect);
        let to_canvas = to_screen.inverse();

        // Handle interactions
        let mut inputs_seen = Vec::new();
        if response.drag_started() {
            if let Some(origin) = ui.input(|i| i.pointer.press_origin()) {
                inputs_seen.push(PointerInput::Press(to_canvas.transform_pos(origin)));
            }
        }
        match response.interact_pointer_pos().or_else(|| response.hover_pos()) {
            Some(pos) => inputs_seen.push(PointerInput::Move(to_canvas.transform_pos(pos))),
            None => inputs_seen.push(PointerInput::Leave),
        }
        if response.drag_stopped() {
            if let Some(pos) = ui.input(|i| i.pointer.interact_pos()) {
                inputs_seen.push(PointerInput::Release(to_canvas.transform_pos(pos)));
            }
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                inputs_seen.push(PointerInput::Click(to_canvas.transform_pos(pos)));
            }
        }

        for input in inputs_seen {
            if let Some(event) = self.controller.handle(input, &self.inputs) {
                log::debug!("map event: {:?}", event);
                self.events.push(event);
            }
        }

        if self.inputs.edit_mode {
            match self.controller.state() {
                MapState::Dragging { .. } => ui.ctx().set_cursor_icon(CursorIcon::Grabbing),
                MapState::Hovering { .. } => ui.ctx().set_cursor_icon(CursorIcon::PointingHand),
                _ => {}
            }
        }

        let painter = ui.painter().with_clip_rect(rect);
        let commands = self.controller.render(&self.inputs);
        paint(&painter, &to_screen, self.controller.geometry().map(|g| g.as_ref()), commands);

        response
    }
}

fn paint(painter: &egui::Painter, to_screen: &RectTransform, geometry: Option<&WorldGeometry>, commands: Vec<DrawCommand>) {
    let scale = to_screen.scale().x;

    for command in commands {
        match command {
            DrawCommand::Background { rect, fill, rounding } => {
                painter.rect_filled(to_screen.transform_rect(rect), rounding, fill);
            }
            DrawCommand::Country { index, fill, stroke } => {
                let Some(country) = geometry.and_then(|g| g.country(index)) else {
                    continue;
                };
                let mut mesh = Mesh::default();
                for vertex in &country.fill_vertices {
                    mesh.colored_vertex(to_screen.transform_pos(*vertex), fill);
                }
                for [a, b, c] in &country.triangles {
                    mesh.add_triangle(*a, *b, *c);
                }
                painter.add(Shape::from(mesh));

                for ring in country.polygons.iter().flatten() {
                    let points = ring.iter().map(|p| to_screen.transform_pos(*p)).collect();
                    painter.add(Shape::closed_line(points, stroke));
                }
            }
            DrawCommand::Pin { center, fill, stroke, .. } => {
                painter.add(CircleShape {
                    center: to_screen.transform_pos(center),
                    radius: PIN_RADIUS * scale,
                    fill,
                    stroke: Stroke::new(stroke.width * scale, stroke.color),
                });
            }
            DrawCommand::Label { pos, text } => {
                let galley = painter.layout_no_wrap(text, FontId::proportional(12.0), Color32::WHITE);
                let at = to_screen.transform_pos(pos);
                let frame = Rect::from_min_size(at, galley.size()).expand(4.0);
                painter.rect(frame, 4.0, LABEL_FILL, Stroke::new(1.0, Color32::from_gray(90)));
                painter.galley(at, galley, Color32::WHITE);
            }
            DrawCommand::Status { text } => {
                painter.text(
                    to_screen.to().center(),
                    Align2::CENTER_CENTER,
                    text,
                    FontId::proportional(14.0),
                    Color32::LIGHT_GRAY,
                );
            }
        }
    }
}

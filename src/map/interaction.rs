//! The world map as a state machine. Pointer input moves it between
//! states and may propose a change to the caller; [`MapController::render`]
//! turns the current state plus caller-owned inputs into a full list of
//! draw commands. Nothing here mutates caller data.

use std::sync::Arc;

use egui::{vec2, Color32, Pos2, Rect, Stroke};

use super::geometry::WorldGeometry;
use super::projection::Coordinate;
use crate::error::OutreachError;
use crate::model::GeoLocation;

pub const BACKGROUND_COLOR: Color32 = Color32::from_rgb(0x1e, 0x29, 0x3b);
pub const COUNTRY_COLOR: Color32 = Color32::from_rgb(0x47, 0x55, 0x69);
pub const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(0x37, 0xa3, 0xc3);
pub const HOVER_COLOR: Color32 = Color32::from_rgb(0xba, 0xe6, 0xfd);
pub const BORDER_COLOR: Color32 = Color32::from_rgb(0x33, 0x41, 0x55);
pub const DRAG_COLOR: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);

pub const BORDER_WIDTH: f32 = 0.5;
pub const PIN_RADIUS: f32 = 6.0;
pub const PIN_STROKE_WIDTH: f32 = 2.0;
const PIN_GRAB_SLOP: f32 = 2.0;
const LABEL_OFFSET: f32 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub enum MapState {
    /// Boundary data has not arrived, or never will (`failure` is set).
    Uninitialized { failure: Option<String> },
    Idle,
    Hovering { country: usize, pointer: Pos2 },
    Dragging { pin_id: String, pointer: Pos2 },
}

/// Pointer activity in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Move(Pos2),
    Leave,
    Press(Pos2),
    Release(Pos2),
    Click(Pos2),
}

/// Changes the map proposes to whoever owns the company record.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    CountryToggled(String),
    PinMoved { id: String, lat: f64, lng: f64 },
}

/// Caller-owned data the map is drawn from.
#[derive(Debug, Clone, Copy)]
pub struct MapInputs<'a> {
    pub locations: &'a [GeoLocation],
    pub highlighted: &'a [String],
    pub edit_mode: bool,
}

impl MapInputs<'_> {
    fn is_highlighted(&self, name: &str) -> bool {
        self.highlighted.iter().any(|h| h == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Background { rect: Rect, fill: Color32, rounding: f32 },
    /// Country geometry is looked up by index in [`WorldGeometry`].
    Country { index: usize, fill: Color32, stroke: Stroke },
    Pin { id: String, title: String, center: Pos2, fill: Color32, stroke: Stroke },
    Label { pos: Pos2, text: String },
    Status { text: String },
}

pub struct MapController {
    geometry: Option<Arc<WorldGeometry>>,
    state: MapState,
}

impl Default for MapController {
    fn default() -> Self {
        Self {
            geometry: None,
            state: MapState::Uninitialized { failure: None },
        }
    }
}

impl MapController {
    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn geometry(&self) -> Option<&Arc<WorldGeometry>> {
        self.geometry.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, MapState::Dragging { .. })
    }

    pub fn boundaries_loaded(&mut self, geometry: Arc<WorldGeometry>) {
        self.geometry = Some(geometry);
        self.state = MapState::Idle;
    }

    /// The map stays uninitialized for good; the failure is kept for display.
    pub fn boundaries_failed(&mut self, error: &OutreachError) {
        log::error!("world map unavailable: {}", error);
        self.geometry = None;
        self.state = MapState::Uninitialized {
            failure: Some(error.to_string()),
        };
    }

    pub fn handle(&mut self, input: PointerInput, inputs: &MapInputs<'_>) -> Option<MapEvent> {
        let geometry = self.geometry.clone()?;

        match input {
            PointerInput::Move(pointer) => {
                if let MapState::Dragging { pointer: p, .. } = &mut self.state {
                    *p = pointer;
                    return None;
                }
                self.state = if self.pin_at(&geometry, pointer, inputs).is_some() {
                    MapState::Idle
                } else {
                    match geometry.country_at(pointer) {
                        Some(country) => MapState::Hovering { country, pointer },
                        None => MapState::Idle,
                    }
                };
                None
            }
            PointerInput::Leave => {
                if !self.is_dragging() {
                    self.state = MapState::Idle;
                }
                None
            }
            PointerInput::Press(pointer) => {
                if !inputs.edit_mode || self.is_dragging() {
                    return None;
                }
                if let Some(pin_id) = self.pin_at(&geometry, pointer, inputs) {
                    log::debug!("dragging pin {}", pin_id);
                    self.state = MapState::Dragging { pin_id, pointer };
                }
                None
            }
            PointerInput::Release(pointer) => {
                if !self.is_dragging() {
                    return None;
                }
                let MapState::Dragging { pin_id, .. } = std::mem::replace(&mut self.state, MapState::Idle) else {
                    return None;
                };
                let coordinate = geometry.projection().unproject(pointer)?;
                Some(MapEvent::PinMoved {
                    id: pin_id,
                    lat: coordinate.latitude(),
                    lng: coordinate.longitude(),
                })
            }
            PointerInput::Click(pointer) => {
                if !inputs.edit_mode || self.pin_at(&geometry, pointer, inputs).is_some() {
                    return None;
                }
                let country = geometry.country_at(pointer)?;
                geometry
                    .country(country)
                    .map(|c| MapEvent::CountryToggled(c.name.clone()))
            }
        }
    }

    /// Topmost pin within grabbing distance of `pointer`.
    fn pin_at(&self, geometry: &WorldGeometry, pointer: Pos2, inputs: &MapInputs<'_>) -> Option<String> {
        let reach = PIN_RADIUS + PIN_GRAB_SLOP;
        inputs
            .locations
            .iter()
            .rev()
            .find(|loc| {
                let center = geometry.projection().project(Coordinate::new(loc.lat, loc.lng));
                center.distance(pointer) <= reach
            })
            .map(|loc| loc.id.clone())
    }

    /// Full redraw from the current inputs. Calling this twice with the
    /// same inputs and state yields the same commands.
    pub fn render(&self, inputs: &MapInputs<'_>) -> Vec<DrawCommand> {
        let Some(geometry) = &self.geometry else {
            let text = match &self.state {
                MapState::Uninitialized { failure: Some(reason) } => format!("Map unavailable: {}", reason),
                _ => "Loading map…".to_string(),
            };
            return vec![
                background(super::projection::CANVAS_SIZE),
                DrawCommand::Status { text },
            ];
        };

        let projection = geometry.projection();
        let mut commands = Vec::with_capacity(geometry.countries().len() + inputs.locations.len() + 2);
        commands.push(background(projection.canvas_size()));

        let hovered = match &self.state {
            MapState::Hovering { country, pointer } => Some((*country, *pointer)),
            _ => None,
        };

        for (index, country) in geometry.countries().iter().enumerate() {
            let (fill, stroke) = if hovered.is_some_and(|(h, _)| h == index) {
                (HOVER_COLOR, Stroke::new(BORDER_WIDTH, Color32::WHITE))
            } else if inputs.is_highlighted(&country.name) {
                (HIGHLIGHT_COLOR, Stroke::new(BORDER_WIDTH, BORDER_COLOR))
            } else {
                (COUNTRY_COLOR, Stroke::new(BORDER_WIDTH, BORDER_COLOR))
            };
            commands.push(DrawCommand::Country { index, fill, stroke });
        }

        let dragging = match &self.state {
            MapState::Dragging { pin_id, pointer } => Some((pin_id.as_str(), *pointer)),
            _ => None,
        };

        let mut dragged_pin = None;
        for location in inputs.locations {
            let center = projection.project(Coordinate::new(location.lat, location.lng));
            match dragging {
                // Drawn last, at the pointer, so it sits above the others.
                Some((id, pointer)) if id == location.id => dragged_pin = Some(pin(location, pointer, DRAG_COLOR)),
                _ => commands.push(pin(location, center, HIGHLIGHT_COLOR)),
            }
        }
        commands.extend(dragged_pin);

        if let Some((index, pointer)) = hovered {
            if let Some(country) = geometry.country(index) {
                commands.push(DrawCommand::Label {
                    pos: pointer + vec2(LABEL_OFFSET, LABEL_OFFSET),
                    text: country.name.clone(),
                });
            }
        }

        commands
    }
}

fn background(size: egui::Vec2) -> DrawCommand {
    DrawCommand::Background {
        rect: Rect::from_min_size(Pos2::ZERO, size),
        fill: BACKGROUND_COLOR,
        rounding: 8.0,
    }
}

fn pin(location: &GeoLocation, center: Pos2, stroke_color: Color32) -> DrawCommand {
    DrawCommand::Pin {
        id: location.id.clone(),
        title: location.name.clone(),
        center,
        fill: Color32::WHITE,
        stroke: Stroke::new(PIN_STROKE_WIDTH, stroke_color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::boundary::tests::TWO_SQUARES;
    use crate::map::boundary::BoundaryDataset;
    use crate::map::projection::MercatorProjection;
    use crate::model::{Company, LocationKind};
    use approx::assert_abs_diff_eq;

    fn loaded() -> MapController {
        let dataset = BoundaryDataset::from_geojson(TWO_SQUARES.as_bytes(), "name").unwrap();
        let mut controller = MapController::default();
        controller.boundaries_loaded(Arc::new(WorldGeometry::new(&dataset, MercatorProjection::default())));
        controller
    }

    fn canvas(lat: f64, lng: f64) -> Pos2 {
        MercatorProjection::default().project(Coordinate::new(lat, lng))
    }

    fn pin_at(id: &str, lat: f64, lng: f64) -> GeoLocation {
        GeoLocation {
            id: id.to_string(),
            name: format!("Site {}", id),
            lat,
            lng,
            kind: LocationKind::Operation,
        }
    }

    /// Fill of every country in the command list, by name.
    fn fills(controller: &MapController, commands: &[DrawCommand]) -> Vec<(String, Color32)> {
        let geometry = controller.geometry().unwrap();
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Country { index, fill, .. } => Some((geometry.countries()[*index].name.clone(), *fill)),
                _ => None,
            })
            .collect()
    }

    fn pins(commands: &[DrawCommand]) -> Vec<(&str, Pos2, Color32)> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Pin { id, center, stroke, .. } => Some((id.as_str(), *center, stroke.color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn uninitialized_map_draws_no_countries() {
        let controller = MapController::default();
        let inputs = MapInputs { locations: &[pin_at("a", 0.0, 0.0)], highlighted: &[], edit_mode: true };
        let commands = controller.render(&inputs);

        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[1], DrawCommand::Status { .. }));
    }

    #[test]
    fn failed_fetch_stays_uninitialized() {
        let mut controller = MapController::default();
        controller.boundaries_failed(&OutreachError::DataUnavailable("offline".into()));
        let inputs = MapInputs { locations: &[], highlighted: &[], edit_mode: true };

        assert!(controller.handle(PointerInput::Click(canvas(0.0, -10.0)), &inputs).is_none());
        assert!(matches!(controller.state(), MapState::Uninitialized { failure: Some(_) }));
        match &controller.render(&inputs)[1] {
            DrawCommand::Status { text } => assert!(text.contains("offline")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fill_follows_highlight_membership() {
        let controller = loaded();
        let highlighted = vec!["Eastland".to_string()];
        let inputs = MapInputs { locations: &[], highlighted: &highlighted, edit_mode: false };

        let fills = fills(&controller, &controller.render(&inputs));
        assert_eq!(
            fills,
            vec![("Eastland".to_string(), HIGHLIGHT_COLOR), ("Westland".to_string(), COUNTRY_COLOR)]
        );
    }

    #[test]
    fn toggle_then_rerender_matches_fresh_render() {
        let mut controller = loaded();
        let mut company = Company::new_default("Ivanhoe Mines");
        company.highlighted_countries = vec!["Eastland".to_string()];

        let click = PointerInput::Click(canvas(0.0, -10.0));
        let event = {
            let inputs = MapInputs { locations: &[], highlighted: &company.highlighted_countries, edit_mode: true };
            controller.handle(click, &inputs)
        };
        assert_eq!(event, Some(MapEvent::CountryToggled("Westland".to_string())));
        company.toggle_highlight("Westland");

        let inputs = MapInputs { locations: &[], highlighted: &company.highlighted_countries, edit_mode: true };
        let after_toggle = fills(&controller, &controller.render(&inputs));
        let fresh = fills(&loaded(), &loaded().render(&inputs));
        assert_eq!(after_toggle, fresh);
        assert!(after_toggle.iter().all(|(_, fill)| *fill == HIGHLIGHT_COLOR));
    }

    #[test]
    fn renderer_never_mutates_the_highlight_set() {
        let mut controller = loaded();
        let highlighted: Vec<String> = Vec::new();
        let inputs = MapInputs { locations: &[], highlighted: &highlighted, edit_mode: true };

        controller.handle(PointerInput::Click(canvas(0.0, 10.0)), &inputs);
        let fills = fills(&controller, &controller.render(&inputs));
        assert!(fills.iter().all(|(_, fill)| *fill == COUNTRY_COLOR));
    }

    #[test]
    fn hover_recolors_and_reverts_to_current_membership() {
        let mut controller = loaded();
        let mut highlighted: Vec<String> = Vec::new();
        let west = canvas(0.0, -10.0);

        let inputs = MapInputs { locations: &[], highlighted: &highlighted, edit_mode: true };
        controller.handle(PointerInput::Move(west), &inputs);
        let commands = controller.render(&inputs);
        assert!(fills(&controller, &commands).contains(&("Westland".to_string(), HOVER_COLOR)));
        assert!(commands.iter().any(|c| matches!(
            c,
            DrawCommand::Label { text, pos } if text == "Westland" && *pos == west + vec2(15.0, 15.0)
        )));

        // Highlight changes while hovering; leaving must show the new value.
        highlighted.push("Westland".to_string());
        let inputs = MapInputs { locations: &[], highlighted: &highlighted, edit_mode: true };
        controller.handle(PointerInput::Leave, &inputs);
        let commands = controller.render(&inputs);
        assert_eq!(controller.state(), &MapState::Idle);
        assert!(fills(&controller, &commands).contains(&("Westland".to_string(), HIGHLIGHT_COLOR)));
        assert!(!commands.iter().any(|c| matches!(c, DrawCommand::Label { .. })));
    }

    #[test]
    fn moving_over_open_sea_goes_idle() {
        let mut controller = loaded();
        let inputs = MapInputs { locations: &[], highlighted: &[], edit_mode: false };
        controller.handle(PointerInput::Move(canvas(0.0, 10.0)), &inputs);
        assert!(matches!(controller.state(), MapState::Hovering { .. }));
        controller.handle(PointerInput::Move(canvas(-40.0, -100.0)), &inputs);
        assert_eq!(controller.state(), &MapState::Idle);
    }

    #[test]
    fn render_is_idempotent() {
        let mut controller = loaded();
        let locations = vec![pin_at("a", -26.2, 28.0), pin_at("b", 5.0, 5.0)];
        let highlighted = vec!["Westland".to_string()];
        let inputs = MapInputs { locations: &locations, highlighted: &highlighted, edit_mode: true };
        controller.handle(PointerInput::Move(canvas(0.0, -10.0)), &inputs);

        let first = controller.render(&inputs);
        let second = controller.render(&inputs);
        assert_eq!(first, second);
        assert_eq!(pins(&first).len(), 2);
    }

    #[test]
    fn drag_moves_pin_and_reports_new_coordinates() {
        let mut controller = loaded();
        let locations = vec![pin_at("a", 0.0, 0.0), pin_at("b", 5.0, 5.0)];
        let inputs = MapInputs { locations: &locations, highlighted: &[], edit_mode: true };

        let start = canvas(5.0, 5.0) + vec2(1.0, 1.0);
        assert!(controller.handle(PointerInput::Press(start), &inputs).is_none());
        assert!(matches!(controller.state(), MapState::Dragging { pin_id, .. } if pin_id == "b"));

        let target = canvas(-26.2, 28.0);
        controller.handle(PointerInput::Move(target), &inputs);
        let rendered = controller.render(&inputs);
        let during = pins(&rendered);
        // The dragged pin follows the pointer exactly and is drawn last.
        assert_eq!(during.last(), Some(&("b", target, DRAG_COLOR)));
        assert_eq!(during[0].2, HIGHLIGHT_COLOR);

        match controller.handle(PointerInput::Release(target), &inputs) {
            Some(MapEvent::PinMoved { id, lat, lng }) => {
                assert_eq!(id, "b");
                assert_abs_diff_eq!(lat, -26.2, epsilon = 1e-3);
                assert_abs_diff_eq!(lng, 28.0, epsilon = 1e-3);
            }
            other => panic!("expected a pin move, got {:?}", other),
        }
        assert_eq!(controller.state(), &MapState::Idle);
    }

    #[test]
    fn read_only_map_ignores_clicks_and_drags() {
        let mut controller = loaded();
        let locations = vec![pin_at("a", 0.0, -10.0)];
        let inputs = MapInputs { locations: &locations, highlighted: &[], edit_mode: false };

        assert!(controller.handle(PointerInput::Click(canvas(5.0, 10.0)), &inputs).is_none());
        assert!(controller.handle(PointerInput::Press(canvas(0.0, -10.0)), &inputs).is_none());
        assert!(!controller.is_dragging());
        assert!(controller.handle(PointerInput::Release(canvas(3.0, 3.0)), &inputs).is_none());
    }

    #[test]
    fn clicking_a_pin_does_not_toggle_the_country_beneath() {
        let mut controller = loaded();
        let locations = vec![pin_at("a", 0.0, -10.0)];
        let inputs = MapInputs { locations: &locations, highlighted: &[], edit_mode: true };

        assert!(controller.handle(PointerInput::Click(canvas(0.0, -10.0)), &inputs).is_none());
        assert_eq!(
            controller.handle(PointerInput::Click(canvas(5.0, -15.0)), &inputs),
            Some(MapEvent::CountryToggled("Westland".to_string()))
        );
    }

    #[test]
    fn unprojectable_pins_render_at_the_origin() {
        let controller = loaded();
        let locations = vec![pin_at("bad", f64::NAN, 0.0)];
        let inputs = MapInputs { locations: &locations, highlighted: &[], edit_mode: false };
        assert_eq!(pins(&controller.render(&inputs)), vec![("bad", Pos2::ZERO, HIGHLIGHT_COLOR)]);
    }
}

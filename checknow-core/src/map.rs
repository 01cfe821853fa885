//! Bridge between a map widget and the search controller.
//!
//! The adapter never touches search state: double-clicks become
//! [`Event::MapDoubleClick`], recenter effects move the viewport, and the
//! marker is derived from the selected position alone.

use crate::model::Coordinates;
use crate::workflow::{Effect, Event};

/// Initial view: centered on Guatemala.
pub const DEFAULT_CENTER: Coordinates = Coordinates { lat: 15.7835, lon: -90.2308 };
pub const DEFAULT_ZOOM: u8 = 6;

/// Raw input from the map widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    DoubleClick { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinates,
    pub popup: String,
}

/// No selection, no marker.
pub fn marker(selected: Option<Coordinates>) -> Option<Marker> {
    selected.map(|position| Marker { position, popup: format!("Location: {position}") })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self { center: DEFAULT_CENTER, zoom: DEFAULT_ZOOM }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapAdapter {
    view: MapView,
}

impl MapAdapter {
    pub fn new(view: MapView) -> Self {
        Self { view }
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    /// Double-clicks are forwarded as-is; range checks belong to the controller.
    pub fn translate(&self, event: MapEvent) -> Event {
        match event {
            MapEvent::DoubleClick { lat, lon } => Event::MapDoubleClick(Coordinates::new(lat, lon)),
        }
    }

    /// Apply viewport side effects; returns whether the view moved.
    pub fn apply(&mut self, effects: &[Effect]) -> bool {
        let mut moved = false;
        for effect in effects {
            if let Effect::Recenter { center, zoom } = effect {
                self.view = MapView { center: *center, zoom: *zoom };
                moved = true;
            }
        }
        moved
    }
}

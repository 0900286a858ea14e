use crate::types::Coords;

/// Zoom level used when flying to a single workout.
pub const DEFAULT_ZOOM: u8 = 13;
/// Padding (px) around the region shown by "fit all".
pub const DEFAULT_FIT_PADDING: u32 = 50;
/// Shown when no position is supplied (Cairo).
pub const FALLBACK_POSITION: Coords = Coords {
    lat: 30.044968,
    lng: 31.244174,
};

/// Map behaviour shared by the marker layer and the application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    pub zoom: u8,
    pub fit_padding: u32,
    pub fallback_position: Coords,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            fit_padding: DEFAULT_FIT_PADDING,
            fallback_position: FALLBACK_POSITION,
        }
    }
}

impl MapConfig {
    /// `requested` if both halves are present, otherwise the fallback position.
    pub fn position_or_fallback(&self, lat: Option<f64>, lng: Option<f64>) -> (f64, f64) {
        match (lat, lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                tracing::info!(
                    lat = self.fallback_position.lat,
                    lng = self.fallback_position.lng,
                    "no position given, using fallback"
                );
                (self.fallback_position.lat, self.fallback_position.lng)
            }
        }
    }
}

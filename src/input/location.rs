use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// Latest value of the device location signal
///
/// Permission prompts and sensor errors are the geolocation provider's
/// business; the map only sees whether a fix is usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeolocationState {
    pub is_available: bool,
    pub is_enabled: bool,
    pub coords: Option<LatLng>,
}

impl GeolocationState {
    /// Available, permitted and located
    pub fn located(coords: LatLng) -> Self {
        Self {
            is_available: true,
            is_enabled: true,
            coords: Some(coords),
        }
    }

    /// Available but the user denied or has not yet granted access
    pub fn denied() -> Self {
        Self {
            is_available: true,
            is_enabled: false,
            coords: None,
        }
    }

    /// Coordinates, only when the signal is available, enabled and has a fix
    pub fn usable_coords(&self) -> Option<LatLng> {
        if self.is_available && self.is_enabled {
            self.coords
        } else {
            None
        }
    }
}

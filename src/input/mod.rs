pub mod events;
pub mod location;

// Re-export the essential types
pub use events::ViewEvent;
pub use location::GeolocationState;

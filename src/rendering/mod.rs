pub mod headless;

// Re-export main types
pub use headless::{HeadlessEngine, HeadlessMap, MarkerRecord};

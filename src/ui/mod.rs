pub mod popup;

pub use popup::{photo_url, PopupContent};

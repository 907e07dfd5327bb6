mod points;

pub mod helpers;
mod secret;

pub use points::{Points, PointsConversionError};
pub use secret::Secret;

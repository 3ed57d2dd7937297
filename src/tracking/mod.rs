//! Courier location tracking: the geolocation sensor seam and the
//! reporter that forwards position samples into the order store.

pub mod reporter;
pub mod sensor;

pub use reporter::LocationReporter;
pub use sensor::{
    acquire_position, GeoError, GeoSensor, Position, PositionOptions, ScriptedSensor,
};

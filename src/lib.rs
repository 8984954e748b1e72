pub mod aggregate;
pub mod altitude;
pub mod buffer;
pub mod color;
pub mod config;
pub mod error;
pub mod extract;
pub mod kml_writer;
pub mod point;
pub mod polygon;
pub mod projection;
pub mod units;

pub use error::{Error, Result};

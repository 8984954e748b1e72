use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid buffer size: '{0}'")]
    InvalidFormat(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("projection error: {0}")]
    Projection(String),

    #[error("no valid polygon in input")]
    NoPolygons,

    #[error("no valid buffer size")]
    NoBufferSizes,

    #[error("KML write error: {0}")]
    Kml(#[from] kml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

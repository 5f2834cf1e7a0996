pub mod blobs;
pub mod geocode;

pub use blobs::{BlobError, BlobStore};
pub use geocode::{Coordinates, GeocodeClient, GeocodeError};

pub mod document_get;
pub mod download;
pub mod search;
pub mod upload;

pub use document_get::document_get;
pub use download::{download, DownloadTarget};
pub use search::search;
pub use upload::upload;

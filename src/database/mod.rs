pub mod models;
pub mod sqlite;
pub mod store;

pub use models::{DocumentRecord, DocumentType, NewDocument, SearchParams};
pub use sqlite::SqliteDocumentStore;
pub use store::{DocumentStore, StoreError};

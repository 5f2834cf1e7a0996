pub mod tenant_keys;

pub use tenant_keys::issue_key;

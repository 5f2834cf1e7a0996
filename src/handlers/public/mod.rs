// handlers/public/mod.rs - Public handlers (no key required)
//
// Security Level: None
// Routes: /, /library, /health, /api/geocode

pub mod geocode;
pub mod health;
pub mod ui;

pub use geocode::geocode;
pub use health::health;
pub use ui::index;

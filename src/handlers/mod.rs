// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no key) -> Protected (tenant key) -> Elevated (admin secret)
pub mod elevated;
pub mod protected;
pub mod public;

// handlers/elevated/mod.rs - Elevated handlers (admin secret required)
//
// Security Level: admin secret, independent of tenant keys
// Route Prefix: /api/admin/*
// Middleware: middleware::admin_key_middleware

pub mod admin;

pub use admin::*;

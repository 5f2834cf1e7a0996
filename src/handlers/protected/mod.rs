// handlers/protected/mod.rs - Protected handlers (tenant API key required)
//
// Security Level: tenant key, when the tenant (or the global fallback) has one
// Route Prefix: /api/library/*
// Middleware: middleware::tenant_key_middleware

pub mod library;

pub use library::*;

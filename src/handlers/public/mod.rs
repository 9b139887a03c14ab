// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition lives here. Route prefix: /auth/*
pub mod auth;

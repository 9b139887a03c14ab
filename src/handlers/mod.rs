// handlers/mod.rs - Handler tiers
//
// Public (no auth) -> Protected (bearer token, optionally role-gated).
// The tier is enforced by the router, not by the handlers themselves.
pub mod health;
pub mod protected;
pub mod public;

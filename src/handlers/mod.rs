// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, capability checks per route)

pub mod protected;
pub mod public;

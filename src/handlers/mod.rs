// handlers/mod.rs - Two handler tiers
//
// Public (no auth) → Protected (API key → rate limit → permission)
pub mod access;
pub mod public;

// === PUBLIC CONTRACT ===
// Only the contract module should be public for other modules to consume
pub mod contract;

// Re-export the public contract components
pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::PortalCore;

// === PRESENTATION FACADE ===
pub mod views;
pub use views::{ApplicationCard, Dashboard};

// === INTERNAL MODULES ===
// Exposed for wiring adapters and for tests; the contract module is the
// stable surface.
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;

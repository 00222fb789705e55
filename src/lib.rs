// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod backend;
pub mod clock;
pub mod config;
pub mod controller;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod snapshot;
pub mod task;
pub mod util;
pub mod violations;

/// Event-loop tick interval. The countdown and the idle poll both derive
/// from it, so the binary and the library must agree on the value.
pub const TICK_RATE_MS: u64 = 100;

// Everything the headless/integration tests need lives here; rendering
// and key dispatch stay bin-only in main.rs.
pub mod config;
pub mod dataset;
pub mod normalize;
pub mod run;
pub mod runtime;

/// Interval of the UI tick driving the countdown and the result-flash TTL.
pub const TICK_RATE_MS: u64 = 100;

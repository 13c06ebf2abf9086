// THEORY:
// This file is the main entry point for the `vigil_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API that will be exposed to external consumers (a desktop shell, a
// headless watcher, the bundled demo binary).
//
// The primary goal is to export the `MonitorRuntime` and `MonitorSession`
// along with their associated data structures (`MonitorConfig`,
// `TickSettings`, `MonitorStatus`, etc.) as the clean, high-level interface
// for the whole monitor. The internal building blocks live under
// `core_modules` and are re-exported selectively through `monitor`.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod monitor;
pub mod runtime;
pub mod sources;

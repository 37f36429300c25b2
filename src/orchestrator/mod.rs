//! Application-level orchestration utilities.
//!
//! This module owns the busy gate and request dispatch for the interactive
//! surface. UI layers send commands and consume events; validation and
//! single-flight enforcement happen here, not in presentation code.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};

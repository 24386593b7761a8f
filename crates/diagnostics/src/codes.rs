//! Failure reason code constants.
//!
//! Auto-generated from `spec/reasons.json` at build time.
//! Use these instead of string literals to get compile-time typo detection.

include!(concat!(env!("OUT_DIR"), "/generated_codes.rs"));

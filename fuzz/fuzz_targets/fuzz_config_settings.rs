//! Fuzz target for settings TOML parsing.
//!
//! Tests that settings parsing and validation handle arbitrary input
//! without panicking.

#![no_main]

use cb_core::config::Settings;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(settings) = Settings::from_toml_str(data) {
        let _ = settings.validate();
    }
});

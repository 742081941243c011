//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! Feeds arbitrary text to `AppConfig::parse()`, which parses and validates.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = inscription_config::AppConfig::parse(s) {
            // Anything that parsed must have passed validation.
            assert!(config.validate().is_ok());
            assert_ne!(config.server.port, 0);
        }
    }
});

//! Fuzz target for command-line and catalog-line parsing.
//!
//! Run with: cargo +nightly fuzz run fuzz_command_parser
//!
//! The first byte picks a session; the rest is used both as a command line and
//! as a course listing.

#![no_main]

use inscription_core::catalog::parse_listing;
use inscription_core::{Command, Session};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(line) = std::str::from_utf8(rest) else {
        return;
    };

    let command = Command::parse(line);
    assert!(!command.verb.contains(' '));
    assert!(line.starts_with(command.verb.as_str()));

    let session = Session::ALL[selector as usize % Session::ALL.len()];
    for course in parse_listing(line, session.as_str()) {
        assert_eq!(course.session, session);
        assert!(!course.code.contains('\t'));
    }
});

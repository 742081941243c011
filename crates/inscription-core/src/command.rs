//! Command line parsing.
//!
//! A command line is a verb followed by an optional argument, separated by a
//! single space: `CHARGER Automne`, `INSCRIRE`.

use std::fmt;

use crate::model::Session;

/// Load the courses of a session. Argument: the session name.
pub const LOAD_VERB: &str = "CHARGER";

/// Register a student. No argument; a registration form follows.
pub const REGISTER_VERB: &str = "INSCRIRE";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: String,
    /// Everything after the verb. Empty, never absent, when there is none.
    pub argument: String,
}

impl Command {
    /// Split `line` into a verb and an argument.
    ///
    /// Tokens are separated by single spaces. Trailing empty tokens are
    /// dropped, interior ones are kept, so `"CHARGER  Hiver"` has the
    /// argument `" Hiver"` while `"CHARGER "` has an empty argument.
    pub fn parse(line: &str) -> Self {
        let mut tokens: Vec<&str> = line.split(' ').collect();
        while tokens.len() > 1 && tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }
        let verb = tokens.first().copied().unwrap_or_default();
        let argument = tokens.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
        Self {
            verb: verb.to_string(),
            argument,
        }
    }

    pub fn new(verb: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            argument: argument.into(),
        }
    }

    /// `CHARGER <session>`.
    pub fn load(session: &str) -> Self {
        Self::new(LOAD_VERB, session)
    }

    /// `CHARGER` for a known session.
    pub fn load_session(session: Session) -> Self {
        Self::load(session.as_str())
    }

    /// `INSCRIRE`.
    pub fn register() -> Self {
        Self::new(REGISTER_VERB, "")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.argument.is_empty() {
            f.write_str(&self.verb)
        } else {
            write!(f, "{} {}", self.verb, self.argument)
        }
    }
}

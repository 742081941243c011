//! Domain values exchanged over the wire and stored in the flat files.

use std::fmt;
use std::str::FromStr;

use inscription_macros::Validate;
use serde::{Deserialize, Serialize};

/// An academic term. Unrelated to a network connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    Automne,
    Hiver,
    Ete,
}

impl Session {
    pub const ALL: [Session; 3] = [Session::Automne, Session::Hiver, Session::Ete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Automne => "Automne",
            Session::Hiver => "Hiver",
            Session::Ete => "Ete",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names none of the three sessions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session {0:?} (expected Automne, Hiver or Ete)")]
pub struct UnknownSession(pub String);

impl FromStr for Session {
    type Err = UnknownSession;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Session::ALL
            .into_iter()
            .find(|session| session.as_str() == s)
            .ok_or_else(|| UnknownSession(s.to_string()))
    }
}

/// A course offered during one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Course {
    /// Display name. Clients may leave it empty when only referencing a course.
    pub name: String,
    #[validate(non_empty)]
    pub code: String,
    pub session: Session,
}

impl Course {
    pub fn new(name: impl Into<String>, code: impl Into<String>, session: Session) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            session,
        }
    }
}

/// A registration request for one student in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(non_empty, pattern = r"^[^\t\r\n]+$")]
    pub first_name: String,
    #[validate(non_empty, pattern = r"^[^\t\r\n]+$")]
    pub last_name: String,
    #[validate(
        non_empty,
        pattern = r"^[A-Za-z0-9_.\-]+@([A-Za-z0-9_\-]+\.)+[A-Za-z0-9_\-]{2,}$"
    )]
    pub email: String,
    #[validate(non_empty, pattern = r"^[0-9]{8}$")]
    pub student_id: String,
    #[validate(nested)]
    pub course: Course,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            email: "ana@x.com".to_string(),
            student_id: "12345678".to_string(),
            course: Course::new("", "INF1010", Session::Automne),
        }
    }

    #[test]
    fn test_session_parse_is_exact() {
        assert_eq!("Hiver".parse::<Session>().unwrap(), Session::Hiver);
        assert!("hiver".parse::<Session>().is_err());
        assert!(" Ete".parse::<Session>().is_err());
        assert!("Printemps".parse::<Session>().is_err());
    }

    #[test]
    fn test_session_display_matches_wire_form() {
        for session in Session::ALL {
            let json = serde_json::to_string(&session).unwrap();
            assert_eq!(json, format!("\"{session}\""));
        }
    }

    #[test]
    fn test_valid_form_without_course_name() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_form_rejects_empty_fields() {
        let mut f = form();
        f.first_name.clear();
        f.email.clear();
        let errors = f.validate().unwrap_err();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("first_name")));
        assert!(errors.iter().any(|e| e.starts_with("email")));
    }

    #[test]
    fn test_form_rejects_bad_email() {
        for email in ["ana", "ana@x", "ana@x.c", "a na@x.com", "@x.com"] {
            let mut f = form();
            f.email = email.to_string();
            assert!(f.validate().is_err(), "accepted {email:?}");
        }
        let mut f = form();
        f.email = "ana.lee-2@umontreal.ca".to_string();
        assert!(f.validate().is_ok());
    }

    #[test]
    fn test_form_rejects_bad_student_id() {
        for id in ["1234567", "123456789", "1234567a", "１２３４５６７８"] {
            let mut f = form();
            f.student_id = id.to_string();
            assert!(f.validate().is_err(), "accepted {id:?}");
        }
    }

    #[test]
    fn test_form_rejects_tab_in_name() {
        let mut f = form();
        f.last_name = "Lee\tAutomne".to_string();
        let errors = f.validate().unwrap_err();
        assert!(errors[0].starts_with("last_name"));
    }

    #[test]
    fn test_form_reports_nested_course_errors() {
        let mut f = form();
        f.course.code.clear();
        let errors = f.validate().unwrap_err();
        assert_eq!(errors, vec!["course.code: must not be empty".to_string()]);
    }
}

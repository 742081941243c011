//! Course listing store.
//!
//! The listing is a flat UTF-8 file with one course per line:
//! `code \t name \t session`. The file is read on every request; nothing is
//! cached between connections.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::Course;

/// Errors from reading the course listing.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read course listing at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read-only access to the tab-delimited course listing.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All courses whose session field equals `session` exactly, in file order.
    ///
    /// A session string naming no known session yields an empty list, not an
    /// error. Only I/O failures are errors.
    pub async fn load_courses(&self, session: &str) -> Result<Vec<Course>, CatalogError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Read {
                path: self.path.clone(),
                source,
            })?;
        let courses = parse_listing(&contents, session);
        debug!(session, count = courses.len(), "courses loaded");
        Ok(courses)
    }

    /// Look up one course by code within a session.
    pub async fn find_course(
        &self,
        code: &str,
        session: &str,
    ) -> Result<Option<Course>, CatalogError> {
        Ok(self
            .load_courses(session)
            .await?
            .into_iter()
            .find(|course| course.code == code))
    }
}

/// Parse listing contents, keeping the courses of `session`.
///
/// Lines that do not have exactly three fields are skipped. Trailing empty
/// fields do not count, so `"INF1010\tProg\tHiver\t"` is still a course.
pub fn parse_listing(contents: &str, session: &str) -> Vec<Course> {
    contents
        .lines()
        .filter_map(|line| parse_line(line, session))
        .collect()
}

fn parse_line(line: &str, session: &str) -> Option<Course> {
    let mut fields: Vec<&str> = line.split('\t').collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    let &[code, name, line_session] = fields.as_slice() else {
        return None;
    };
    if line_session.trim() != session {
        return None;
    }
    // The stored value matched the request; it still has to name a real session.
    let session = session.parse().ok()?;
    Some(Course::new(name.trim(), code.trim(), session))
}

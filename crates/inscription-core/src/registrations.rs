//! Append-only registration log.
//!
//! Each accepted registration becomes one line:
//! `session \t code \t student_id \t first_name \t last_name \t email`.
//! The file is opened, written, synced and closed per registration, so a
//! confirmation is only ever returned for a record that reached the disk.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::model::RegistrationForm;

/// Errors from appending to the registration log.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("failed to write registration log at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writer for the tab-delimited registration log.
#[derive(Debug, Clone)]
pub struct RegistrationLog {
    path: PathBuf,
}

impl RegistrationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and return the confirmation message.
    ///
    /// Duplicates are not detected: registering twice writes two lines.
    pub async fn append(&self, form: &RegistrationForm) -> Result<String, RegistrationError> {
        let write_err = |source| RegistrationError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;
        file.write_all(format_record(form).as_bytes())
            .await
            .map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        file.sync_data().await.map_err(write_err)?;
        drop(file);

        info!(
            session = %form.course.session,
            code = %form.course.code,
            student_id = %form.student_id,
            "registration recorded"
        );
        Ok(confirmation(form))
    }
}

/// The log line for a form, newline included.
pub fn format_record(form: &RegistrationForm) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\n",
        form.course.session,
        form.course.code,
        form.student_id,
        form.first_name,
        form.last_name,
        form.email
    )
}

/// The message returned to the client once a registration is stored.
pub fn confirmation(form: &RegistrationForm) -> String {
    format!(
        "Félicitations! Inscription réussie de {} au cours {}",
        form.first_name, form.course.code
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Course, Session};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn ana() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            email: "ana@x.com".to_string(),
            student_id: "12345678".to_string(),
            course: Course::new("", "INF1010", Session::Automne),
        }
    }

    #[test]
    fn test_record_field_order() {
        assert_eq!(
            format_record(&ana()),
            "Automne\tINF1010\t12345678\tAna\tLee\tana@x.com\n"
        );
    }

    #[test]
    fn test_confirmation_message() {
        assert_eq!(
            confirmation(&ana()),
            "Félicitations! Inscription réussie de Ana au cours INF1010"
        );
    }

    #[tokio::test]
    async fn test_append_creates_file_and_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("inscription.txt");
        let log = RegistrationLog::new(&path);

        let message = log.append(&ana()).await.unwrap();
        assert!(message.contains("Ana"));
        assert!(message.contains("INF1010"));

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "Automne\tINF1010\t12345678\tAna\tLee\tana@x.com\n");
    }

    #[tokio::test]
    async fn test_duplicates_are_both_recorded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inscription.txt");
        let log = RegistrationLog::new(&path);

        log.append(&ana()).await.unwrap();
        log.append(&ana()).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
    }

    #[tokio::test]
    async fn test_append_preserves_existing_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inscription.txt");
        tokio::fs::write(&path, "Hiver\tIFT1015\t87654321\tBo\tKim\tbo@y.ca\n")
            .await
            .unwrap();

        RegistrationLog::new(&path).append(&ana()).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.starts_with("Hiver\tIFT1015"));
        assert!(contents.ends_with("ana@x.com\n"));
    }

    #[tokio::test]
    async fn test_unwritable_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let log = RegistrationLog::new(tmp.path());
        assert!(log.append(&ana()).await.is_err());
    }
}

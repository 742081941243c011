//! Temporary catalog and registration-log files.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::TestConfigBuilder;

/// A small catalog covering all three sessions, plus one malformed line.
pub const SAMPLE_CATALOG: &str = "\
INF1010\tProgrammation 2\tAutomne
IFT1015\tProgrammation 1\tHiver
IFT2255\tGenie logiciel\tAutomne
IFT1025\tProgrammation 2\tEte
ligne sans tabulations
";

/// A temp directory holding `cours.txt` and the path for `inscription.txt`.
///
/// The directory is deleted when this value is dropped, even on panic.
pub struct CatalogFixture {
    catalog_path: PathBuf,
    registrations_path: PathBuf,
    _temp_dir: TempDir,
}

impl CatalogFixture {
    /// Write `catalog` to a fresh `cours.txt`. The registration log does not
    /// exist yet.
    pub async fn with_catalog(catalog: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let catalog_path = temp_dir.path().join("cours.txt");
        let registrations_path = temp_dir.path().join("inscription.txt");
        tokio::fs::write(&catalog_path, catalog)
            .await
            .expect("failed to write test catalog");

        Self {
            catalog_path,
            registrations_path,
            _temp_dir: temp_dir,
        }
    }

    /// A fixture holding [`SAMPLE_CATALOG`].
    pub async fn sample() -> Self {
        Self::with_catalog(SAMPLE_CATALOG).await
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn registrations_path(&self) -> &Path {
        &self.registrations_path
    }

    /// A config builder already pointing at this fixture's files.
    pub fn config(&self) -> TestConfigBuilder {
        TestConfigBuilder::new()
            .catalog_path(&self.catalog_path)
            .registrations_path(&self.registrations_path)
    }

    /// Contents of the registration log, or an empty string if nothing was
    /// ever recorded.
    pub async fn read_registrations(&self) -> String {
        match tokio::fs::read_to_string(&self.registrations_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => panic!("failed to read registration log: {e}"),
        }
    }
}

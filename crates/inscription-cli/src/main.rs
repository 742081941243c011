#![deny(unsafe_code)]

//! Inscription CLI — run the server, list courses, submit registrations.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use inscription_config::AppConfig;
use inscription_core::{Client, Course, RegistrationForm, Server, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Inscription — course registration server and client.
#[derive(Parser)]
#[command(name = "inscription", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "inscription.toml", global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registration server.
    Serve,

    /// List the courses offered in a session.
    Courses {
        /// Session name: Automne, Hiver or Ete.
        session: String,
    },

    /// Register a student in a course.
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// Eight-digit student number.
        #[arg(long)]
        student_id: String,
        /// Course code, e.g. INF1010.
        #[arg(long)]
        code: String,
        #[arg(long)]
        session: Session,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, from_file) = load_config(&cli.config).await?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose, &config))),
        )
        .init();
    if !from_file {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Serve => cmd_serve(config).await?,
        Commands::Courses { session } => cmd_courses(&config, &session).await?,
        Commands::Register {
            first_name,
            last_name,
            email,
            student_id,
            code,
            session,
        } => {
            let form = RegistrationForm {
                first_name,
                last_name,
                email,
                student_id,
                course: Course::new("", code, session),
            };
            cmd_register(&config, &form).await?
        }
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

/// `-v` overrides the configured level; `RUST_LOG` overrides both.
fn log_filter(verbose: u8, config: &AppConfig) -> &str {
    match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    }
}

async fn cmd_serve(config: AppConfig) -> Result<()> {
    info!(address = %config.server.address(), "Starting inscription server");
    let server = Server::bind(config).await?;
    server.run().await?;
    Ok(())
}

async fn cmd_courses(config: &AppConfig, session: &str) -> Result<()> {
    let courses = Client::from_config(&config.server)
        .load_courses(session)
        .await?;
    if courses.is_empty() {
        println!("No courses offered in session {session}.");
    }
    for course in courses {
        println!("{}\t{}", course.code, course.name);
    }
    Ok(())
}

async fn cmd_register(config: &AppConfig, form: &RegistrationForm) -> Result<()> {
    if let Err(errors) = form.validate() {
        bail!("invalid registration form:\n  {}", errors.join("\n  "));
    }
    let message = Client::from_config(&config.server).register(form).await?;
    println!("{message}");
    Ok(())
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

/// Load the config file, or the defaults when it does not exist. The flag
/// tells whether the file was found.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    if path.exists() {
        Ok((AppConfig::load(path).await?, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use inscription_test_utils::{CatalogFixture, TestServer};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config_for(server: &TestServer) -> AppConfig {
        let mut config = AppConfig::default();
        config.server.host = server.addr().ip().to_string();
        config.server.port = server.addr().port();
        config
    }

    fn form(code: &str) -> RegistrationForm {
        RegistrationForm {
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            email: "ana@x.com".to_string(),
            student_id: "12345678".to_string(),
            course: Course::new("", code, Session::Automne),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_register() {
        let cli = Cli::parse_from([
            "inscription",
            "-c",
            "other.toml",
            "register",
            "--first-name",
            "Ana",
            "--last-name",
            "Lee",
            "--email",
            "ana@x.com",
            "--student-id",
            "12345678",
            "--code",
            "INF1010",
            "--session",
            "Hiver",
        ]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        match cli.command {
            Commands::Register { code, session, .. } => {
                assert_eq!(code, "INF1010");
                assert_eq!(session, Session::Hiver);
            }
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_session() {
        let result = Cli::try_parse_from([
            "inscription",
            "register",
            "--first-name",
            "Ana",
            "--last-name",
            "Lee",
            "--email",
            "ana@x.com",
            "--student-id",
            "12345678",
            "--code",
            "INF1010",
            "--session",
            "Printemps",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_filter_precedence() {
        let mut config = AppConfig::default();
        config.logging.level = "warn".to_string();
        assert_eq!(log_filter(0, &config), "warn");
        assert_eq!(log_filter(1, &config), "debug");
        assert_eq!(log_filter(3, &config), "trace");
    }

    #[tokio::test]
    async fn test_load_config_missing_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let (config, from_file) = load_config(&tmp.path().join("absent.toml"))
            .await
            .unwrap();
        assert!(!from_file);
        assert_eq!(config.server.port, 1337);
    }

    #[tokio::test]
    async fn test_load_config_invalid_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("inscription.toml");
        tokio::fs::write(&path, "[server]\nport = 0\n").await.unwrap();
        assert!(load_config(&path).await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_register_against_running_server() {
        let fixture = CatalogFixture::sample().await;
        let server = TestServer::start(fixture.config().build()).await;

        cmd_register(&config_for(&server), &form("INF1010"))
            .await
            .unwrap();
        assert_eq!(
            fixture.read_registrations().await,
            "Automne\tINF1010\t12345678\tAna\tLee\tana@x.com\n"
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_register_validates_before_sending() {
        let fixture = CatalogFixture::sample().await;
        let server = TestServer::start(fixture.config().build()).await;

        let mut bad = form("INF1010");
        bad.student_id = "1234".to_string();
        let err = cmd_register(&config_for(&server), &bad).await.unwrap_err();
        assert!(err.to_string().contains("student_id"));
        assert_eq!(fixture.read_registrations().await, "");
    }

    #[test_log::test(tokio::test)]
    async fn test_courses_against_running_server() {
        let fixture = CatalogFixture::sample().await;
        let server = TestServer::start(fixture.config().build()).await;
        cmd_courses(&config_for(&server), "Hiver").await.unwrap();
    }
}

//! Built-in `CHARGER` and `INSCRIRE` handlers.

use inscription_config::StorageConfig;
use tracing::{debug, info};

use crate::BoxFuture;
use crate::catalog::CatalogStore;
use crate::command::{LOAD_VERB, REGISTER_VERB};
use crate::dispatch::{Handler, HandlerError, HandlerRegistry};
use crate::model::RegistrationForm;
use crate::registrations::RegistrationLog;
use crate::wire::{ObjectStream, Reply};

/// `CHARGER <session>` — list the courses of a session.
pub struct LoadCoursesHandler {
    catalog: CatalogStore,
}

impl LoadCoursesHandler {
    pub fn new(catalog: CatalogStore) -> Self {
        Self { catalog }
    }
}

impl Handler for LoadCoursesHandler {
    fn verb(&self) -> &str {
        LOAD_VERB
    }

    fn description(&self) -> &str {
        "List the courses offered in a session"
    }

    fn handle<'a>(
        &'a self,
        argument: &'a str,
        _stream: &'a mut ObjectStream,
    ) -> BoxFuture<'a, Result<Reply, HandlerError>> {
        Box::pin(async move {
            let courses = self.catalog.load_courses(argument).await?;
            Ok(Reply::courses(courses))
        })
    }
}

/// `INSCRIRE` — read a [`RegistrationForm`] and record it.
///
/// The form is checked here regardless of what the client did: field formats
/// first, then that the course is offered in the requested session.
pub struct RegisterHandler {
    catalog: CatalogStore,
    log: RegistrationLog,
}

impl RegisterHandler {
    pub fn new(catalog: CatalogStore, log: RegistrationLog) -> Self {
        Self { catalog, log }
    }
}

impl Handler for RegisterHandler {
    fn verb(&self) -> &str {
        REGISTER_VERB
    }

    fn description(&self) -> &str {
        "Register a student in a course"
    }

    fn handle<'a>(
        &'a self,
        _argument: &'a str,
        stream: &'a mut ObjectStream,
    ) -> BoxFuture<'a, Result<Reply, HandlerError>> {
        Box::pin(async move {
            let form: RegistrationForm = stream.read_object().await?;
            debug!(student_id = %form.student_id, code = %form.course.code, "registration form received");
            form.validate().map_err(HandlerError::InvalidForm)?;

            let session = form.course.session.as_str();
            if self
                .catalog
                .find_course(&form.course.code, session)
                .await?
                .is_none()
            {
                info!(code = %form.course.code, session, "registration for unknown course refused");
                return Err(HandlerError::UnknownCourse {
                    code: form.course.code.clone(),
                    session: session.to_string(),
                });
            }

            let confirmation = self.log.append(&form).await?;
            Ok(Reply::message(confirmation))
        })
    }
}

impl HandlerRegistry {
    /// A registry with the `CHARGER` and `INSCRIRE` handlers bound to `storage`.
    pub fn with_builtin(storage: &StorageConfig) -> Self {
        let catalog = CatalogStore::new(&storage.catalog_path);
        let log = RegistrationLog::new(&storage.registrations_path);

        let mut registry = Self::new();
        registry.register(Box::new(LoadCoursesHandler::new(catalog.clone())));
        registry.register(Box::new(RegisterHandler::new(catalog, log)));
        registry
    }
}

//! The script engine facade
//!
//! Wires a registry, the migration list and configuration together and
//! exposes the operations an authoring tool or server calls.

use std::sync::Arc;

use serde_json::Value;

use crate::config::CoreConfig;
use crate::document::Document;
use crate::error::{FieldError, MigrationError, SchemaError, ScriptError};
use crate::migrator::{Migration, Migrator};
use crate::schema::Registry;
use crate::validation::ScriptValidator;
use crate::walker::Walker;

/// Validation, walking and migration against one registry
#[derive(Debug)]
pub struct ScriptCore {
    registry: Arc<Registry>,
    migrator: Migrator,
    config: CoreConfig,
}

impl ScriptCore {
    /// Check the registry wiring and order the migrations
    pub fn new(
        registry: Registry,
        migrations: Vec<Migration>,
        config: CoreConfig,
    ) -> Result<Self, MigrationError> {
        registry.check()?;
        let registry = Arc::new(registry);
        let migrator = Migrator::new(Arc::clone(&registry), migrations)?;
        log::debug!(
            "Script core ready: {} resource types, {} migrations, version {}",
            registry.resource_types().count(),
            migrator.migrations().len(),
            config.current_version.unwrap_or_else(|| migrator.latest_version())
        );
        Ok(Self {
            registry,
            migrator,
            config,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn migrator(&self) -> &Migrator {
        &self.migrator
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Version documents must be at to validate
    pub fn current_version(&self) -> u64 {
        self.config
            .current_version
            .unwrap_or_else(|| self.migrator.latest_version())
    }

    pub fn walker(&self) -> Walker<'_> {
        Walker::new(&self.registry)
    }

    pub fn validator(&self) -> ScriptValidator<'_> {
        ScriptValidator::new(&self.registry, self.current_version())
            .reject_unknown_collections(self.config.reject_unknown_collections)
    }

    pub fn validate_document(&self, document: &Document) -> Result<(), ScriptError> {
        self.validator().validate_document(document)
    }

    /// Errors for a single resource as it would sit in `collection`
    pub fn validate_resource(
        &self,
        document: &Document,
        collection: &str,
        resource: &Value,
    ) -> Result<Vec<FieldError>, SchemaError> {
        self.validator().resource_errors(document, collection, resource)
    }

    /// Migrations a document still needs, ascending
    pub fn pending_migrations<'a>(
        &'a self,
        document: &Document,
    ) -> impl Iterator<Item = &'a Migration> {
        self.migrator
            .pending_migrations(document.version().unwrap_or(0))
    }

    pub fn migrate_document(&self, document: &Document) -> Result<Document, MigrationError> {
        self.migrator.migrate_document(document)
    }

    pub fn migrate_document_with_assets(
        &self,
        document: &Document,
        assets: &Value,
    ) -> Result<Document, MigrationError> {
        self.migrator
            .migrate_document_with_assets(document, Some(assets))
    }
}

//! Versioned, ordered migration of script documents
//!
//! Migrations are supplied by the caller as an explicit list. Each one is a
//! number, a name and an ordered list of transformations. A document at
//! `meta.version = N` gets every migration numbered above N, in ascending
//! order, and its version is bumped after each one.
//!
//! Migration always works on a deep copy: the input is never touched and a
//! failing transform discards the copy.

mod context;
mod migration;

pub use context::MigrationContext;
pub use migration::{
    ComponentTransform, DocumentTransform, Migration, MigrationTest, ResourceTransform,
    Transformation,
};

use std::sync::Arc;

use serde_json::Value;

use crate::document::{Document, META};
use crate::error::MigrationError;
use crate::schema::Registry;
use crate::walker::{Slot, Target, Walker};

/// Applies registered migrations to documents
#[derive(Debug)]
pub struct Migrator {
    registry: Arc<Registry>,
    migrations: Vec<Migration>,
}

impl Migrator {
    /// Sort migrations by number and check their selectors against the registry
    pub fn new(
        registry: Arc<Registry>,
        mut migrations: Vec<Migration>,
    ) -> Result<Self, MigrationError> {
        migrations.sort_by_key(|migration| migration.num);
        for pair in migrations.windows(2) {
            if pair[0].num == pair[1].num {
                return Err(MigrationError::DuplicateNumber(pair[0].num));
            }
        }
        for migration in &migrations {
            for transformation in migration.transformations() {
                if let Transformation::Component { kind, .. } = transformation {
                    registry.component(kind)?;
                }
            }
        }
        Ok(Self {
            registry,
            migrations,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// All migrations, ascending by number
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Highest migration number, or 0 with no migrations
    pub fn latest_version(&self) -> u64 {
        self.migrations.last().map(|migration| migration.num).unwrap_or(0)
    }

    /// Migrations numbered above `current_version`, ascending
    pub fn pending_migrations(&self, current_version: u64) -> impl Iterator<Item = &Migration> {
        self.migrations
            .iter()
            .filter(move |migration| migration.num > current_version)
    }

    pub fn migrate_document(&self, document: &Document) -> Result<Document, MigrationError> {
        self.migrate_document_with_assets(document, None)
    }

    /// Migrate a copy of `document` up to the latest version
    pub fn migrate_document_with_assets(
        &self,
        document: &Document,
        assets: Option<&Value>,
    ) -> Result<Document, MigrationError> {
        let mut migrated = document.clone();
        let current = if migrated.get(META).is_none() {
            migrated.set_version(0);
            0
        } else {
            migrated.version().ok_or_else(|| {
                MigrationError::InvalidMeta("version must be a non-negative integer".to_string())
            })?
        };

        for migration in self.pending_migrations(current) {
            let mut context = MigrationContext::new(assets);
            self.run_transformations(migration, &mut migrated, &mut context)
                .map_err(|source| MigrationError::Transform {
                    num: migration.num,
                    name: migration.name.clone(),
                    source,
                })?;
            migrated.set_version(migration.num);
            log::info!("Applied migration {} ({})", migration.num, migration.name);
        }
        Ok(migrated)
    }

    /// Run every transformation of `migration` over `document`, in order.
    /// Does not touch `meta.version`.
    pub fn run_transformations(
        &self,
        migration: &Migration,
        document: &mut Document,
        context: &mut MigrationContext<'_>,
    ) -> anyhow::Result<()> {
        for transformation in migration.transformations() {
            log::debug!(
                "Migration {} running {}",
                migration.num,
                transformation.selector()
            );
            match transformation {
                Transformation::Document(transform) => {
                    context.begin_step(None);
                    transform(document, context)?;
                }
                Transformation::Collection { name, transform } => {
                    self.run_on_collection(name, transform, document, context)?;
                }
                Transformation::Component { kind, transform } => {
                    self.run_on_components(kind, transform, document, context)?;
                }
            }
            context.finish_step(document);
        }
        Ok(())
    }

    /// Apply each fixture's `before` and compare with its `after`
    pub fn verify_fixtures(&self, migration: &Migration) -> Result<(), MigrationError> {
        for (index, test) in migration.tests().iter().enumerate() {
            let mismatch = || MigrationError::FixtureMismatch {
                num: migration.num,
                name: migration.name.clone(),
                index,
            };
            let mut document = Document::from_value(test.before.clone()).ok_or_else(mismatch)?;
            let mut context = MigrationContext::new(test.assets.as_ref());
            self.run_transformations(migration, &mut document, &mut context)
                .map_err(|source| MigrationError::Transform {
                    num: migration.num,
                    name: migration.name.clone(),
                    source,
                })?;
            if document.into_value() != test.after {
                return Err(mismatch());
            }
        }
        Ok(())
    }

    fn run_on_collection(
        &self,
        name: &str,
        transform: &ResourceTransform,
        document: &mut Document,
        context: &mut MigrationContext<'_>,
    ) -> anyhow::Result<()> {
        let count = match document.collection_mut(name) {
            Some(resources) => resources.len(),
            None => {
                log::debug!("Skipping absent collection {}", name);
                return Ok(());
            }
        };
        context.begin_step(Some(document.clone()));
        // Index snapshot: resources queued by the transform are not visited
        for index in 0..count {
            if let Some(resource) = document
                .collection_mut(name)
                .and_then(|resources| resources.get_mut(index))
            {
                transform(resource, &mut *context)?;
            }
        }
        Ok(())
    }

    fn run_on_components(
        &self,
        kind: &str,
        transform: &ComponentTransform,
        document: &mut Document,
        context: &mut MigrationContext<'_>,
    ) -> anyhow::Result<()> {
        context.begin_step(Some(document.clone()));
        let walker = Walker::new(&self.registry);
        let collections: Vec<String> = document.collection_names().map(str::to_string).collect();
        for collection in collections {
            let resource_type = match self.registry.resource_for_collection(&collection) {
                Some((resource_type, _)) => resource_type,
                None => continue,
            };
            let count = document.collection(&collection).len();
            for index in 0..count {
                let resource = match document
                    .collection_mut(&collection)
                    .and_then(|resources| resources.get_mut(index))
                {
                    Some(resource) => resource,
                    None => continue,
                };
                let owner = resource.clone();
                walker.walk_resource(
                    &resource_type,
                    resource,
                    Target::Component(kind),
                    |_, _, slot: Slot<'_, &mut Value>| match slot {
                        Slot::Value(component) => {
                            transform(&mut **component, &owner, &mut *context)
                        }
                        Slot::Key(_) => Ok(()),
                    },
                )?;
            }
        }
        Ok(())
    }
}

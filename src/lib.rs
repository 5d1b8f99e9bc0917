// Tripscript - Script Validation, Walking and Migration Core

pub mod config;
pub mod engine;
pub mod document;
pub mod error;
pub mod migrator;
pub mod schema;
pub mod text;
pub mod time;
pub mod validation;
pub mod walker;

pub use crate::config::CoreConfig;
pub use crate::engine::ScriptCore;
pub use crate::document::Document;
pub use crate::error::{FieldError, MigrationError, SchemaError, ScriptError, ValidationError};
pub use crate::migrator::{Migration, MigrationContext, MigrationTest, Migrator, Transformation};
pub use crate::schema::{
    ComponentDef, Discriminator, ParamKind, ParamSpec, Properties, Registry, ResourceClass,
    ScalarKind, SpecialValue,
};
pub use crate::validation::{ScriptValidator, Validator};
pub use crate::walker::{Site, Slot, Target, Walker};

//! Migration definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::MigrationContext;
use crate::document::Document;

pub type DocumentTransform =
    Box<dyn Fn(&mut Document, &mut MigrationContext<'_>) -> anyhow::Result<()> + Send + Sync>;

pub type ResourceTransform =
    Box<dyn Fn(&mut Value, &mut MigrationContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Gets the component instance and a snapshot of the resource that owns it
pub type ComponentTransform = Box<
    dyn Fn(&mut Value, &Value, &mut MigrationContext<'_>) -> anyhow::Result<()> + Send + Sync,
>;

/// One step of a migration and what it applies to
pub enum Transformation {
    /// Runs once over the whole document
    Document(DocumentTransform),
    /// Runs once per resource in a collection
    Collection {
        name: String,
        transform: ResourceTransform,
    },
    /// Runs once per instance of a component kind, wherever it is nested
    Component {
        kind: String,
        transform: ComponentTransform,
    },
}

impl Transformation {
    pub fn document<F>(transform: F) -> Self
    where
        F: Fn(&mut Document, &mut MigrationContext<'_>) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Transformation::Document(Box::new(transform))
    }

    pub fn collection<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&mut Value, &mut MigrationContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Transformation::Collection {
            name: name.into(),
            transform: Box::new(transform),
        }
    }

    pub fn component<F>(kind: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&mut Value, &Value, &mut MigrationContext<'_>) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Transformation::Component {
            kind: kind.into(),
            transform: Box::new(transform),
        }
    }

    /// What the step applies to, for logs
    pub fn selector(&self) -> String {
        match self {
            Transformation::Document(_) => "document".to_string(),
            Transformation::Collection { name, .. } => format!("collection {}", name),
            Transformation::Component { kind, .. } => format!("component {}", kind),
        }
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transformation({})", self.selector())
    }
}

/// A before/after pair a migration must reproduce exactly
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MigrationTest {
    pub before: Value,
    pub after: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Value>,
}

impl MigrationTest {
    pub fn new(before: Value, after: Value) -> Self {
        Self {
            before,
            after,
            assets: None,
        }
    }

    pub fn with_assets(mut self, assets: Value) -> Self {
        self.assets = Some(assets);
        self
    }
}

/// A numbered, named list of transformations with its fixtures
#[derive(Debug)]
pub struct Migration {
    pub num: u64,
    pub name: String,
    transformations: Vec<Transformation>,
    tests: Vec<MigrationTest>,
}

impl Migration {
    pub fn new(num: u64, name: impl Into<String>) -> Self {
        Self {
            num,
            name: name.into(),
            transformations: Vec::new(),
            tests: Vec::new(),
        }
    }

    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformations.push(transformation);
        self
    }

    pub fn with_test(mut self, test: MigrationTest) -> Self {
        self.tests.push(test);
        self
    }

    pub fn transformations(&self) -> &[Transformation] {
        &self.transformations
    }

    pub fn tests(&self) -> &[MigrationTest] {
        &self.tests
    }
}

//! State available to transforms while a migration runs

use serde_json::{Map, Value};

use crate::document::Document;

/// Handed to every transform of a migration.
///
/// Resource and component transforms get a mutable handle on one value only,
/// so anything they need from the rest of the document comes from here: a
/// snapshot of the document as it was when the step started, caller-supplied
/// assets, scratch space shared by the steps of one migration, and a queue of
/// resources to append once the step is done.
#[derive(Debug, Default)]
pub struct MigrationContext<'a> {
    assets: Option<&'a Value>,
    snapshot: Option<Document>,
    scratch: Map<String, Value>,
    appends: Vec<(String, Value)>,
}

impl<'a> MigrationContext<'a> {
    pub fn new(assets: Option<&'a Value>) -> Self {
        Self {
            assets,
            ..Self::default()
        }
    }

    /// Caller-supplied data such as the media asset list
    pub fn assets(&self) -> Option<&'a Value> {
        self.assets
    }

    /// The document before the current step began. `None` inside
    /// whole-document transforms, which own the document directly.
    pub fn document(&self) -> Option<&Document> {
        self.snapshot.as_ref()
    }

    pub fn scratch(&self) -> &Map<String, Value> {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.scratch
    }

    /// Queue a new resource; it is appended when the current step finishes
    pub fn push_resource(&mut self, collection: impl Into<String>, resource: Value) {
        self.appends.push((collection.into(), resource));
    }

    pub(crate) fn begin_step(&mut self, snapshot: Option<Document>) {
        self.snapshot = snapshot;
    }

    /// Apply queued appends to `document` and drop the step snapshot
    pub(crate) fn finish_step(&mut self, document: &mut Document) {
        self.snapshot = None;
        for (collection, resource) in self.appends.drain(..) {
            document.push_resource(&collection, resource);
        }
    }
}

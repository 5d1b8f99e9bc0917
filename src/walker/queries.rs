//! Lookups derived from a walk: component instances by kind or id, and the
//! reference graph between resources

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Target, Walker};
use crate::document::Document;
use crate::error::SchemaError;
use crate::schema::ParamKind;

/// A component instance found in a document
#[derive(Clone, Debug, PartialEq)]
pub struct Located<'d> {
    pub collection: String,
    pub resource_index: usize,
    pub resource: &'d Value,
    pub component: &'d Value,
    /// Path of the instance within its resource, e.g. `panels[1]`
    pub path: String,
}

/// One reference field pointing from a resource to a named resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from_collection: String,
    pub from_index: usize,
    pub from_resource: Option<String>,
    pub path: String,
    pub to_collection: String,
    pub to_name: String,
}

impl<'r> Walker<'r> {
    /// Field holding the id of a component kind
    fn id_field(&self, kind: &str) -> &'r str {
        self.registry
            .unique_id_components()
            .find(|(unique, _)| *unique == kind)
            .map(|(_, field)| field)
            .unwrap_or("id")
    }

    /// Every instance of a component kind, in document order
    pub fn components_of_kind<'d>(
        &self,
        document: &'d Document,
        kind: &str,
    ) -> Result<Vec<Located<'d>>, SchemaError> {
        self.registry.component(kind)?;
        let mut found = Vec::new();
        self.walk_all_values(document, Target::Component(kind), |site, component| {
            if let Some(resource) = document.collection(site.collection).get(site.resource_index) {
                found.push(Located {
                    collection: site.collection.to_string(),
                    resource_index: site.resource_index,
                    resource,
                    component,
                    path: site.path.to_string(),
                });
            }
            Ok::<_, SchemaError>(())
        })?;
        Ok(found)
    }

    /// First instance of `kind` whose id is `id`, with its owning resource
    pub fn get_resource_and_component_by_id<'d>(
        &self,
        document: &'d Document,
        kind: &str,
        id: i64,
    ) -> Result<Option<Located<'d>>, SchemaError> {
        let field = self.id_field(kind);
        Ok(self
            .components_of_kind(document, kind)?
            .into_iter()
            .find(|located| located.component.get(field).and_then(Value::as_i64) == Some(id)))
    }

    pub fn get_component_by_id<'d>(
        &self,
        document: &'d Document,
        kind: &str,
        id: i64,
    ) -> Result<Option<&'d Value>, SchemaError> {
        Ok(self
            .get_resource_and_component_by_id(document, kind, id)?
            .map(|located| located.component))
    }

    /// Resources holding a component reference to instance `id` of `kind`.
    /// Each resource is listed once.
    pub fn get_resources_referencing_component<'d>(
        &self,
        document: &'d Document,
        kind: &str,
        id: i64,
    ) -> Result<Vec<(String, &'d Value)>, SchemaError> {
        let mut hits: Vec<(String, usize)> = Vec::new();
        self.walk_all_fields(document, Target::ComponentReference, |site, value| {
            let refers = match &site.spec.kind {
                ParamKind::ComponentReference { component } => component == kind,
                _ => false,
            };
            if refers && value.as_i64() == Some(id) {
                let hit = (site.collection.to_string(), site.resource_index);
                if !hits.contains(&hit) {
                    hits.push(hit);
                }
            }
            Ok::<_, SchemaError>(())
        })?;
        Ok(resolve_hits(document, hits))
    }

    /// Every reference by name in the document. Special values and nulls are
    /// not edges.
    pub fn references(&self, document: &Document) -> Result<Vec<ReferenceEdge>, SchemaError> {
        let mut edges = Vec::new();
        self.walk_all_fields(document, Target::Reference, |site, value| {
            let (collection, special_values) = match &site.spec.kind {
                ParamKind::Reference {
                    collection,
                    special_values,
                    ..
                } => (collection, special_values),
                _ => return Ok(()),
            };
            let name = match value.as_str() {
                Some(name) if !name.is_empty() => name,
                _ => return Ok(()),
            };
            if special_values.iter().any(|special| special.value == name) {
                return Ok(());
            }
            edges.push(ReferenceEdge {
                from_collection: site.collection.to_string(),
                from_index: site.resource_index,
                from_resource: site.resource_name.map(str::to_string),
                path: site.path.to_string(),
                to_collection: collection.clone(),
                to_name: name.to_string(),
            });
            Ok::<_, SchemaError>(())
        })?;
        Ok(edges)
    }

    /// Resources that reference `collection`/`name` by name, each once
    pub fn get_resources_referencing<'d>(
        &self,
        document: &'d Document,
        collection: &str,
        name: &str,
    ) -> Result<Vec<(String, &'d Value)>, SchemaError> {
        let mut hits: Vec<(String, usize)> = Vec::new();
        for edge in self.references(document)? {
            if edge.to_collection != collection || edge.to_name != name {
                continue;
            }
            let hit = (edge.from_collection, edge.from_index);
            if !hits.contains(&hit) {
                hits.push(hit);
            }
        }
        Ok(resolve_hits(document, hits))
    }
}

fn resolve_hits(document: &Document, hits: Vec<(String, usize)>) -> Vec<(String, &Value)> {
    hits.into_iter()
        .filter_map(|(collection, index)| {
            let resource = document.collection(&collection).get(index)?;
            Some((collection, resource))
        })
        .collect()
}

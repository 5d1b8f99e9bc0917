//! The schema registry: resource classes and component kinds
//!
//! Built once at startup by the caller and shared read-only afterwards.

use std::collections::BTreeMap;

use serde_json::Value;

use super::component::ComponentDef;
use super::{ParamKind, ParamSpec, Properties};
use crate::document::Document;
use crate::error::SchemaError;
use crate::text::{pluralize, singularize};

/// Cross-field check for a resource or component variant.
///
/// Returns extra warnings that can't be expressed as per-field rules.
pub type ValidateHook = fn(&Document, &Value) -> Vec<String>;

/// Field specs for one resource type (or one flattened component variant)
#[derive(Clone, Debug, Default)]
pub struct ResourceClass {
    pub properties: Properties,
    pub validate: Option<ValidateHook>,
}

impl ResourceClass {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            validate: None,
        }
    }

    pub fn with_hook(mut self, validate: ValidateHook) -> Self {
        self.validate = Some(validate);
        self
    }
}

/// All resource and component specs known to the engine
#[derive(Clone, Debug, Default)]
pub struct Registry {
    resources: BTreeMap<String, ResourceClass>,
    components: BTreeMap<String, ComponentDef>,
    /// (component kind, id field) pairs whose ids are unique document-wide
    unique_ids: Vec<(String, String)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type; its collection is the plural of `type_name`
    pub fn with_resource(mut self, type_name: impl Into<String>, class: ResourceClass) -> Self {
        self.resources.insert(type_name.into(), class);
        self
    }

    pub fn with_component(mut self, def: ComponentDef) -> Self {
        self.components.insert(def.kind().to_string(), def);
        self
    }

    /// Require `id_field` of every `kind` instance to be unique in a document
    pub fn with_unique_ids(mut self, kind: impl Into<String>, id_field: impl Into<String>) -> Self {
        self.unique_ids.push((kind.into(), id_field.into()));
        self
    }

    pub fn resource(&self, type_name: &str) -> Option<&ResourceClass> {
        self.resources.get(type_name)
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Resource type and class backing a collection name
    pub fn resource_for_collection(&self, collection: &str) -> Option<(String, &ResourceClass)> {
        let type_name = singularize(collection);
        if let Some(class) = self.resources.get(&type_name) {
            return Some((type_name, class));
        }
        // Irregular plurals: fall back to matching the other direction
        self.resources
            .iter()
            .find(|(name, _)| pluralize(name) == collection)
            .map(|(name, class)| (name.clone(), class))
    }

    pub fn component(&self, kind: &str) -> Result<&ComponentDef, SchemaError> {
        self.components
            .get(kind)
            .ok_or_else(|| SchemaError::UnknownComponent(kind.to_string()))
    }

    pub fn has_component(&self, kind: &str) -> bool {
        self.components.contains_key(kind)
    }

    pub fn component_kinds(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Class of a component variant. With no variant, or an unknown one,
    /// this is the discriminator-only class an editor offers for picking one.
    pub fn component_class(
        &self,
        kind: &str,
        variant: Option<&str>,
    ) -> Result<&ResourceClass, SchemaError> {
        let def = self.component(kind)?;
        Ok(variant
            .and_then(|name| def.variant(name))
            .unwrap_or_else(|| def.type_class()))
    }

    pub fn unique_id_components(&self) -> impl Iterator<Item = (&str, &str)> {
        self.unique_ids
            .iter()
            .map(|(kind, field)| (kind.as_str(), field.as_str()))
    }

    /// Check the wiring: every component kind named by a spec is registered,
    /// and every enum has options.
    pub fn check(&self) -> Result<(), SchemaError> {
        for (type_name, class) in &self.resources {
            check_properties(self, type_name, &class.properties)?;
        }
        for (kind, def) in &self.components {
            check_properties(self, kind, def.common())?;
            for variant in def.variant_names() {
                if let Some(class) = def.variant(variant) {
                    check_properties(self, &format!("{}.{}", kind, variant), &class.properties)?;
                }
            }
        }
        for (kind, _) in &self.unique_ids {
            self.component(kind)?;
        }
        Ok(())
    }
}

fn check_properties(registry: &Registry, path: &str, properties: &Properties) -> Result<(), SchemaError> {
    for (name, spec) in properties.iter() {
        check_spec(registry, &format!("{}.{}", path, name), spec)?;
    }
    Ok(())
}

fn check_spec(registry: &Registry, path: &str, spec: &ParamSpec) -> Result<(), SchemaError> {
    match &spec.kind {
        ParamKind::Scalar(_) | ParamKind::Reference { .. } => Ok(()),
        ParamKind::Enum { options } => {
            if options.is_empty() {
                return Err(SchemaError::EmptyEnum(path.to_string()));
            }
            Ok(())
        }
        ParamKind::ComponentReference { component } | ParamKind::Component { component } => {
            registry.component(component).map(|_| ())
        }
        ParamKind::List { items } => check_spec(registry, &format!("{}[]", path), items),
        ParamKind::Dictionary { keys, values } => {
            check_spec(registry, &format!("{}[key]", path), keys)?;
            check_spec(registry, &format!("{}[value]", path), values)
        }
        ParamKind::Object { properties } => check_properties(registry, path, properties),
    }
}

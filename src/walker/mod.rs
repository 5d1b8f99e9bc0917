//! Generic traversal of script content
//!
//! The walker mirrors the validator's dispatch over `ParamKind`, but collects
//! instead of checking: it finds every field of a given kind (or every
//! instance of a component kind) anywhere in a resource, however deeply it
//! is nested through lists, dictionaries, objects and components.
//!
//! There is one traversal. It is generic over `Node`, a handle on a
//! position in the tree, which is implemented for `&Value` (read-only
//! queries) and `&mut Value` (in-place migration). A visitor given a
//! `&mut &mut Value` can replace the value it was handed.
//!
//! Dictionary keys are not values in the tree, so they reach the visitor as
//! `Slot::Key`: a string value holding the key. In a mutable walk a key
//! changed to another string renames the entry.

mod queries;

pub use queries::{Located, ReferenceEdge};

use std::fmt::Write as _;

use serde_json::Value;

use crate::document::{resource_name, Document, META};
use crate::error::SchemaError;
use crate::schema::{ParamKind, ParamSpec, Properties, Registry, ScalarKind};

/// A position in a document tree the walker can descend through
pub trait Node: Sized {
    /// Current value at this position
    fn value(&self) -> &Value;

    /// Split an object into handles on its entries (empty for non-objects)
    fn into_fields(self) -> Vec<(String, Self)>;

    /// Split an array into handles on its elements (empty for non-arrays)
    fn into_items(self) -> Vec<Self>;

    /// Hand every key of an object to `visit` as a string value, together
    /// with the key as it was
    fn visit_keys<E, F>(&mut self, visit: F) -> Result<(), E>
    where
        F: FnMut(&str, &mut Value) -> Result<(), E>;
}

impl<'a> Node for &'a Value {
    fn value(&self) -> &Value {
        self
    }

    fn into_fields(self) -> Vec<(String, Self)> {
        match self {
            Value::Object(fields) => fields.iter().map(|(k, v)| (k.clone(), v)).collect(),
            _ => Vec::new(),
        }
    }

    fn into_items(self) -> Vec<Self> {
        match self {
            Value::Array(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn visit_keys<E, F>(&mut self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&str, &mut Value) -> Result<(), E>,
    {
        if let Value::Object(fields) = *self {
            for key in fields.keys() {
                let mut slot = Value::String(key.clone());
                visit(key, &mut slot)?;
            }
        }
        Ok(())
    }
}

impl<'a> Node for &'a mut Value {
    fn value(&self) -> &Value {
        self
    }

    fn into_fields(self) -> Vec<(String, Self)> {
        match self {
            Value::Object(fields) => fields.iter_mut().map(|(k, v)| (k.clone(), v)).collect(),
            _ => Vec::new(),
        }
    }

    fn into_items(self) -> Vec<Self> {
        match self {
            Value::Array(items) => items.iter_mut().collect(),
            _ => Vec::new(),
        }
    }

    fn visit_keys<E, F>(&mut self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&str, &mut Value) -> Result<(), E>,
    {
        let fields = match &mut **self {
            Value::Object(fields) => fields,
            _ => return Ok(()),
        };
        let mut renames: Vec<(String, String)> = Vec::new();
        for key in fields.keys() {
            let mut slot = Value::String(key.clone());
            visit(key, &mut slot)?;
            if let Value::String(renamed) = slot {
                if renamed != *key {
                    renames.push((key.clone(), renamed));
                }
            }
        }
        if renames.is_empty() {
            return Ok(());
        }
        // Rebuild so renamed entries keep their position
        *fields = std::mem::take(fields)
            .into_iter()
            .map(|(key, value)| {
                let key = renames
                    .iter()
                    .find(|(from, _)| *from == key)
                    .map(|(_, to)| to.clone())
                    .unwrap_or(key);
                (key, value)
            })
            .collect();
        Ok(())
    }
}

/// What a visitor is handed at a match
#[derive(Debug)]
pub enum Slot<'s, H> {
    /// A value in the tree
    Value(&'s mut H),
    /// A dictionary key as a string value
    Key(&'s mut Value),
}

/// Which fields a walk reports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target<'t> {
    /// Every terminal field and every component instance
    Any,
    /// Every terminal field, but not component instances
    Terminal,
    Scalar(ScalarKind),
    Enum,
    Reference,
    ComponentReference,
    /// Instances of one component kind
    Component(&'t str),
}

impl Target<'_> {
    fn matches_component(&self, kind: &str) -> bool {
        match self {
            Target::Any => true,
            Target::Component(target) => *target == kind,
            _ => false,
        }
    }

    fn matches_terminal(&self, kind: &ParamKind) -> bool {
        match (self, kind) {
            (Target::Any, _) | (Target::Terminal, _) => true,
            (Target::Scalar(target), ParamKind::Scalar(scalar)) => target == scalar,
            (Target::Enum, ParamKind::Enum { .. }) => true,
            (Target::Reference, ParamKind::Reference { .. }) => true,
            (Target::ComponentReference, ParamKind::ComponentReference { .. }) => true,
            _ => false,
        }
    }
}

/// Where a visited value lives in the document
#[derive(Clone, Copy, Debug)]
pub struct Site<'s> {
    pub collection: &'s str,
    /// Index of the owning resource within its collection
    pub resource_index: usize,
    pub resource_name: Option<&'s str>,
    /// Dotted/bracketed path of the value within the resource
    pub path: &'s str,
    pub spec: &'s ParamSpec,
    /// The visit is a dictionary key rather than the value stored under it
    pub is_key: bool,
}

/// Spec-driven walker bound to a registry
#[derive(Clone, Copy, Debug)]
pub struct Walker<'r> {
    registry: &'r Registry,
}

impl<'r> Walker<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Walk one value against its spec.
    ///
    /// `visit` receives the path, the spec and the slot of each match.
    /// Absent fields are not visited. Dictionary keys are visited before
    /// the values of their dictionary.
    pub fn walk_param<H, E, F>(
        &self,
        node: H,
        spec: &ParamSpec,
        target: Target<'_>,
        path: &mut String,
        visit: &mut F,
    ) -> Result<(), E>
    where
        H: Node,
        E: From<SchemaError>,
        F: FnMut(&str, &ParamSpec, Slot<'_, H>) -> Result<(), E>,
    {
        let mut node = node;
        match &spec.kind {
            ParamKind::Component { component } => {
                // Visit before descending: a component may nest instances of
                // its own kind.
                if target.matches_component(component) {
                    visit(path.as_str(), spec, Slot::Value(&mut node))?;
                }
                let def = self.registry.component(component)?;
                if !node.value().is_object() {
                    return Ok(());
                }
                let class = def.class_for(node.value());
                self.walk_params(node, &class.properties, target, path, visit)
            }
            ParamKind::Object { properties } => {
                self.walk_params(node, properties, target, path, visit)
            }
            ParamKind::List { items } => {
                for (index, item) in node.into_items().into_iter().enumerate() {
                    let len = path.len();
                    let _ = write!(path, "[{}]", index);
                    self.walk_param(item, items, target, path, visit)?;
                    path.truncate(len);
                }
                Ok(())
            }
            ParamKind::Dictionary { keys, values } => {
                let keys: &ParamSpec = keys;
                if keys.kind.is_terminal() && target.matches_terminal(&keys.kind) {
                    node.visit_keys(|key, slot| {
                        let len = path.len();
                        let _ = write!(path, "[{}]", key);
                        let visited = visit(path.as_str(), keys, Slot::Key(slot));
                        path.truncate(len);
                        visited
                    })?;
                }
                for (key, value) in node.into_fields() {
                    let len = path.len();
                    let _ = write!(path, "[{}]", key);
                    self.walk_param(value, values, target, path, visit)?;
                    path.truncate(len);
                }
                Ok(())
            }
            ParamKind::Scalar(_)
            | ParamKind::Enum { .. }
            | ParamKind::Reference { .. }
            | ParamKind::ComponentReference { .. } => {
                if target.matches_terminal(&spec.kind) {
                    visit(path.as_str(), spec, Slot::Value(&mut node))?;
                }
                Ok(())
            }
        }
    }

    /// Walk the declared fields of a params object, in declaration order
    pub fn walk_params<H, E, F>(
        &self,
        node: H,
        properties: &Properties,
        target: Target<'_>,
        path: &mut String,
        visit: &mut F,
    ) -> Result<(), E>
    where
        H: Node,
        E: From<SchemaError>,
        F: FnMut(&str, &ParamSpec, Slot<'_, H>) -> Result<(), E>,
    {
        if let Some(spec) = properties.self_spec() {
            return self.walk_param(node, spec, target, path, visit);
        }
        let mut fields = node.into_fields();
        for (name, spec) in properties.iter() {
            let position = match fields.iter().position(|(key, _)| key == name) {
                Some(position) => position,
                None => continue,
            };
            let (_, field) = fields.swap_remove(position);
            let len = path.len();
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(name);
            self.walk_param(field, spec, target, path, visit)?;
            path.truncate(len);
        }
        Ok(())
    }

    /// Walk every field of one resource. Unknown resource types are skipped.
    pub fn walk_resource<H, E, F>(
        &self,
        resource_type: &str,
        resource: H,
        target: Target<'_>,
        mut visit: F,
    ) -> Result<(), E>
    where
        H: Node,
        E: From<SchemaError>,
        F: FnMut(&str, &ParamSpec, Slot<'_, H>) -> Result<(), E>,
    {
        let class = match self.registry.resource(resource_type) {
            Some(class) => class,
            None => return Ok(()),
        };
        let mut path = String::new();
        self.walk_params(resource, &class.properties, target, &mut path, &mut visit)
    }

    /// Walk the fields of one component instance (not the instance itself)
    pub fn walk_component<H, E, F>(
        &self,
        kind: &str,
        component: H,
        target: Target<'_>,
        mut visit: F,
    ) -> Result<(), E>
    where
        H: Node,
        E: From<SchemaError>,
        F: FnMut(&str, &ParamSpec, Slot<'_, H>) -> Result<(), E>,
    {
        let class = self.registry.component(kind)?.class_for(component.value());
        let mut path = String::new();
        self.walk_params(component, &class.properties, target, &mut path, &mut visit)
    }

    /// Walk every resource in every collection (read-only). Dictionary keys
    /// are handed over as string values that live only for the visit.
    pub fn walk_all_fields<'d, E, F>(
        &self,
        document: &'d Document,
        target: Target<'_>,
        mut visit: F,
    ) -> Result<(), E>
    where
        E: From<SchemaError>,
        F: FnMut(&Site<'_>, &Value) -> Result<(), E>,
    {
        let collections = document
            .as_map()
            .iter()
            .map(|(name, resources)| (name.clone(), resources))
            .collect();
        self.walk_collections(collections, target, &mut |site, slot: Slot<'_, &'d Value>| {
            match slot {
                Slot::Value(node) => visit(site, *node),
                Slot::Key(key) => visit(site, key),
            }
        })
    }

    /// Walk every value held in the document, skipping dictionary keys, so
    /// matches can be kept for as long as the document is borrowed
    pub(crate) fn walk_all_values<'d, E, F>(
        &self,
        document: &'d Document,
        target: Target<'_>,
        mut visit: F,
    ) -> Result<(), E>
    where
        E: From<SchemaError>,
        F: FnMut(&Site<'_>, &'d Value) -> Result<(), E>,
    {
        let collections = document
            .as_map()
            .iter()
            .map(|(name, resources)| (name.clone(), resources))
            .collect();
        self.walk_collections(collections, target, &mut |site, slot: Slot<'_, &'d Value>| {
            match slot {
                Slot::Value(node) => visit(site, *node),
                Slot::Key(_) => Ok(()),
            }
        })
    }

    /// Walk every resource in every collection, allowing replacement. A
    /// dictionary key replaced by another string renames its entry.
    pub fn walk_all_fields_mut<E, F>(
        &self,
        document: &mut Document,
        target: Target<'_>,
        mut visit: F,
    ) -> Result<(), E>
    where
        E: From<SchemaError>,
        F: FnMut(&Site<'_>, &mut Value) -> Result<(), E>,
    {
        let collections = document
            .as_map_mut()
            .iter_mut()
            .map(|(name, resources)| (name.clone(), resources))
            .collect();
        self.walk_collections(collections, target, &mut |site, slot: Slot<'_, &mut Value>| {
            match slot {
                Slot::Value(node) => visit(site, &mut **node),
                Slot::Key(key) => visit(site, key),
            }
        })
    }

    fn walk_collections<H, E, F>(
        &self,
        collections: Vec<(String, H)>,
        target: Target<'_>,
        visit: &mut F,
    ) -> Result<(), E>
    where
        H: Node,
        E: From<SchemaError>,
        F: FnMut(&Site<'_>, Slot<'_, H>) -> Result<(), E>,
    {
        for (collection, resources) in collections {
            if collection == META {
                continue;
            }
            let class = match self.registry.resource_for_collection(&collection) {
                Some((_, class)) => class,
                None => continue,
            };
            for (index, resource) in resources.into_items().into_iter().enumerate() {
                let name = resource_name(resource.value()).map(str::to_string);
                let mut path = String::new();
                self.walk_params(
                    resource,
                    &class.properties,
                    target,
                    &mut path,
                    &mut |field: &str, spec: &ParamSpec, slot: Slot<'_, H>| {
                        let site = Site {
                            collection: &collection,
                            resource_index: index,
                            resource_name: name.as_deref(),
                            path: field,
                            spec,
                            is_key: matches!(slot, Slot::Key(_)),
                        };
                        visit(&site, slot)
                    },
                )?;
            }
        }
        Ok(())
    }
}

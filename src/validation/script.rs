//! Whole-document validation

use std::collections::HashSet;

use serde_json::Value;

use super::Validator;
use crate::document::{resource_name, Document, META};
use crate::error::{FieldError, ScriptError, SchemaError, ValidationError};
use crate::schema::Registry;
use crate::walker::Walker;

/// Validates a full document: meta block, every collection, unique ids
#[derive(Clone, Copy, Debug)]
pub struct ScriptValidator<'r> {
    registry: &'r Registry,
    current_version: u64,
    reject_unknown_collections: bool,
}

impl<'r> ScriptValidator<'r> {
    pub fn new(registry: &'r Registry, current_version: u64) -> Self {
        Self {
            registry,
            current_version,
            reject_unknown_collections: true,
        }
    }

    /// Whether collections with no registered type are reported
    pub fn reject_unknown_collections(mut self, reject: bool) -> Self {
        self.reject_unknown_collections = reject;
        self
    }

    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    /// Check the document, returning every content problem at once.
    ///
    /// A broken meta block stops validation before any collection is read.
    pub fn validate_document(&self, document: &Document) -> Result<(), ScriptError> {
        let meta_errors = self.meta_errors(document.get(META));
        if !meta_errors.is_empty() {
            log::debug!("Meta block rejected with {} error(s)", meta_errors.len());
            return Err(ValidationError {
                message: "Invalid meta resource.".to_string(),
                errors: meta_errors,
            }
            .into());
        }

        let mut errors = Vec::new();
        for collection in document.collection_names() {
            errors.extend(self.collection_errors(document, collection)?);
        }
        for (kind, id_field) in self.registry.unique_id_components() {
            errors.extend(self.duplicate_id_errors(document, kind, id_field)?);
        }

        if errors.is_empty() {
            return Ok(());
        }
        log::debug!("Document rejected with {} error(s)", errors.len());
        Err(ValidationError::from_errors(errors).into())
    }

    /// Errors for one resource of a collection, tagged with its path
    pub fn resource_errors(
        &self,
        document: &Document,
        collection: &str,
        resource: &Value,
    ) -> Result<Vec<FieldError>, SchemaError> {
        let class = match self.registry.resource_for_collection(collection) {
            Some((_, class)) => class,
            None => {
                return Ok(vec![FieldError::new(
                    collection,
                    collection,
                    format!("Invalid collection: {}", collection),
                )])
            }
        };
        let path = format!(
            "{}[name={}]",
            collection,
            resource_name(resource).unwrap_or("<unknown>")
        );
        let warnings =
            Validator::new(self.registry).validate_resource(document, class, resource, "")?;
        Ok(warnings
            .into_iter()
            .map(|message| FieldError::new(collection, path.as_str(), message))
            .collect())
    }

    fn meta_errors(&self, meta: Option<&Value>) -> Vec<FieldError> {
        let error = |message: String| FieldError::new(META, META, message);
        let fields = match meta.and_then(Value::as_object) {
            Some(fields) => fields,
            None => return vec![error("Meta should be an object.".to_string())],
        };

        let mut errors = Vec::new();
        match fields.get("version") {
            None => errors.push(error("Meta requires property \"version\".".to_string())),
            Some(version) => match version.as_u64() {
                Some(version) if version == self.current_version => {}
                Some(version) => errors.push(error(format!(
                    "Meta version {} should be {}.",
                    version, self.current_version
                ))),
                None => errors.push(error("Meta version should be an integer.".to_string())),
            },
        }
        for key in fields.keys().filter(|key| *key != "version") {
            errors.push(error(format!("Meta should not have property \"{}\".", key)));
        }
        errors
    }

    fn collection_errors(
        &self,
        document: &Document,
        collection: &str,
    ) -> Result<Vec<FieldError>, SchemaError> {
        let resources = match document.get(collection).and_then(Value::as_array) {
            Some(resources) => resources,
            None => {
                return Ok(vec![FieldError::new(
                    collection,
                    collection,
                    format!("Collection must be an array: {}.", collection),
                )])
            }
        };

        if self.registry.resource_for_collection(collection).is_none() {
            if !self.reject_unknown_collections || resources.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![FieldError::new(
                collection,
                collection,
                format!("Invalid collection: {}", collection),
            )]);
        }

        let mut errors = Vec::new();
        let mut names = HashSet::new();
        for resource in resources {
            if let Some(name) = resource_name(resource) {
                if !names.insert(name) {
                    errors.push(FieldError::new(
                        collection,
                        collection,
                        format!("Duplicate names: {}", name),
                    ));
                }
            }
            errors.extend(self.resource_errors(document, collection, resource)?);
        }
        Ok(errors)
    }

    fn duplicate_id_errors(
        &self,
        document: &Document,
        kind: &str,
        id_field: &str,
    ) -> Result<Vec<FieldError>, SchemaError> {
        let mut errors = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for located in Walker::new(self.registry).components_of_kind(document, kind)? {
            let id = match located.component.get(id_field) {
                None | Some(Value::Null) | Some(Value::Bool(false)) => continue,
                Some(Value::Number(n)) if n.as_f64() == Some(0.0) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(id) => id,
            };
            // Keyed by JSON text, so 7 and "7" stay distinct
            if !seen.insert(id.to_string()) {
                errors.push(FieldError::new(
                    located.collection.as_str(),
                    format!(
                        "{}[name={}]",
                        located.collection,
                        resource_name(located.resource).unwrap_or("<unknown>")
                    ),
                    format!("Duplicate id in {}: {}", kind, super::scalars::display(id)),
                ));
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ComponentDef, Discriminator, ParamSpec, Properties, ResourceClass};
    use serde_json::json;

    fn registry() -> Registry {
        let panels = ComponentDef::builder("panels", Discriminator::Key("type".into()))
            .common(Properties::new().field("id", ParamSpec::integer()))
            .variant("text", Properties::new().field("text", ParamSpec::string()))
            .build()
            .unwrap();
        Registry::new()
            .with_component(panels)
            .with_unique_ids("panels", "id")
            .with_resource(
                "role",
                ResourceClass::new(Properties::new().field("name", ParamSpec::name().required())),
            )
            .with_resource(
                "page",
                ResourceClass::new(
                    Properties::new()
                        .field("name", ParamSpec::name().required())
                        .field("role", ParamSpec::reference("roles").required())
                        .field("panels", ParamSpec::list(ParamSpec::component("panels"))),
                ),
            )
    }

    fn validate(content: Value) -> Result<(), ScriptError> {
        let registry = registry();
        let doc = Document::from_value(content).unwrap();
        ScriptValidator::new(&registry, 3).validate_document(&doc)
    }

    #[test]
    fn test_valid_document() {
        let result = validate(json!({
            "meta": { "version": 3 },
            "roles": [{ "name": "vance" }],
            "pages": [{ "name": "p1", "role": "vance", "panels": [{ "type": "text", "id": 1 }] }]
        }));
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_meta_errors_stop_validation() {
        let err = validate(json!({
            "meta": { "version": 2, "extra": true },
            "roles": "not an array"
        }))
        .unwrap_err();
        match err {
            ScriptError::Invalid(err) => {
                assert_eq!(err.message, "Invalid meta resource.");
                let messages: Vec<&str> = err.errors.iter().map(|e| e.message.as_str()).collect();
                assert_eq!(
                    messages,
                    vec![
                        "Meta version 2 should be 3.",
                        "Meta should not have property \"extra\".",
                    ]
                );
                assert!(err.errors.iter().all(|e| e.collection == "meta"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = validate(json!({ "roles": [] })).unwrap_err();
        assert_eq!(err.field_errors()[0].message, "Meta should be an object.");
    }

    #[test]
    fn test_collection_errors() {
        let err = validate(json!({
            "meta": { "version": 3 },
            "roles": [{ "name": "vance" }, { "name": "vance" }],
            "pages": {},
            "gizmos": [{ "name": "g" }]
        }))
        .unwrap_err();
        let found: Vec<(&str, &str)> = err
            .field_errors()
            .iter()
            .map(|e| (e.path.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("roles", "Duplicate names: vance"),
                ("pages", "Collection must be an array: pages."),
                ("gizmos", "Invalid collection: gizmos"),
            ]
        );
        assert_eq!(
            err.to_string(),
            "There were 3 errors validating the following collections: roles, pages, gizmos."
        );
    }

    #[test]
    fn test_unknown_collections_can_be_allowed() {
        let registry = registry();
        let doc = Document::from_value(json!({
            "meta": { "version": 3 },
            "gizmos": [{ "name": "g" }]
        }))
        .unwrap();
        let validator = ScriptValidator::new(&registry, 3).reject_unknown_collections(false);
        assert_eq!(validator.validate_document(&doc), Ok(()));
    }

    #[test]
    fn test_resource_errors_are_path_tagged() {
        let err = validate(json!({
            "meta": { "version": 3 },
            "pages": [{ "name": "p1", "role": "ghost" }, { "role": "ghost" }]
        }))
        .unwrap_err();
        let errors = err.field_errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors[0],
            FieldError::new(
                "pages",
                "pages[name=p1]",
                "Reference param \"role\" (\"ghost\") is not in collection \"roles\"."
            )
        );
        assert_eq!(errors[1].path, "pages[name=<unknown>]");
        assert_eq!(errors[1].message, "Required param \"name\" not present.");
    }

    #[test]
    fn test_duplicate_component_ids_across_resources() {
        let err = validate(json!({
            "meta": { "version": 3 },
            "roles": [{ "name": "vance" }],
            "pages": [
                { "name": "p1", "role": "vance", "panels": [{ "type": "text", "id": 7 }] },
                { "name": "p2", "role": "vance", "panels": [{ "type": "text", "id": 7 }] }
            ]
        }))
        .unwrap_err();
        assert_eq!(
            err.field_errors(),
            &[FieldError::new("pages", "pages[name=p2]", "Duplicate id in panels: 7")]
        );
    }

    #[test]
    fn test_number_and_string_ids_are_distinct() {
        let result = validate(json!({
            "meta": { "version": 3 },
            "roles": [{ "name": "vance" }],
            "pages": [
                { "name": "p1", "role": "vance", "panels": [{ "type": "text", "id": 7 }] },
                { "name": "p2", "role": "vance", "panels": [{ "type": "text", "id": "7" }] }
            ]
        }));
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_schema_defect_is_fatal() {
        let registry = Registry::new().with_resource(
            "page",
            ResourceClass::new(Properties::new().field("panels", ParamSpec::component("panels"))),
        );
        let doc = Document::from_value(json!({
            "meta": { "version": 1 },
            "pages": [{ "panels": { "type": "text" } }]
        }))
        .unwrap();
        assert_eq!(
            ScriptValidator::new(&registry, 1).validate_document(&doc),
            Err(ScriptError::Schema(SchemaError::UnknownComponent("panels".into())))
        );
    }
}

//! Structural validation of script content
//!
//! `Validator` checks one field, one params object or one resource against
//! its specs and returns every problem it finds as a message. Content
//! problems are never errors here; only a broken schema is (`SchemaError`).
//! `ScriptValidator` runs the whole document and aggregates.

pub mod scalars;
mod script;

pub use script::ScriptValidator;

use serde_json::Value;

use crate::document::Document;
use crate::error::SchemaError;
use crate::schema::{
    ParamKind, ParamSpec, Properties, Registry, Resolved, ResourceClass, SpecialValue,
};
use crate::walker::Walker;

/// Per-field validator bound to a registry
#[derive(Clone, Copy, Debug)]
pub struct Validator<'r> {
    registry: &'r Registry,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Validate one present value against its spec
    pub fn validate_param(
        &self,
        document: &Document,
        name: &str,
        spec: &ParamSpec,
        param: &Value,
    ) -> Result<Vec<String>, SchemaError> {
        match &spec.kind {
            ParamKind::Scalar(kind) => Ok(scalars::validate(*kind, name, spec.required, param)),
            ParamKind::Enum { options } => enumeration(name, options, param),
            ParamKind::Reference {
                collection,
                special_values,
                allow_null,
            } => Ok(reference(
                document,
                name,
                collection,
                special_values,
                *allow_null,
                param,
            )),
            ParamKind::ComponentReference { component } => {
                self.component_reference(document, name, component, param)
            }
            ParamKind::List { items } => self.list(document, name, items, param),
            ParamKind::Dictionary { keys, values } => {
                self.dictionary(document, name, keys, values, param)
            }
            ParamKind::Object { properties } => {
                self.validate_params(document, properties, param, &format!("{}.", name))
            }
            ParamKind::Component { component } => self.component(document, name, component, param),
        }
    }

    /// Validate a possibly-absent entry of a params object
    pub fn validate_param_entry(
        &self,
        document: &Document,
        spec: &ParamSpec,
        param: Option<&Value>,
        name: &str,
    ) -> Result<Vec<String>, SchemaError> {
        match param {
            // Missing optional params are not validated; no defaults here.
            None if spec.required => Ok(vec![format!("Required param \"{}\" not present.", name)]),
            None => Ok(Vec::new()),
            Some(param) => self.validate_param(document, name, spec, param),
        }
    }

    /// Validate a params object: declared fields, then unexpected keys
    pub fn validate_params(
        &self,
        document: &Document,
        properties: &Properties,
        params: &Value,
        prefix: &str,
    ) -> Result<Vec<String>, SchemaError> {
        if let Some(spec) = properties.self_spec() {
            let name = match prefix.strip_suffix('.') {
                Some(name) if !name.is_empty() => name,
                _ => "self",
            };
            return self.validate_param_entry(document, spec, Some(params), name);
        }

        let fields = match params.as_object() {
            Some(fields) => fields,
            None => return Ok(vec!["Parameters should be an object.".to_string()]),
        };

        let mut warnings = Vec::new();
        for (field, spec) in properties.iter() {
            let name = format!("{}{}", prefix, field);
            warnings.extend(self.validate_param_entry(document, spec, fields.get(field), &name)?);
        }

        // Catch typos by listing what was allowed
        for key in fields.keys() {
            if !properties.contains(key) {
                let allowed: Vec<&str> = properties.names().collect();
                warnings.push(format!(
                    "Unexpected param \"{}{}\" (expected one of: {}).",
                    prefix,
                    key,
                    allowed.join(", ")
                ));
            }
        }

        Ok(warnings)
    }

    /// Validate a whole resource (or component) and run its cross-field hook
    pub fn validate_resource(
        &self,
        document: &Document,
        class: &ResourceClass,
        resource: &Value,
        prefix: &str,
    ) -> Result<Vec<String>, SchemaError> {
        let mut warnings = self.validate_params(document, &class.properties, resource, prefix)?;
        if let Some(hook) = class.validate {
            warnings.extend(hook(document, resource));
        }
        Ok(warnings)
    }

    fn list(
        &self,
        document: &Document,
        name: &str,
        items: &ParamSpec,
        param: &Value,
    ) -> Result<Vec<String>, SchemaError> {
        let elements = match param.as_array() {
            Some(elements) => elements,
            None => return Ok(vec![format!("List param \"{}\" should be an array.", name)]),
        };
        let mut warnings = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            let item_name = format!("{}[{}]", name, index);
            warnings.extend(self.validate_param(document, &item_name, items, element)?);
        }
        Ok(warnings)
    }

    fn dictionary(
        &self,
        document: &Document,
        name: &str,
        keys: &ParamSpec,
        values: &ParamSpec,
        param: &Value,
    ) -> Result<Vec<String>, SchemaError> {
        let entries = match param.as_object() {
            Some(entries) => entries,
            None => {
                return Ok(vec![format!(
                    "Dictionary param \"{}\" should be an object.",
                    name
                )])
            }
        };
        let mut warnings = Vec::new();
        for (key, value) in entries {
            let entry_name = format!("{}[{}]", name, key);
            let key_value = Value::String(key.clone());
            warnings.extend(self.validate_param(document, &entry_name, keys, &key_value)?);
            warnings.extend(self.validate_param(document, &entry_name, values, value)?);
        }
        Ok(warnings)
    }

    fn component(
        &self,
        document: &Document,
        name: &str,
        kind: &str,
        param: &Value,
    ) -> Result<Vec<String>, SchemaError> {
        let def = self.registry.component(kind)?;
        let key = def.discriminator().key();
        match def.discriminator().resolve(param) {
            Resolved::Missing => Ok(vec![format!(
                "Required param \"{}[{}]\" not present.",
                name, key
            )]),
            Resolved::NotAString => Ok(vec![format!(
                "Component param \"{}\" property \"{}\" should be a string.",
                name, key
            )]),
            Resolved::Variant(variant) => match def.variant(&variant) {
                Some(class) => self.validate_resource(document, class, param, &format!("{}.", name)),
                None => {
                    let allowed: Vec<&str> = def.variant_names().collect();
                    Ok(vec![format!(
                        "Component param \"{}\" property \"{}\" (\"{}\") should be one of: {}.",
                        name,
                        key,
                        variant,
                        allowed.join(", ")
                    )])
                }
            },
        }
    }

    fn component_reference(
        &self,
        document: &Document,
        name: &str,
        kind: &str,
        param: &Value,
    ) -> Result<Vec<String>, SchemaError> {
        let id = match param.as_i64() {
            Some(id) => id,
            None => {
                return Ok(vec![format!(
                    "Component reference param \"{}\" (\"{}\") should be an integer.",
                    name,
                    scalars::display(param)
                )])
            }
        };
        let walker = Walker::new(self.registry);
        if walker.get_component_by_id(document, kind, id)?.is_none() {
            return Ok(vec![format!(
                "Component reference param \"{}\" ({}) should be a member of {}.",
                name, id, kind
            )]);
        }
        Ok(Vec::new())
    }
}

fn enumeration(name: &str, options: &[String], param: &Value) -> Result<Vec<String>, SchemaError> {
    if options.is_empty() {
        return Err(SchemaError::EmptyEnum(name.to_string()));
    }
    let is_member = param
        .as_str()
        .map(|value| options.iter().any(|option| option == value))
        .unwrap_or(false);
    if is_member {
        return Ok(Vec::new());
    }
    let quoted: Vec<String> = options.iter().map(|option| format!("\"{}\"", option)).collect();
    Ok(vec![format!(
        "Enum param \"{}\" is not one of {}.",
        name,
        quoted.join(", ")
    )])
}

fn reference(
    document: &Document,
    name: &str,
    collection: &str,
    special_values: &[SpecialValue],
    allow_null: bool,
    param: &Value,
) -> Vec<String> {
    if let Some(value) = param.as_str() {
        if special_values.iter().any(|special| special.value == value) {
            return Vec::new();
        }
    }
    if param.is_null() && allow_null {
        return Vec::new();
    }
    if let Some(problem) = scalars::name_grammar("Reference", name, param) {
        return vec![problem];
    }
    let value = param.as_str().unwrap_or_default();
    if !document.has_resource(collection, value) {
        return vec![format!(
            "Reference param \"{}\" (\"{}\") is not in collection \"{}\".",
            name, value, collection
        )];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ComponentDef, Discriminator};
    use serde_json::json;

    fn registry() -> Registry {
        let animals = ComponentDef::builder("animals", Discriminator::Key("family".into()))
            .common(
                Properties::new()
                    .field("family", ParamSpec::string().required())
                    .field("name", ParamSpec::string()),
            )
            .variant(
                "snake",
                Properties::new().field("isVenomous", ParamSpec::boolean().required()),
            )
            .variant("fish", Properties::new().field("numFins", ParamSpec::number()))
            .build()
            .unwrap();
        let conditions = ComponentDef::builder(
            "conditions",
            Discriminator::Resolve {
                key: "op".into(),
                resolve: first_key,
            },
        )
        .variant("equals", Properties::new().field("equals", ParamSpec::string()))
        .variant(
            "and",
            Properties::new().field("and", ParamSpec::list(ParamSpec::component("conditions"))),
        )
        .build()
        .unwrap();
        Registry::new().with_component(animals).with_component(conditions)
    }

    fn first_key(value: &Value) -> Option<String> {
        value.as_object()?.keys().next().cloned()
    }

    fn doc() -> Document {
        Document::from_value(json!({
            "roles": [{ "name": "vance" }]
        }))
        .unwrap()
    }

    fn check(spec: &ParamSpec, param: Value) -> Vec<String> {
        let registry = registry();
        Validator::new(&registry)
            .validate_param(&doc(), "s", spec, &param)
            .unwrap()
    }

    #[test]
    fn test_dictionary_checks_keys_and_values() {
        let spec = ParamSpec::dictionary(ParamSpec::name(), ParamSpec::number());
        assert!(check(&spec, json!({ "a": 1, "b": "2" })).is_empty());
        assert_eq!(
            check(&spec, json!("abc")),
            vec!["Dictionary param \"s\" should be an object."]
        );
        assert_eq!(
            check(&spec, json!({ "1a": 1 })),
            vec!["Name param \"s[1a]\" (\"1a\") should start with a letter."]
        );
        assert_eq!(
            check(&spec, json!({ "a": "x" })),
            vec!["Number param \"s[a]\" should be a number."]
        );
    }

    #[test]
    fn test_list_collects_every_element_error() {
        let spec = ParamSpec::list(ParamSpec::number());
        assert!(check(&spec, json!([1, 2])).is_empty());
        assert_eq!(check(&spec, json!({})), vec!["List param \"s\" should be an array."]);
        assert_eq!(
            check(&spec, json!(["x", 1, "y"])),
            vec![
                "Number param \"s[0]\" should be a number.",
                "Number param \"s[2]\" should be a number.",
            ]
        );
    }

    #[test]
    fn test_object() {
        let spec = ParamSpec::object(
            Properties::new()
                .field("name", ParamSpec::name().required())
                .field("count", ParamSpec::number()),
        );
        assert!(check(&spec, json!({ "name": "test", "count": 123 })).is_empty());
        assert_eq!(
            check(&spec, json!({ "count": 2 })),
            vec!["Required param \"s.name\" not present."]
        );
        assert_eq!(
            check(&spec, json!({ "count": [123], "extra": true })),
            vec![
                "Required param \"s.name\" not present.",
                "Number param \"s.count\" should be a number.",
                "Unexpected param \"s.extra\" (expected one of: name, count).",
            ]
        );
    }

    #[test]
    fn test_object_gathers_multiple_warnings_in_order() {
        let spec = ParamSpec::object(
            Properties::new()
                .field("name", ParamSpec::name().required())
                .field("count", ParamSpec::number()),
        );
        assert_eq!(
            check(&spec, json!({ "extra": true })),
            vec![
                "Required param \"s.name\" not present.",
                "Unexpected param \"s.extra\" (expected one of: name, count).",
            ]
        );
        assert_eq!(
            check(&spec, json!("abc")),
            vec!["Parameters should be an object."]
        );
    }

    #[test]
    fn test_enum() {
        let spec = ParamSpec::enumeration(["a", "b"]);
        assert!(check(&spec, json!("a")).is_empty());
        assert_eq!(check(&spec, json!("c")), vec!["Enum param \"s\" is not one of \"a\", \"b\"."]);

        let registry = registry();
        let empty = ParamSpec::enumeration(Vec::<String>::new());
        assert_eq!(
            Validator::new(&registry).validate_param(&doc(), "s", &empty, &json!("a")),
            Err(SchemaError::EmptyEnum("s".into()))
        );
    }

    #[test]
    fn test_reference() {
        let spec = ParamSpec::reference("roles")
            .with_special_values([SpecialValue::new("all")]);
        assert!(check(&spec, json!("vance")).is_empty());
        assert!(check(&spec, json!("all")).is_empty());
        assert_eq!(
            check(&spec, json!("ghost")),
            vec!["Reference param \"s\" (\"ghost\") is not in collection \"roles\"."]
        );
        assert_eq!(
            check(&spec, json!(null)),
            vec!["Reference param \"s\" (\"null\") should be a string."]
        );
        assert!(check(&spec.clone().nullable(), json!(null)).is_empty());
        assert_eq!(
            check(&spec, json!("")),
            vec!["Reference param \"s\" should not be blank."]
        );
    }

    #[test]
    fn test_component_members_of_either_class() {
        let spec = ParamSpec::component("animals");
        assert!(check(&spec, json!({ "family": "snake", "name": "rattler", "isVenomous": true })).is_empty());
        assert!(check(&spec, json!({ "family": "fish", "name": "zebrafish" })).is_empty());
    }

    #[test]
    fn test_component_warnings() {
        let spec = ParamSpec::component("animals");
        assert_eq!(check(&spec, json!({})), vec!["Required param \"s[family]\" not present."]);
        assert_eq!(
            check(&spec, json!({ "family": 123 })),
            vec!["Component param \"s\" property \"family\" should be a string."]
        );
        assert_eq!(
            check(&spec, json!({ "family": "marsupial" })),
            vec!["Component param \"s\" property \"family\" (\"marsupial\") should be one of: snake, fish."]
        );
        assert_eq!(
            check(&spec, json!({ "family": "snake", "name": false, "isVenomous": true })),
            vec!["String param \"s.name\" should be a string."]
        );
        assert_eq!(
            check(&spec, json!({ "family": "snake", "isVenomous": "abc" })),
            vec!["Boolean param \"s.isVenomous\" (\"abc\") should be true or false."]
        );
        assert_eq!(
            check(&spec, json!({ "family": "snake", "isVenomous": false, "numFins": 3 })),
            vec!["Unexpected param \"s.numFins\" (expected one of: family, name, isVenomous)."]
        );
    }

    #[test]
    fn test_resolved_component_validates_without_stored_variant() {
        let spec = ParamSpec::component("conditions");
        assert!(check(&spec, json!({ "equals": "x" })).is_empty());
        assert!(check(&spec, json!({ "and": [{ "equals": "x" }, { "equals": "y" }] })).is_empty());
        assert_eq!(
            check(&spec, json!({ "and": [{ "equals": 3 }] })),
            vec!["String param \"s.and[0].equals\" should be a string."]
        );
        assert_eq!(check(&spec, json!(null)), vec!["Required param \"s[op]\" not present."]);
        assert_eq!(
            check(&spec, json!({ "op": "equals" })),
            vec!["Component param \"s\" property \"op\" (\"op\") should be one of: equals, and."]
        );
    }

    #[test]
    fn test_unknown_component_is_fatal() {
        let registry = registry();
        let spec = ParamSpec::component("plants");
        assert_eq!(
            Validator::new(&registry).validate_param(&doc(), "s", &spec, &json!({})),
            Err(SchemaError::UnknownComponent("plants".into()))
        );
    }

    #[test]
    fn test_self_passthrough() {
        let registry = registry();
        let validator = Validator::new(&registry);
        let properties = Properties::new().field("self", ParamSpec::name().required());

        assert!(validator
            .validate_params(&doc(), &properties, &json!("abc"), "")
            .unwrap()
            .is_empty());
        assert_eq!(
            validator
                .validate_params(&doc(), &properties, &json!("1bc"), "cond.")
                .unwrap(),
            vec!["Name param \"cond\" (\"1bc\") should start with a letter."]
        );
    }

    #[test]
    fn test_resource_hook_appends() {
        fn needs_title_or_text(_: &Document, resource: &Value) -> Vec<String> {
            if resource.get("title").is_none() && resource.get("text").is_none() {
                return vec!["Either title or text must be set.".to_string()];
            }
            Vec::new()
        }
        let registry = registry();
        let class = ResourceClass::new(
            Properties::new()
                .field("name", ParamSpec::name().required())
                .field("title", ParamSpec::string())
                .field("text", ParamSpec::string()),
        )
        .with_hook(needs_title_or_text);

        let warnings = Validator::new(&registry)
            .validate_resource(&doc(), &class, &json!({ "extra": 1 }), "")
            .unwrap();
        assert_eq!(
            warnings,
            vec![
                "Required param \"name\" not present.",
                "Unexpected param \"extra\" (expected one of: name, title, text).",
                "Either title or text must be set.",
            ]
        );
    }
}

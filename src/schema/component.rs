//! Polymorphic components
//!
//! A component kind is a discriminated union: the value of one field (the
//! discriminator) picks a variant, and each variant contributes its own
//! fields on top of a common base shared by all variants. Variants are
//! flattened when the definition is built, so lookups never merge.

use serde_json::Value;

use super::registry::{ResourceClass, ValidateHook};
use super::{ParamSpec, Properties};
use crate::error::SchemaError;

/// How a component value names its variant
#[derive(Clone, Debug)]
pub enum Discriminator {
    /// The variant name is stored under this key
    Key(String),
    /// Irregular components compute the variant from the whole value.
    /// `key` is still used to report a missing discriminator.
    Resolve {
        key: String,
        resolve: fn(&Value) -> Option<String>,
    },
}

/// Outcome of reading a discriminator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    Missing,
    NotAString,
    Variant(String),
}

impl Discriminator {
    pub fn key(&self) -> &str {
        match self {
            Discriminator::Key(key) => key,
            Discriminator::Resolve { key, .. } => key,
        }
    }

    pub fn resolve(&self, value: &Value) -> Resolved {
        match self {
            Discriminator::Key(key) => match value.get(key) {
                None | Some(Value::Null) => Resolved::Missing,
                Some(Value::String(name)) if name.is_empty() => Resolved::Missing,
                Some(Value::String(name)) => Resolved::Variant(name.clone()),
                Some(_) => Resolved::NotAString,
            },
            Discriminator::Resolve { resolve, .. } => {
                if value.is_null() {
                    return Resolved::Missing;
                }
                match resolve(value) {
                    Some(name) => Resolved::Variant(name),
                    None => Resolved::Missing,
                }
            }
        }
    }
}

/// A registered component kind with its flattened variants
#[derive(Clone, Debug)]
pub struct ComponentDef {
    kind: String,
    discriminator: Discriminator,
    common: Properties,
    /// Discriminator-only class, used when no valid variant is chosen yet
    type_class: ResourceClass,
    variants: Vec<(String, ResourceClass)>,
}

impl ComponentDef {
    pub fn builder(kind: impl Into<String>, discriminator: Discriminator) -> ComponentDefBuilder {
        ComponentDefBuilder {
            kind: kind.into(),
            discriminator,
            common: Properties::new(),
            variants: Vec::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    pub fn common(&self) -> &Properties {
        &self.common
    }

    /// Variant names in declaration order
    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_variant(&self, name: &str) -> bool {
        self.variant(name).is_some()
    }

    /// Flattened class for a variant
    pub fn variant(&self, name: &str) -> Option<&ResourceClass> {
        self.variants
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, class)| class)
    }

    /// Class for a value: its variant's class, or the discriminator-only
    /// class when the variant is absent or unknown
    pub fn class_for(&self, value: &Value) -> &ResourceClass {
        match self.discriminator.resolve(value) {
            Resolved::Variant(name) => self.variant(&name).unwrap_or(&self.type_class),
            _ => &self.type_class,
        }
    }

    pub fn type_class(&self) -> &ResourceClass {
        &self.type_class
    }
}

/// Collects the pieces of a component kind, then flattens them
pub struct ComponentDefBuilder {
    kind: String,
    discriminator: Discriminator,
    common: Properties,
    variants: Vec<(String, Properties, Option<ValidateHook>)>,
}

impl ComponentDefBuilder {
    /// Fields shared by every variant
    pub fn common(mut self, properties: Properties) -> Self {
        self.common = properties;
        self
    }

    pub fn variant(mut self, name: impl Into<String>, properties: Properties) -> Self {
        self.variants.push((name.into(), properties, None));
        self
    }

    /// A variant with its own cross-field check
    pub fn variant_with_hook(
        mut self,
        name: impl Into<String>,
        properties: Properties,
        validate: ValidateHook,
    ) -> Self {
        self.variants.push((name.into(), properties, Some(validate)));
        self
    }

    pub fn build(self) -> Result<ComponentDef, SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidComponent {
            kind: self.kind.clone(),
            reason,
        };
        if self.discriminator.key().is_empty() {
            return Err(invalid("discriminator key is empty".to_string()));
        }
        if self.variants.is_empty() {
            return Err(invalid("no variants declared".to_string()));
        }
        let mut names: Vec<&str> = Vec::new();
        for (name, _, _) in &self.variants {
            if names.contains(&name.as_str()) {
                return Err(invalid(format!("variant \"{}\" declared twice", name)));
            }
            names.push(name);
        }

        // Only a keyed discriminator is a stored field. Resolved variants are
        // computed from the value, so their classes carry no discriminator.
        let type_properties = match &self.discriminator {
            Discriminator::Key(key) => Properties::new().field(
                key.as_str(),
                ParamSpec::enumeration(names.iter().copied())
                    .required()
                    .with_help(format!("Type of {}.", self.kind)),
            ),
            Discriminator::Resolve { .. } => Properties::new(),
        };
        let base = type_properties.merged(&self.common);

        let variants = self
            .variants
            .iter()
            .map(|(name, properties, validate)| {
                let class = ResourceClass {
                    properties: base.merged(properties),
                    validate: *validate,
                };
                (name.clone(), class)
            })
            .collect();

        Ok(ComponentDef {
            type_class: ResourceClass::new(type_properties),
            kind: self.kind,
            discriminator: self.discriminator,
            common: self.common,
            variants,
        })
    }
}

//! Declarative field specs
//!
//! A schema describes the allowed shape of every field in a resource:
//! its kind (scalar, enum, reference, list, dictionary, object, component),
//! whether it is required, and the kind-specific parameters.

mod component;
mod registry;

pub use component::{ComponentDef, ComponentDefBuilder, Discriminator, Resolved};
pub use registry::{Registry, ResourceClass, ValidateHook};

use serde::{Deserialize, Serialize};

/// Terminal value formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarKind {
    String,
    Markdown,
    Email,
    SimpleValue,
    Integer,
    Number,
    Boolean,
    Color,
    Duration,
    TimeOffset,
    TimeShorthand,
    Name,
    Media,
    Coords,
    SimpleAttribute,
    Lookupable,
    Location,
}

impl ScalarKind {
    /// Prefix used in validation messages, e.g. `Time offset param "x" ...`
    pub fn label(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Markdown => "Markdown",
            ScalarKind::Email => "Email",
            ScalarKind::SimpleValue => "Simple",
            ScalarKind::Integer => "Integer",
            ScalarKind::Number => "Number",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Color => "Color",
            ScalarKind::Duration => "Duration",
            ScalarKind::TimeOffset => "Time offset",
            ScalarKind::TimeShorthand => "Time shorthand",
            ScalarKind::Name => "Name",
            ScalarKind::Media => "Media",
            ScalarKind::Coords => "Coords",
            ScalarKind::SimpleAttribute => "Simple attribute",
            ScalarKind::Lookupable => "Lookupable",
            ScalarKind::Location => "Location",
        }
    }

    /// Author-facing description of the format
    pub fn help(&self) -> &'static str {
        match self {
            ScalarKind::String => "Arbitrary text, usually for display to a participant.",
            ScalarKind::Markdown => "Text styled with markdown.",
            ScalarKind::Email => "An email address.",
            ScalarKind::SimpleValue => "A string, number, or true or false.",
            ScalarKind::Integer => "A simple integer value: 0, 100, -50, etc.",
            ScalarKind::Number => "An integer or number with a decimal.",
            ScalarKind::Boolean => "A simple true or false value.",
            ScalarKind::Color => "A color, in hexadecimal format (#FFFFFF).",
            ScalarKind::Duration => "A positive duration such as 10s, 5m or 1.5h.",
            ScalarKind::TimeOffset => {
                "An offset of time as number and unit, e.g. 10s, 3.5h or -40m."
            }
            ScalarKind::TimeShorthand => {
                "A clock time relative to the start of the experience, e.g. 3:00pm or +1d 4:15pm."
            }
            ScalarKind::Name => "A reference to the name of an element in the script.",
            ScalarKind::Media => "Uploaded media: an image, video, or audio clip URL.",
            ScalarKind::Coords => "Latitude/longitude coordinates.",
            ScalarKind::SimpleAttribute => "A variable name: letters, numbers and underscores.",
            ScalarKind::Lookupable => "A variable lookup, quoted text, or a literal value.",
            ScalarKind::Location => "A geocodable location with coordinates.",
        }
    }
}

/// An escape value accepted by a reference field without lookup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SpecialValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }

    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
        }
    }
}

/// The shape of a field. Every validator and walker arm matches on this.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamKind {
    Scalar(ScalarKind),
    Enum {
        options: Vec<String>,
    },
    /// Name of a resource in `collection`
    Reference {
        collection: String,
        special_values: Vec<SpecialValue>,
        allow_null: bool,
    },
    /// Integer id of a component instance of kind `component`
    ComponentReference {
        component: String,
    },
    List {
        items: Box<ParamSpec>,
    },
    Dictionary {
        keys: Box<ParamSpec>,
        values: Box<ParamSpec>,
    },
    Object {
        properties: Properties,
    },
    /// Discriminated union registered under `component` in the registry
    Component {
        component: String,
    },
}

impl ParamKind {
    /// A leaf the walker reports, as opposed to a container it descends
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ParamKind::Scalar(_)
                | ParamKind::Enum { .. }
                | ParamKind::Reference { .. }
                | ParamKind::ComponentReference { .. }
        )
    }
}

/// Field spec: kind plus flags for one param
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub required: bool,
    pub help: Option<String>,
}

impl ParamSpec {
    pub fn new(kind: ParamKind) -> Self {
        Self {
            kind,
            required: false,
            help: None,
        }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(ParamKind::Scalar(kind))
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn name() -> Self {
        Self::scalar(ScalarKind::Name)
    }

    pub fn number() -> Self {
        Self::scalar(ScalarKind::Number)
    }

    pub fn integer() -> Self {
        Self::scalar(ScalarKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn enumeration<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ParamKind::Enum {
            options: options.into_iter().map(Into::into).collect(),
        })
    }

    pub fn reference(collection: impl Into<String>) -> Self {
        Self::new(ParamKind::Reference {
            collection: collection.into(),
            special_values: Vec::new(),
            allow_null: false,
        })
    }

    pub fn component_reference(component: impl Into<String>) -> Self {
        Self::new(ParamKind::ComponentReference {
            component: component.into(),
        })
    }

    pub fn list(items: ParamSpec) -> Self {
        Self::new(ParamKind::List {
            items: Box::new(items),
        })
    }

    pub fn dictionary(keys: ParamSpec, values: ParamSpec) -> Self {
        Self::new(ParamKind::Dictionary {
            keys: Box::new(keys),
            values: Box::new(values),
        })
    }

    pub fn object(properties: Properties) -> Self {
        Self::new(ParamKind::Object { properties })
    }

    pub fn component(component: impl Into<String>) -> Self {
        Self::new(ParamKind::Component {
            component: component.into(),
        })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add escape values to a reference spec; no effect on other kinds
    pub fn with_special_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = SpecialValue>,
    {
        if let ParamKind::Reference { special_values, .. } = &mut self.kind {
            special_values.extend(values);
        }
        self
    }

    /// Accept `null` in a reference spec; no effect on other kinds
    pub fn nullable(mut self) -> Self {
        if let ParamKind::Reference { allow_null, .. } = &mut self.kind {
            *allow_null = true;
        }
        self
    }
}

/// Ordered field name -> spec map for resources, objects and components
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties {
    fields: Vec<(String, ParamSpec)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`
    pub fn field(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Insert a field. A field that already exists keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, spec: ParamSpec) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = spec,
            None => self.fields.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The spec of the lone `self` field, if that is the only field.
    ///
    /// Such a spec describes a value that is "just a scalar with metadata",
    /// so the value itself is checked against it rather than an object.
    pub fn self_spec(&self) -> Option<&ParamSpec> {
        match self.fields.as_slice() {
            [(name, spec)] if name == "self" => Some(spec),
            _ => None,
        }
    }

    /// Overlay `other` on top of these fields; `other` wins on conflict
    pub fn merged(&self, other: &Properties) -> Properties {
        let mut merged = self.clone();
        for (name, spec) in other.iter() {
            merged.insert(name, spec.clone());
        }
        merged
    }
}

impl<S: Into<String>> FromIterator<(S, ParamSpec)> for Properties {
    fn from_iter<T: IntoIterator<Item = (S, ParamSpec)>>(iter: T) -> Self {
        let mut properties = Properties::new();
        for (name, spec) in iter {
            properties.insert(name, spec);
        }
        properties
    }
}

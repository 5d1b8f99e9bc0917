//! Shared fixtures: a small script registry, a sample document and a few
//! migrations with before/after fixtures.

#![allow(dead_code)]

use serde_json::{json, Value};

use tripscript::migrator::{Migration, MigrationTest, Transformation};
use tripscript::schema::{
    ComponentDef, Discriminator, ParamSpec, Properties, Registry, ResourceClass, ScalarKind,
    SpecialValue,
};
use tripscript::Document;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

fn panels() -> ComponentDef {
    ComponentDef::builder("panels", Discriminator::Key("type".into()))
        .common(Properties::new().field("id", ParamSpec::integer().required()))
        .variant("text", Properties::new().field("text", ParamSpec::string()))
        .variant(
            "image",
            Properties::new().field("image", ParamSpec::scalar(ScalarKind::Media)),
        )
        .build()
        .expect("panels component")
}

fn actions() -> ComponentDef {
    let branch = Properties::new()
        .field("if", ParamSpec::scalar(ScalarKind::Lookupable).required())
        .field("actions", ParamSpec::list(ParamSpec::component("actions")));
    ComponentDef::builder("actions", Discriminator::Key("name".into()))
        .common(Properties::new().field("id", ParamSpec::integer().required()))
        .variant(
            "signal_cue",
            Properties::new().field("cue_name", ParamSpec::reference("cues").required()),
        )
        .variant(
            "wait",
            Properties::new().field("duration", ParamSpec::scalar(ScalarKind::Duration)),
        )
        .variant(
            "conditional",
            branch
                .clone()
                .field("elseifs", ParamSpec::list(ParamSpec::object(branch)))
                .field("else", ParamSpec::list(ParamSpec::component("actions"))),
        )
        .build()
        .expect("actions component")
}

fn needs_actions(_: &Document, trigger: &Value) -> Vec<String> {
    match trigger.get("actions").and_then(Value::as_array) {
        Some(actions) if !actions.is_empty() => Vec::new(),
        _ => vec!["Trigger should have at least one action.".to_string()],
    }
}

pub fn registry() -> Registry {
    Registry::new()
        .with_component(panels())
        .with_component(actions())
        .with_unique_ids("panels", "id")
        .with_unique_ids("actions", "id")
        .with_resource(
            "role",
            ResourceClass::new(
                Properties::new()
                    .field("name", ParamSpec::name().required())
                    .field("title", ParamSpec::string()),
            ),
        )
        .with_resource(
            "scene",
            ResourceClass::new(
                Properties::new()
                    .field("name", ParamSpec::name().required())
                    .field("title", ParamSpec::string().required()),
            ),
        )
        .with_resource(
            "cue",
            ResourceClass::new(
                Properties::new()
                    .field("name", ParamSpec::name().required())
                    .field("scene", ParamSpec::reference("scenes")),
            ),
        )
        .with_resource(
            "message",
            ResourceClass::new(
                Properties::new()
                    .field("name", ParamSpec::name().required())
                    .field("role_name", ParamSpec::reference("roles").required())
                    .field("body", ParamSpec::scalar(ScalarKind::Markdown))
                    .field("panel_id", ParamSpec::component_reference("panels")),
            ),
        )
        .with_resource(
            "page",
            ResourceClass::new(
                Properties::new()
                    .field("name", ParamSpec::name().required())
                    .field("scene", ParamSpec::reference("scenes").required())
                    .field(
                        "role",
                        ParamSpec::reference("roles")
                            .required()
                            .with_special_values([SpecialValue::labeled("all", "All roles")]),
                    )
                    .field("panels", ParamSpec::list(ParamSpec::component("panels")))
                    .field(
                        "greetings",
                        ParamSpec::dictionary(ParamSpec::reference("roles"), ParamSpec::string()),
                    ),
            ),
        )
        .with_resource(
            "trigger",
            ResourceClass::new(
                Properties::new()
                    .field("name", ParamSpec::name().required())
                    .field("scene", ParamSpec::reference("scenes").required())
                    .field(
                        "event",
                        ParamSpec::object(
                            Properties::new()
                                .field(
                                    "type",
                                    ParamSpec::enumeration(["cue_signaled", "time_occurred"])
                                        .required(),
                                )
                                .field("cue", ParamSpec::reference("cues"))
                                .field("offset", ParamSpec::scalar(ScalarKind::TimeOffset)),
                        ),
                    )
                    .field("actions", ParamSpec::list(ParamSpec::component("actions"))),
            )
            .with_hook(needs_actions),
        )
        .with_resource(
            "layout",
            ResourceClass::new(
                Properties::new()
                    .field("name", ParamSpec::name().required())
                    .field(
                        "regions",
                        ParamSpec::list(ParamSpec::dictionary(
                            ParamSpec::name(),
                            ParamSpec::object(
                                Properties::new()
                                    .field("weight", ParamSpec::number())
                                    .field("panel", ParamSpec::component("panels")),
                            ),
                        )),
                    ),
            ),
        )
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub fn document(content: Value) -> Document {
    Document::from_value(content).expect("document must be an object")
}

/// A valid script at `version`
pub fn sample(version: u64) -> Document {
    document(json!({
        "meta": { "version": version },
        "roles": [{ "name": "vance", "title": "Vance" }, { "name": "max" }],
        "scenes": [{ "name": "intro", "title": "Intro" }],
        "cues": [{ "name": "start", "scene": "intro" }],
        "messages": [{ "name": "hello", "role_name": "vance", "body": "*hi*", "panel_id": 2 }],
        "pages": [
            {
                "name": "welcome",
                "scene": "intro",
                "role": "all",
                "panels": [
                    { "id": 1, "type": "text", "text": "Welcome" },
                    { "id": 2, "type": "image", "image": "https://example.com/a.png" }
                ],
                "greetings": { "vance": "Hello Vance" }
            }
        ],
        "triggers": [
            {
                "name": "on_start",
                "scene": "intro",
                "event": { "type": "cue_signaled", "cue": "start" },
                "actions": [
                    {
                        "id": 10,
                        "name": "conditional",
                        "if": "ready",
                        "actions": [{ "id": 11, "name": "signal_cue", "cue_name": "start" }],
                        "elseifs": [{
                            "if": "late",
                            "actions": [{ "id": 12, "name": "wait", "duration": "5m" }]
                        }],
                        "else": [{ "id": 13, "name": "signal_cue", "cue_name": "start" }]
                    }
                ]
            }
        ],
        "layouts": [
            {
                "name": "grid",
                "regions": [
                    {
                        "left": { "weight": 1, "panel": { "id": 20, "type": "text", "text": "L" } },
                        "right": { "weight": 2 }
                    },
                    {
                        "footer": { "panel": { "id": 21, "type": "image", "image": "https://example.com/f.png" } }
                    }
                ]
            }
        ]
    }))
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

/// Scene titles become upper case
pub fn uppercase_titles(num: u64) -> Migration {
    Migration::new(num, format!("{}-uppercase-titles", num))
        .with_transformation(Transformation::collection("scenes", |scene, _| {
            if let Some(title) = scene.get("title").and_then(Value::as_str) {
                let upper = title.to_uppercase();
                scene["title"] = Value::String(upper);
            }
            Ok(())
        }))
        .with_test(MigrationTest::new(
            json!({ "scenes": [{ "name": "s1", "title": "intro" }] }),
            json!({ "scenes": [{ "name": "s1", "title": "INTRO" }] }),
        ))
}

/// Panel `content` moves to `text`, wherever panels are nested
pub fn rename_panel_content(num: u64) -> Migration {
    Migration::new(num, format!("{}-rename-panel-content", num))
        .with_transformation(Transformation::component("panels", |panel, _, _| {
            if let Some(fields) = panel.as_object_mut() {
                if let Some(content) = fields.remove("content") {
                    fields.insert("text".to_string(), content);
                }
            }
            Ok(())
        }))
        .with_test(MigrationTest::new(
            json!({
                "pages": [{ "name": "p", "panels": [{ "id": 1, "type": "text", "content": "a" }] }]
            }),
            json!({
                "pages": [{ "name": "p", "panels": [{ "id": 1, "type": "text", "text": "a" }] }]
            }),
        ))
}

/// Every role gets a default message, created from the asset list
pub fn greet_roles(num: u64) -> Migration {
    Migration::new(num, format!("{}-greet-roles", num))
        .with_transformation(Transformation::collection("roles", |role, context| {
            let greeting = context
                .assets()
                .and_then(|assets| assets.get("greeting"))
                .and_then(Value::as_str)
                .unwrap_or("Hello")
                .to_string();
            let role_name = role["name"].as_str().unwrap_or_default().to_string();
            context.push_resource(
                "messages",
                json!({
                    "name": format!("greet_{}", role_name),
                    "role_name": role_name,
                    "body": greeting
                }),
            );
            Ok(())
        }))
        .with_test(
            MigrationTest::new(
                json!({ "roles": [{ "name": "vance" }] }),
                json!({
                    "roles": [{ "name": "vance" }],
                    "messages": [{ "name": "greet_vance", "role_name": "vance", "body": "Hi" }]
                }),
            )
            .with_assets(json!({ "greeting": "Hi" })),
        )
}

pub fn migrations() -> Vec<Migration> {
    vec![greet_roles(3), uppercase_titles(1), rename_panel_content(2)]
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

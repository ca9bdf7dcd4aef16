// SPDX-License-Identifier: MIT OR Apache-2.0
//! The baked-in catalog of MCP protocol methods fuzzed directly (as opposed
//! to tools discovered via `tools/list`), each with a request-parameter
//! schema the generator can drive.

use mcpf_core::{JsonSchema, PrimitiveType, SchemaType};
use std::collections::BTreeMap;

/// One entry in the protocol method catalog.
#[derive(Debug, Clone)]
pub struct ProtocolMethod {
    /// The JSON-RPC method name, e.g. `"tools/call"`.
    pub name: &'static str,
    /// Schema for this method's `params`.
    pub params_schema: JsonSchema,
    /// True if this method is a notification (no reply expected).
    pub is_notification: bool,
}

/// The fixed catalog of MCP methods fuzzed at the protocol level.
pub fn catalog() -> Vec<ProtocolMethod> {
    vec![
        ProtocolMethod {
            name: "initialize",
            params_schema: initialize_schema(),
            is_notification: false,
        },
        ProtocolMethod {
            name: "tools/list",
            params_schema: pagination_schema(),
            is_notification: false,
        },
        ProtocolMethod {
            name: "tools/call",
            params_schema: tools_call_schema(),
            is_notification: false,
        },
        ProtocolMethod {
            name: "resources/read",
            params_schema: resources_read_schema(),
            is_notification: false,
        },
        ProtocolMethod {
            name: "prompts/get",
            params_schema: prompts_get_schema(),
            is_notification: false,
        },
        ProtocolMethod {
            name: "notifications/progress",
            params_schema: progress_schema(),
            is_notification: true,
        },
        ProtocolMethod {
            name: "notifications/cancelled",
            params_schema: cancelled_schema(),
            is_notification: true,
        },
    ]
}

fn object(required: &[&str], properties: BTreeMap<String, JsonSchema>) -> JsonSchema {
    JsonSchema {
        schema_type: Some(SchemaType::Single(PrimitiveType::Object)),
        required: required.iter().map(|s| s.to_string()).collect(),
        properties,
        ..JsonSchema::any()
    }
}

fn string() -> JsonSchema {
    JsonSchema::of_type(PrimitiveType::String)
}

fn integer() -> JsonSchema {
    JsonSchema::of_type(PrimitiveType::Integer)
}

fn initialize_schema() -> JsonSchema {
    let mut props = BTreeMap::new();
    props.insert("protocolVersion".to_string(), string());
    props.insert("capabilities".to_string(), JsonSchema::of_type(PrimitiveType::Object));
    props.insert("clientInfo".to_string(), JsonSchema::of_type(PrimitiveType::Object));
    object(&["protocolVersion"], props)
}

fn pagination_schema() -> JsonSchema {
    let mut props = BTreeMap::new();
    props.insert("cursor".to_string(), string());
    object(&[], props)
}

fn tools_call_schema() -> JsonSchema {
    let mut props = BTreeMap::new();
    props.insert("name".to_string(), string());
    props.insert("arguments".to_string(), JsonSchema::of_type(PrimitiveType::Object));
    object(&["name"], props)
}

fn resources_read_schema() -> JsonSchema {
    let mut props = BTreeMap::new();
    props.insert("uri".to_string(), JsonSchema { format: Some("uri".to_string()), ..string() });
    object(&["uri"], props)
}

fn prompts_get_schema() -> JsonSchema {
    let mut props = BTreeMap::new();
    props.insert("name".to_string(), string());
    props.insert("arguments".to_string(), JsonSchema::of_type(PrimitiveType::Object));
    object(&["name"], props)
}

fn progress_schema() -> JsonSchema {
    let mut props = BTreeMap::new();
    props.insert("progressToken".to_string(), string());
    props.insert("progress".to_string(), integer());
    props.insert("total".to_string(), integer());
    object(&["progressToken", "progress"], props)
}

fn cancelled_schema() -> JsonSchema {
    let mut props = BTreeMap::new();
    props.insert("requestId".to_string(), string());
    props.insert("reason".to_string(), string());
    object(&["requestId"], props)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_one_entry_per_known_method() {
        let methods: Vec<_> = catalog().into_iter().map(|m| m.name).collect();
        assert!(methods.contains(&"initialize"));
        assert!(methods.contains(&"tools/list"));
        assert!(methods.contains(&"tools/call"));
        assert!(methods.contains(&"resources/read"));
        assert!(methods.contains(&"prompts/get"));
    }

    #[test]
    fn notifications_are_flagged() {
        let methods = catalog();
        let progress = methods.iter().find(|m| m.name == "notifications/progress").unwrap();
        assert!(progress.is_notification);
        let initialize = methods.iter().find(|m| m.name == "initialize").unwrap();
        assert!(!initialize.is_notification);
    }

    #[test]
    fn tools_call_requires_a_name() {
        let methods = catalog();
        let tools_call = methods.iter().find(|m| m.name == "tools/call").unwrap();
        assert_eq!(tools_call.params_schema.required, vec!["name".to_string()]);
    }
}

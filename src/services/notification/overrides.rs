//! Override Policy
//!
//! Merges caller-supplied custom fields into the derived context and decides
//! whether the message comes from a template or from a literal custom message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::NotificationContext;

/// Context keys custom fields can never replace.
pub const PROTECTED_FIELDS: [&str; 2] = ["duration", "firstFailed"];

/// Key under which the custom fields are also exposed as one object.
pub const CUSTOM_FIELDS_KEY: &str = "customFields";

/// User overrides shared by every execution notification task
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

impl Overrides {
    /// The custom message, when present and not blank.
    pub fn message(&self) -> Option<&str> {
        self.custom_message
            .as_deref()
            .filter(|msg| !msg.trim().is_empty())
    }
}

/// What the renderer should produce for this invocation
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan {
    /// Render the named template with the merged fields
    Template {
        template_id: String,
        fields: Map<String, Value>,
    },
    /// Send the custom message, substituting the merged fields into it
    Literal {
        message: String,
        fields: Map<String, Value>,
    },
}

impl RenderPlan {
    pub fn fields(&self) -> &Map<String, Value> {
        match self {
            Self::Template { fields, .. } | Self::Literal { fields, .. } => fields,
        }
    }
}

/// Apply the overrides to a built context.
pub fn apply(context: &NotificationContext, overrides: &Overrides, template_id: &str) -> RenderPlan {
    let fields = merge_fields(context.to_render_map(), overrides.custom_fields.as_ref());

    match overrides.message() {
        Some(message) => RenderPlan::Literal {
            message: message.to_string(),
            fields,
        },
        None => RenderPlan::Template {
            template_id: template_id.to_string(),
            fields,
        },
    }
}

fn merge_fields(
    mut base: Map<String, Value>,
    custom: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let custom = custom.cloned().unwrap_or_default();

    for (key, value) in &custom {
        if PROTECTED_FIELDS.contains(&key.as_str()) {
            tracing::debug!(field = %key, "Ignoring custom field shadowing a protected key");
            continue;
        }
        base.insert(key.clone(), value.clone());
    }

    base.insert(CUSTOM_FIELDS_KEY.to_string(), Value::Object(custom));
    base
}

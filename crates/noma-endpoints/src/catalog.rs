//! The v1 resource catalog.

use noma_core::HttpMethod;
use serde_json::{json, Value};

use crate::resource::ResourceSpec;
use crate::store::Record;

/// People who receive notifications.
pub const CONTACTS: ResourceSpec = ResourceSpec {
    endpoint: "contacts",
    entity: "Contact",
    methods: &HttpMethod::ALL,
    columns: &["id", "full_name", "username", "default_channel", "addresses", "groups"],
    required: &["full_name"],
};

/// Named sets of contacts.
pub const CONTACT_GROUPS: ResourceSpec = ResourceSpec {
    endpoint: "contactgroups",
    entity: "Contact group",
    methods: &HttpMethod::ALL,
    columns: &["id", "name", "users"],
    required: &["name"],
};

/// Delivery channels. Configured by operators, read-only over the API.
pub const CHANNELS: ResourceSpec = ResourceSpec {
    endpoint: "channels",
    entity: "Channel",
    methods: &[HttpMethod::Get],
    columns: &["id", "name", "type"],
    required: &["name", "type"],
};

/// Channels available on a fresh installation.
pub fn default_channels() -> Vec<Record> {
    [
        json!({ "id": "0b1e2b8e-6c3a-4f0e-9a55-3c0f5b2d7e11", "name": "Email", "type": "email" }),
        json!({ "id": "5d7c9a41-2e86-4b3f-8c1d-9e0a4f6b2c73", "name": "Webhook", "type": "webhook" }),
        json!({ "id": "a3f4e5d6-7b8c-4d9e-af01-b2c3d4e5f607", "name": "Rocket.Chat", "type": "rocketchat" }),
    ]
    .into_iter()
    .filter_map(|value| match value {
        Value::Object(record) => Some(record),
        _ => None,
    })
    .collect()
}

//! Startup-time registry wiring.

use noma_core::EndpointRegistry;

use crate::catalog::{default_channels, CHANNELS, CONTACTS, CONTACT_GROUPS};
use crate::resource::{ResourceEndpoint, ResourceSpec};
use crate::store::ResourceStore;

/// The only API version currently served.
pub const V1: &str = "v1";

/// Stores backing the v1 endpoints.
///
/// Keep a clone to inspect or seed data the registry serves.
#[derive(Debug, Clone)]
pub struct V1Stores {
    /// Contact records.
    pub contacts: ResourceStore,
    /// Contact group records.
    pub contact_groups: ResourceStore,
    /// Channel records.
    pub channels: ResourceStore,
}

impl Default for V1Stores {
    fn default() -> Self {
        Self {
            contacts: ResourceStore::new(),
            contact_groups: ResourceStore::new(),
            channels: ResourceStore::seeded(default_channels()),
        }
    }
}

/// Builds the v1 registry with fresh stores, mounted under `base_path`.
pub fn v1_registry(base_path: &str) -> EndpointRegistry {
    v1_registry_with(base_path, &V1Stores::default())
}

/// Builds the v1 registry over existing stores.
pub fn v1_registry_with(base_path: &str, stores: &V1Stores) -> EndpointRegistry {
    let mount = |spec: ResourceSpec, store: &ResourceStore| {
        let path = format!("{}/{V1}/{}", base_path.trim_end_matches('/'), spec.endpoint);
        ResourceEndpoint::new(spec, store.clone(), path)
    };

    let registry = EndpointRegistry::builder()
        .register(V1, mount(CONTACTS, &stores.contacts))
        .register(V1, mount(CONTACT_GROUPS, &stores.contact_groups))
        .register(V1, mount(CHANNELS, &stores.channels))
        .build();

    for (version, endpoint) in registry.routes() {
        tracing::debug!(version, endpoint, "Registered endpoint");
    }
    registry
}

//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! The relay holds no drawing state at all: the only shared resource is the
//! registry of live peer output channels.

use std::sync::Arc;

use crate::registry::Registry;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — the registry is Arc-wrapped.
#[derive(Clone, Default)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { registry: Arc::new(Registry::new()) }
    }
}

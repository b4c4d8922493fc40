//! Candidate viewers for a file.
//!
//! Every registered provider is probed; content bindings contribute their
//! viewer and external bindings the application they pick for the file.
//! Catalog-owned providers are probed too (lazy defaults resolve that way)
//! but are not listed. A provider that fails is logged and skipped.

use crate::host::Host;
use crate::provider::{FileQuery, ViewerProvider};
use crate::viewer::Viewer;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::warn;

/// Registered providers that accept `query`, in registration order.
fn matching_providers(host: &dyn Host, query: &FileQuery) -> Vec<Rc<ViewerProvider>> {
    host.providers()
        .into_iter()
        .filter(|provider| match provider.can_handle(query, host) {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(
                    extension = %query.extension,
                    mime_type = %query.media_type,
                    "provider failed while probing file: {err:#}"
                );
                false
            }
        })
        .collect()
}

pub fn enumerate_viewers(host: &dyn Host, query: &FileQuery) -> Vec<Viewer> {
    let query = query.clone().with_detected_media_type(host);
    let mut app_ids: HashSet<String> = HashSet::new();
    let mut viewers = Vec::new();

    for provider in matching_providers(host, &query) {
        match provider.as_ref() {
            ViewerProvider::Mapped(_) | ViewerProvider::Lazy(_) => continue,
            ViewerProvider::Content(binding) => viewers.push(Viewer::Content(binding.viewer.clone())),
            ViewerProvider::External(binding) => match binding.application(&query) {
                Ok(Some(app)) => {
                    if app_ids.insert(app.app_id.clone()) {
                        viewers.push(Viewer::Application(app));
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(
                    binding = %binding.name,
                    "external binding failed to resolve an application: {err:#}"
                ),
            },
        }
    }

    let Some(path) = query.path.as_deref() else {
        return viewers;
    };

    for app in host.os_applications(path) {
        if app_ids.insert(app.app_id.clone()) {
            viewers.push(Viewer::Application(app));
        }
    }
    viewers
}

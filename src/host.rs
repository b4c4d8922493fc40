//! Host environment seen by the catalog.
//!
//! The host owns the process-wide provider registry, media-type detection
//! and the per-file list of installed applications. [`StaticHost`] is an
//! in-memory implementation used by the settings tool and by tests.

use crate::key::extension_of;
use crate::provider::{ContentBinding, ExternalBinding, FileMatcher, FileQuery, ViewerProvider};
use crate::viewer::{ApplicationViewer, ContentViewer};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

pub trait Host {
    /// Snapshot of every registered provider, in registration order.
    fn providers(&self) -> Vec<Rc<ViewerProvider>>;

    fn register_provider(&self, provider: Rc<ViewerProvider>);

    /// Removes `provider` (matched by pointer); unknown providers are ignored.
    fn deregister_provider(&self, provider: &Rc<ViewerProvider>);

    fn detect_media_type(&self, path: &Path) -> Option<String>;

    /// Applications the operating system offers for `path`.
    fn os_applications(&self, path: &Path) -> Vec<ApplicationViewer>;
}

#[derive(Default)]
pub struct StaticHost {
    providers: RefCell<Vec<Rc<ViewerProvider>>>,
    media_types: RefCell<HashMap<String, String>>,
    applications: RefCell<Vec<(FileMatcher, ApplicationViewer)>>,
    registrations: Cell<usize>,
    deregistrations: Cell<usize>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host-owned provider. Not counted as a catalog registration.
    pub fn add_provider(&self, provider: ViewerProvider) -> Rc<ViewerProvider> {
        let provider = Rc::new(provider);
        self.providers.borrow_mut().push(provider.clone());
        provider
    }

    pub fn add_content_viewer(&self, viewer: ContentViewer, matcher: FileMatcher) -> Rc<ViewerProvider> {
        self.add_provider(ViewerProvider::Content(ContentBinding { viewer, matcher }))
    }

    pub fn add_external_binding(&self, binding: ExternalBinding) -> Rc<ViewerProvider> {
        self.add_provider(ViewerProvider::External(binding))
    }

    pub fn add_os_application(&self, matcher: FileMatcher, application: ApplicationViewer) {
        self.applications.borrow_mut().push((matcher, application));
    }

    pub fn set_media_type(&self, extension: &str, media_type: &str) {
        self.media_types
            .borrow_mut()
            .insert(extension.to_ascii_lowercase(), media_type.to_string());
    }

    pub fn is_registered(&self, provider: &Rc<ViewerProvider>) -> bool {
        self.providers
            .borrow()
            .iter()
            .any(|existing| Rc::ptr_eq(existing, provider))
    }

    /// Registered providers that a catalog put there.
    pub fn catalog_providers(&self) -> Vec<Rc<ViewerProvider>> {
        self.providers
            .borrow()
            .iter()
            .filter(|provider| provider.is_catalog_owned())
            .cloned()
            .collect()
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.get()
    }

    pub fn deregistration_count(&self) -> usize {
        self.deregistrations.get()
    }
}

impl Host for StaticHost {
    fn providers(&self) -> Vec<Rc<ViewerProvider>> {
        self.providers.borrow().clone()
    }

    fn register_provider(&self, provider: Rc<ViewerProvider>) {
        debug!(identity = ?provider.identity(), "registering provider");
        self.registrations.set(self.registrations.get() + 1);
        self.providers.borrow_mut().push(provider);
    }

    fn deregister_provider(&self, provider: &Rc<ViewerProvider>) {
        let mut providers = self.providers.borrow_mut();
        let before = providers.len();
        providers.retain(|existing| !Rc::ptr_eq(existing, provider));
        if providers.len() != before {
            debug!(identity = ?provider.identity(), "deregistered provider");
            self.deregistrations.set(self.deregistrations.get() + 1);
        }
    }

    fn detect_media_type(&self, path: &Path) -> Option<String> {
        let extension = extension_of(path).to_ascii_lowercase();
        self.media_types.borrow().get(&extension).cloned()
    }

    fn os_applications(&self, path: &Path) -> Vec<ApplicationViewer> {
        let extension = extension_of(path).to_ascii_lowercase();
        let media_type = self
            .media_types
            .borrow()
            .get(&extension)
            .cloned()
            .unwrap_or_default();
        let query = FileQuery::for_file(path, &media_type);
        self.applications
            .borrow()
            .iter()
            .filter(|(matcher, _)| matcher.matches(&query))
            .map(|(_, app)| app.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deregister_matches_by_pointer() {
        let host = StaticHost::new();
        let viewer = ContentViewer::new("viewer:text", "Text Editor", true);
        let first = Rc::new(ViewerProvider::Content(ContentBinding {
            viewer: viewer.clone(),
            matcher: FileMatcher::new().extension("txt"),
        }));
        let twin = Rc::new(ViewerProvider::Content(ContentBinding {
            viewer,
            matcher: FileMatcher::new().extension("txt"),
        }));

        host.register_provider(first.clone());
        host.deregister_provider(&twin);
        assert!(host.is_registered(&first));
        assert_eq!(host.deregistration_count(), 0);

        host.deregister_provider(&first);
        assert!(!host.is_registered(&first));
        assert_eq!(host.registration_count(), 1);
        assert_eq!(host.deregistration_count(), 1);
    }

    #[test]
    fn os_applications_follow_matchers() {
        let host = StaticHost::new();
        host.set_media_type("md", "text/markdown");
        host.add_os_application(
            FileMatcher::new().media_type("text/markdown"),
            ApplicationViewer::new("com.typora", "Typora", false),
        );
        host.add_os_application(
            FileMatcher::new().extension("rs"),
            ApplicationViewer::new("com.zed", "Zed", false),
        );

        let apps = host.os_applications(Path::new("/notes/today.MD"));
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].app_id, "com.typora");
        assert_eq!(
            host.detect_media_type(Path::new("x.md")).as_deref(),
            Some("text/markdown")
        );
        assert!(host.detect_media_type(Path::new("x.bin")).is_none());
    }
}

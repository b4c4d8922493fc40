//! The viewer catalog: persisted default overrides, the providers registered
//! for them, and user-defined applications per key.
//!
//! Defaults are registered with the host as providers rather than kept only
//! as table entries, so whatever lists candidates for a file sees the
//! customised default as an ordinary, highest-priority candidate.

use crate::candidates;
use crate::host::Host;
use crate::key::ViewerKey;
use crate::lazy::LazyViewerProvider;
use crate::provider::{FileQuery, MappedViewerProvider, ViewerProvider};
use crate::settings::{
    DefaultMapping, PersistedViewer, SettingsDocument, SettingsStore, UserDefinedViewerGroup,
};
use crate::viewer::{UserDefinedViewer, Viewer};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, error};

pub struct ViewerCatalog {
    host: Rc<dyn Host>,
    store: SettingsStore,
    default_identities: BTreeMap<ViewerKey, String>,
    default_providers: BTreeMap<ViewerKey, Rc<ViewerProvider>>,
    user_defined: BTreeMap<ViewerKey, Vec<Rc<UserDefinedViewer>>>,
}

impl ViewerCatalog {
    pub fn new(host: Rc<dyn Host>, store: SettingsStore) -> Self {
        Self {
            host,
            store,
            default_identities: BTreeMap::new(),
            default_providers: BTreeMap::new(),
            user_defined: BTreeMap::new(),
        }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Host candidates for `query` followed by the user-defined viewers for
    /// its key.
    pub fn candidates(&self, query: &FileQuery) -> Vec<Viewer> {
        let query = query.clone().with_detected_media_type(self.host.as_ref());
        let mut viewers = candidates::enumerate_viewers(self.host.as_ref(), &query);
        viewers.extend(
            self.user_defined_viewers(&query.key())
                .into_iter()
                .map(Viewer::UserDefined),
        );
        viewers
    }

    /// The customised default for `key`, if one is set and still available.
    pub fn resolve_default(&self, key: &ViewerKey) -> Option<Viewer> {
        self.resolve(&FileQuery::for_key(key))
    }

    /// Like [`resolve_default`](Self::resolve_default) but probes a real
    /// file, which lets lazily remembered defaults resolve.
    pub fn resolve_default_for_file(&self, path: &Path, media_type: &str) -> Option<Viewer> {
        let query =
            FileQuery::for_file(path, media_type).with_detected_media_type(self.host.as_ref());
        if let Some(viewer) = self.resolve(&query) {
            return Some(viewer);
        }

        let provider = self.default_providers.get(&query.key())?;
        match provider.application(&query) {
            Ok(app) => app.map(Viewer::Application),
            Err(err) => {
                debug!(path = %path.display(), "default provider failed: {err:#}");
                None
            }
        }
    }

    fn resolve(&self, query: &FileQuery) -> Option<Viewer> {
        let key = query.key();
        if let Some(record) = self
            .user_defined
            .get(&key)
            .and_then(|records| records.iter().find(|record| record.is_default()))
        {
            return Some(Viewer::UserDefined(record.clone()));
        }

        let identity = self.default_identities.get(&key)?;
        candidates::enumerate_viewers(self.host.as_ref(), query)
            .into_iter()
            .find(|viewer| viewer.identity() == identity)
    }

    pub fn set_as_default(&mut self, key: &ViewerKey, viewer: Option<&Viewer>) {
        self.clear_default(key);

        let Some(viewer) = viewer else {
            return;
        };

        if let Viewer::UserDefined(record) = viewer {
            // Already registered when it was added.
            record.set_default(true);
            debug!(key = %key, identity = record.identity(), "user-defined viewer set as default");
            return;
        }

        let identity = viewer.identity().to_string();
        let provider = Rc::new(ViewerProvider::Mapped(MappedViewerProvider::default_for(
            key,
            viewer.clone(),
        )));
        self.host.register_provider(provider.clone());
        debug!(key = %key, identity = %identity, "default set");
        self.default_identities.insert(key.clone(), identity);
        self.default_providers.insert(key.clone(), provider);
    }

    /// Records a persisted default whose viewer cannot be found yet.
    pub fn remember_default(&mut self, key: &ViewerKey, identity: &str) {
        self.clear_default(key);

        let provider = Rc::new(ViewerProvider::Lazy(LazyViewerProvider::new(key, identity)));
        self.host.register_provider(provider.clone());
        debug!(key = %key, identity, "default remembered until a file resolves it");
        self.default_identities.insert(key.clone(), identity.to_string());
        self.default_providers.insert(key.clone(), provider);
    }

    pub fn clear_default(&mut self, key: &ViewerKey) {
        self.default_identities.remove(key);

        // User-defined defaults are flags only; this table never holds a
        // record's own provider.
        if let Some(provider) = self.default_providers.remove(key) {
            self.host.deregister_provider(&provider);
        }

        if let Some(records) = self.user_defined.get(key) {
            for record in records {
                record.set_default(false);
            }
        }
    }

    pub fn is_custom_default(&self, key: &ViewerKey, viewer: &Viewer) -> bool {
        match viewer {
            Viewer::UserDefined(record) => record.is_default(),
            _ => self
                .default_identities
                .get(key)
                .is_some_and(|identity| identity == viewer.identity()),
        }
    }

    pub fn default_identity(&self, key: &ViewerKey) -> Option<&str> {
        self.default_identities.get(key).map(String::as_str)
    }

    /// Provider registered for the explicit default of `key`.
    pub fn default_provider(&self, key: &ViewerKey) -> Option<&Rc<ViewerProvider>> {
        self.default_providers.get(key)
    }

    pub fn add_user_defined_viewer(&mut self, key: &ViewerKey, record: Rc<UserDefinedViewer>) {
        record.set_new(false);
        let provider = Rc::new(ViewerProvider::Mapped(MappedViewerProvider::user_defined(
            key, &record,
        )));
        self.host.register_provider(provider.clone());
        record.attach_provider(provider);
        debug!(key = %key, identity = record.identity(), "user-defined viewer added");
        self.user_defined.entry(key.clone()).or_default().push(record);
    }

    pub fn user_defined_viewers(&self, key: &ViewerKey) -> Vec<Rc<UserDefinedViewer>> {
        self.user_defined.get(key).cloned().unwrap_or_default()
    }

    pub fn find_user_defined_viewer(
        &self,
        key: &ViewerKey,
        app_id: &str,
    ) -> Option<Rc<UserDefinedViewer>> {
        self.user_defined
            .get(key)?
            .iter()
            .find(|record| record.identity() == app_id)
            .cloned()
    }

    pub fn remove_user_defined_viewer(&mut self, key: &ViewerKey, record: &Rc<UserDefinedViewer>) {
        if let Some(records) = self.user_defined.get_mut(key) {
            records.retain(|existing| !Rc::ptr_eq(existing, record));
            if records.is_empty() {
                self.user_defined.remove(key);
            }
        }
        if let Some(provider) = record.detach_provider() {
            self.host.deregister_provider(&provider);
        }
        debug!(key = %key, identity = record.identity(), "user-defined viewer removed");
    }

    /// Current state in persisted form.
    pub fn snapshot(&self) -> SettingsDocument {
        let user_defined_groups = self
            .user_defined
            .iter()
            .map(|(key, records)| UserDefinedViewerGroup {
                extension: key.extension().to_string(),
                mime_type: key.media_type().to_string(),
                viewers: records
                    .iter()
                    .map(|record| {
                        let app = record.application();
                        PersistedViewer {
                            application: app.app_id.clone(),
                            display_name: app.title.clone(),
                            arguments: app.launch_args.clone(),
                            is_default: record.is_default(),
                        }
                    })
                    .collect(),
            })
            .collect();
        let default_mappings = self
            .default_identities
            .iter()
            .map(|(key, identity)| DefaultMapping {
                extension: key.extension().to_string(),
                mime_type: key.media_type().to_string(),
                identity: identity.clone(),
            })
            .collect();
        SettingsDocument {
            user_defined_groups,
            default_mappings,
        }
    }

    /// Replays a persisted document into the catalog.
    ///
    /// User-defined groups go first: a default mapping may name one of them.
    /// Every record is validated before anything is applied.
    pub fn apply(&mut self, document: &SettingsDocument) -> Result<()> {
        let mut groups = Vec::with_capacity(document.user_defined_groups.len());
        for group in &document.user_defined_groups {
            let key = ViewerKey::new(&group.extension, &group.mime_type);
            let mut records = Vec::with_capacity(group.viewers.len());
            for viewer in &group.viewers {
                records.push((UserDefinedViewer::new(viewer.to_application()?), viewer.is_default));
            }
            groups.push((key, records));
        }

        for (key, records) in groups {
            for (record, is_default) in records {
                self.add_user_defined_viewer(&key, record.clone());
                if is_default {
                    self.set_as_default(&key, Some(&Viewer::UserDefined(record)));
                }
            }
        }

        for mapping in &document.default_mappings {
            let key = ViewerKey::new(&mapping.extension, &mapping.mime_type);
            let found = self
                .candidates(&FileQuery::for_key(&key))
                .into_iter()
                .find(|viewer| viewer.identity() == mapping.identity);
            match found {
                Some(viewer) => self.set_as_default(&key, Some(&viewer)),
                None => self.remember_default(&key, &mapping.identity),
            }
        }
        Ok(())
    }

    pub fn try_save(&self) -> Result<()> {
        self.store.write(&self.snapshot())
    }

    pub fn try_load(&mut self) -> Result<()> {
        let document = self.store.read()?;
        self.apply(&document)
    }

    /// Writes the settings file; failures are logged, never raised.
    pub fn save(&self) {
        if let Err(err) = self.try_save() {
            error!(path = %self.store.path().display(), "Unable to save Open With configuration: {err:#}");
        }
    }

    /// Loads the settings file. On failure the catalog keeps the state it
    /// had before the call.
    pub fn load(&mut self) {
        if let Err(err) = self.try_load() {
            error!(path = %self.store.path().display(), "Unable to read Open With configuration: {err:#}");
        }
    }
}

//! One "Open With" edit interaction for a single file.
//!
//! The session works on a private candidate list and a working default.
//! Nothing reaches the catalog until [`ConfigurationSession::save_changes`].

use crate::catalog::ViewerCatalog;
use crate::key::ViewerKey;
use crate::provider::FileQuery;
use crate::viewer::{ApplicationViewer, UserDefinedViewer, Viewer};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

pub struct ConfigurationSession<'a> {
    catalog: &'a mut ViewerCatalog,
    path: PathBuf,
    key: ViewerKey,
    viewers: Vec<Viewer>,
    selected: Option<Viewer>,
    default_viewer: Option<Viewer>,
    original_default: Option<Viewer>,
    non_overridden_default: Option<Viewer>,
    removed: Vec<Rc<UserDefinedViewer>>,
    can_remove: bool,
    can_set_as_default: bool,
}

impl<'a> ConfigurationSession<'a> {
    /// Opens a session for `path`. An empty `media_type` is detected by the
    /// host.
    pub fn new(catalog: &'a mut ViewerCatalog, path: &Path, media_type: &str) -> Self {
        let query =
            FileQuery::for_file(path, media_type).with_detected_media_type(catalog.host().as_ref());
        let key = query.key();
        let viewers = catalog.candidates(&query);

        let non_overridden_default = viewers.iter().find(|viewer| viewer.can_be_default()).cloned();
        let mut original_default = non_overridden_default.clone();
        for viewer in &viewers {
            if catalog.is_custom_default(&key, viewer) {
                original_default = Some(viewer.clone());
            }
        }

        debug!(
            path = %path.display(),
            key = %key,
            candidates = viewers.len(),
            default = ?original_default.as_ref().map(Viewer::identity),
            "configuration session opened"
        );

        Self {
            catalog,
            path: path.to_path_buf(),
            key,
            viewers,
            selected: None,
            default_viewer: original_default.clone(),
            original_default,
            non_overridden_default,
            removed: Vec::new(),
            can_remove: false,
            can_set_as_default: false,
        }
    }

    pub fn title(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("Open With - {name}")
    }

    /// Display title for `viewer`, marking the working default.
    pub fn viewer_title(&self, viewer: &Viewer) -> String {
        if self.default_viewer.as_ref() == Some(viewer) {
            format!("{} (Default)", viewer.title())
        } else {
            viewer.title().to_string()
        }
    }

    pub fn key(&self) -> &ViewerKey {
        &self.key
    }

    pub fn viewers(&self) -> &[Viewer] {
        &self.viewers
    }

    pub fn catalog(&self) -> &ViewerCatalog {
        &*self.catalog
    }

    pub fn selected_item(&self) -> Option<&Viewer> {
        self.selected.as_ref()
    }

    pub fn default_viewer(&self) -> Option<&Viewer> {
        self.default_viewer.as_ref()
    }

    pub fn original_default_viewer(&self) -> Option<&Viewer> {
        self.original_default.as_ref()
    }

    pub fn non_overridden_default_viewer(&self) -> Option<&Viewer> {
        self.non_overridden_default.as_ref()
    }

    pub fn can_remove(&self) -> bool {
        self.can_remove
    }

    pub fn can_set_as_default(&self) -> bool {
        self.can_set_as_default
    }

    pub fn set_selected_item(&mut self, viewer: Option<Viewer>) {
        self.selected = viewer;
        self.refresh_flags();
    }

    fn refresh_flags(&mut self) {
        match &self.selected {
            Some(selected) => {
                self.can_set_as_default = self.default_viewer.as_ref() != Some(selected);
                self.can_remove = selected.is_user_defined();
            }
            None => {
                self.can_set_as_default = false;
                self.can_remove = false;
            }
        }
    }

    pub fn set_selected_item_as_default(&mut self) {
        self.default_viewer = self.selected.clone();
        self.can_set_as_default = false;
    }

    /// Adds an application to this session's list. It is committed to the
    /// catalog by [`save_changes`](Self::save_changes).
    pub fn add_new_application(
        &mut self,
        command: &str,
        arguments: &str,
        friendly_name: &str,
    ) -> Result<Viewer> {
        let application = ApplicationViewer::from_command(command, arguments, friendly_name)?;
        let viewer = Viewer::UserDefined(UserDefinedViewer::pending(application));
        self.viewers.push(viewer.clone());
        Ok(viewer)
    }

    /// Drops the selected user-defined viewer. Anything else is ignored.
    pub fn remove_selected_item(&mut self) {
        let Some(Viewer::UserDefined(record)) = self.selected.clone() else {
            return;
        };

        if !record.is_new() {
            self.removed.push(record.clone());
        }
        let selected = Viewer::UserDefined(record);
        self.viewers.retain(|viewer| *viewer != selected);
        if self.default_viewer.as_ref() == Some(&selected) {
            self.default_viewer = self.non_overridden_default.clone();
        }

        self.selected = None;
        self.refresh_flags();
    }

    /// Commits the session: new records first, then the default, then
    /// removals, then the settings file.
    pub fn save_changes(&mut self) {
        let added = self
            .viewers
            .iter()
            .filter_map(Viewer::as_user_defined)
            .filter(|record| record.is_new());
        for record in added {
            self.catalog.add_user_defined_viewer(&self.key, record.clone());
        }

        if self.default_viewer != self.original_default {
            if self.default_viewer == self.non_overridden_default {
                self.catalog.clear_default(&self.key);
            } else {
                self.catalog
                    .set_as_default(&self.key, self.default_viewer.as_ref());
            }
            self.original_default = self.default_viewer.clone();
        }

        for record in self.removed.drain(..) {
            self.catalog.remove_user_defined_viewer(&self.key, &record);
        }

        self.catalog.save();
    }
}

//! Registered viewer providers.
//!
//! Everything the host can be asked "can you open this file?" is one of the
//! variants of [`ViewerProvider`]. Host-supplied providers are `Content` and
//! `External`; the catalog registers `Mapped` providers for defaults and
//! user-defined applications, and `Lazy` placeholders for persisted defaults
//! that need a real file before they resolve.

use crate::host::Host;
use crate::key::{ViewerKey, extension_of};
use crate::lazy::LazyViewerProvider;
use crate::viewer::{ApplicationViewer, ContentViewer, UserDefinedViewer, Viewer};
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// A question put to providers: a file (when one exists), its extension and
/// its media type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileQuery {
    pub path: Option<PathBuf>,
    pub extension: String,
    pub media_type: String,
}

impl FileQuery {
    pub fn for_file(path: &Path, media_type: &str) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            extension: extension_of(path),
            media_type: media_type.to_string(),
        }
    }

    /// Query without a backing file. Providers that need to probe a real
    /// file decline these.
    pub fn for_key(key: &ViewerKey) -> Self {
        Self {
            path: None,
            extension: key.extension().to_string(),
            media_type: key.media_type().to_string(),
        }
    }

    pub fn key(&self) -> ViewerKey {
        ViewerKey::new(&self.extension, &self.media_type)
    }

    /// Fills an empty media type from the host when a file is present.
    pub fn with_detected_media_type(mut self, host: &dyn Host) -> Self {
        if self.media_type.is_empty() {
            if let Some(path) = &self.path {
                if let Some(detected) = host.detect_media_type(path) {
                    self.media_type = detected;
                }
            }
        }
        self
    }
}

/// Extension and media-type patterns a host binding accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileMatcher {
    extensions: Vec<String>,
    media_types: Vec<String>,
}

impl FileMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extension(mut self, extension: &str) -> Self {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        self.extensions.push(extension.to_ascii_lowercase());
        self
    }

    pub fn media_type(mut self, media_type: &str) -> Self {
        self.media_types.push(media_type.to_ascii_lowercase());
        self
    }

    pub fn matches(&self, query: &FileQuery) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(&query.extension))
            || self
                .media_types
                .iter()
                .any(|media| media.eq_ignore_ascii_case(&query.media_type))
    }
}

/// In-process renderer offered by the host.
#[derive(Clone, Debug)]
pub struct ContentBinding {
    pub viewer: ContentViewer,
    pub matcher: FileMatcher,
}

pub type ApplicationResolver = Rc<dyn Fn(&FileQuery) -> Result<Option<ApplicationViewer>>>;

/// Host binding that picks an external application per file.
#[derive(Clone)]
pub struct ExternalBinding {
    pub name: String,
    resolve: ApplicationResolver,
}

impl ExternalBinding {
    pub fn new<F>(name: &str, resolve: F) -> Self
    where
        F: Fn(&FileQuery) -> Result<Option<ApplicationViewer>> + 'static,
    {
        Self {
            name: name.to_string(),
            resolve: Rc::new(resolve),
        }
    }

    /// Binding that always offers `application` for files `matcher` accepts.
    pub fn fixed(application: ApplicationViewer, matcher: FileMatcher) -> Self {
        let name = application.app_id.clone();
        Self::new(&name, move |query| {
            Ok(matcher.matches(query).then(|| application.clone()))
        })
    }

    pub fn application(&self, query: &FileQuery) -> Result<Option<ApplicationViewer>> {
        (self.resolve)(query)
    }
}

impl fmt::Debug for ExternalBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
enum MappedTarget {
    /// Explicit default; always advertised as default.
    Default(Viewer),
    /// User-added application; advertised as default only while its record
    /// says so. Weak so the record can own its provider handle.
    UserDefined(Weak<UserDefinedViewer>),
}

/// Provider the catalog registers for one key.
///
/// Handles a file when either its media type or its extension matches the
/// key.
#[derive(Clone, Debug)]
pub struct MappedViewerProvider {
    key: ViewerKey,
    target: MappedTarget,
}

impl MappedViewerProvider {
    pub fn default_for(key: &ViewerKey, viewer: Viewer) -> Self {
        Self {
            key: key.clone(),
            target: MappedTarget::Default(viewer),
        }
    }

    pub fn user_defined(key: &ViewerKey, record: &Rc<UserDefinedViewer>) -> Self {
        Self {
            key: key.clone(),
            target: MappedTarget::UserDefined(Rc::downgrade(record)),
        }
    }

    pub fn can_be_default(&self) -> bool {
        match &self.target {
            MappedTarget::Default(_) => true,
            MappedTarget::UserDefined(record) => {
                record.upgrade().is_some_and(|record| record.is_default())
            }
        }
    }

    pub fn can_handle(&self, query: &FileQuery) -> bool {
        self.key.matches_media_type(&query.media_type)
            || self.key.matches_extension(&query.extension)
    }

    pub fn identity(&self) -> Option<String> {
        match &self.target {
            MappedTarget::Default(viewer) => Some(viewer.identity().to_string()),
            MappedTarget::UserDefined(record) => {
                record.upgrade().map(|record| record.identity().to_string())
            }
        }
    }

    /// The wrapped viewer, promoted to default where that applies.
    pub fn viewer(&self) -> Option<Viewer> {
        match &self.target {
            MappedTarget::Default(Viewer::Content(content)) => Some(Viewer::Content(ContentViewer {
                can_be_default: true,
                ..content.clone()
            })),
            MappedTarget::Default(Viewer::Application(app)) => {
                Some(Viewer::Application(app.promoted()))
            }
            MappedTarget::Default(viewer) => Some(viewer.clone()),
            MappedTarget::UserDefined(record) => record.upgrade().map(Viewer::UserDefined),
        }
    }

    pub fn application(&self) -> Option<ApplicationViewer> {
        let viewer = self.viewer()?;
        let app = viewer.application()?;
        Some(if self.can_be_default() {
            app.promoted()
        } else {
            app.clone()
        })
    }
}

#[derive(Debug)]
pub enum ViewerProvider {
    Content(ContentBinding),
    External(ExternalBinding),
    Mapped(MappedViewerProvider),
    Lazy(LazyViewerProvider),
}

impl ViewerProvider {
    pub fn can_handle(&self, query: &FileQuery, host: &dyn Host) -> Result<bool> {
        match self {
            ViewerProvider::Content(binding) => Ok(binding.matcher.matches(query)),
            ViewerProvider::External(binding) => Ok(binding.application(query)?.is_some()),
            ViewerProvider::Mapped(mapped) => Ok(mapped.can_handle(query)),
            ViewerProvider::Lazy(lazy) => Ok(lazy.can_handle(query, host)),
        }
    }

    pub fn application(&self, query: &FileQuery) -> Result<Option<ApplicationViewer>> {
        match self {
            ViewerProvider::Content(_) => Ok(None),
            ViewerProvider::External(binding) => binding.application(query),
            ViewerProvider::Mapped(mapped) => Ok(mapped.application()),
            ViewerProvider::Lazy(lazy) => Ok(lazy.application(query)),
        }
    }

    /// Identity this provider stands for, when it is fixed independent of
    /// the file being opened.
    pub fn identity(&self) -> Option<String> {
        match self {
            ViewerProvider::Content(binding) => Some(binding.viewer.binding_identity.clone()),
            ViewerProvider::External(_) => None,
            ViewerProvider::Mapped(mapped) => mapped.identity(),
            ViewerProvider::Lazy(lazy) => Some(lazy.identity().to_string()),
        }
    }

    /// Providers registered by a catalog rather than by the host. They are
    /// probed during enumeration but never listed as candidates.
    pub fn is_catalog_owned(&self) -> bool {
        matches!(self, ViewerProvider::Mapped(_) | ViewerProvider::Lazy(_))
    }

    pub fn as_lazy(&self) -> Option<&LazyViewerProvider> {
        match self {
            ViewerProvider::Lazy(lazy) => Some(lazy),
            _ => None,
        }
    }
}

//! Viewer values: the things a file can be opened with.
//!
//! A viewer is either an in-process content renderer, an external
//! application, or an application the user added by hand. The identity
//! string is what gets compared across sessions and written to disk.

use crate::provider::ViewerProvider;
use anyhow::{Result, bail};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentViewer {
    pub binding_identity: String,
    pub title: String,
    pub can_be_default: bool,
}

impl ContentViewer {
    pub fn new(binding_identity: &str, title: &str, can_be_default: bool) -> Self {
        Self {
            binding_identity: binding_identity.to_string(),
            title: title.to_string(),
            can_be_default,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationViewer {
    pub app_id: String,
    pub title: String,
    pub can_be_default: bool,
    pub launch_command: String,
    pub launch_args: String,
}

impl ApplicationViewer {
    /// Application discovered from the environment; launched by its id.
    pub fn new(app_id: &str, title: &str, can_be_default: bool) -> Self {
        Self {
            app_id: app_id.to_string(),
            title: title.to_string(),
            can_be_default,
            launch_command: app_id.to_string(),
            launch_args: String::new(),
        }
    }

    /// Application the user points at by command path.
    ///
    /// The command path doubles as the identity. Empty command paths and
    /// empty friendly names are rejected here so they never reach a catalog.
    pub fn from_command(command: &str, arguments: &str, friendly_name: &str) -> Result<Self> {
        if command.trim().is_empty() {
            bail!("application command must not be empty");
        }
        if friendly_name.trim().is_empty() {
            bail!("application display name must not be empty (command {command})");
        }
        Ok(Self {
            app_id: command.to_string(),
            title: friendly_name.to_string(),
            can_be_default: false,
            launch_command: command.to_string(),
            launch_args: arguments.to_string(),
        })
    }

    /// Copy of this application that advertises itself as the default, so
    /// listings put it first.
    pub fn promoted(&self) -> Self {
        Self {
            can_be_default: true,
            ..self.clone()
        }
    }
}

/// Name offered for a freshly picked command: its file name.
pub fn suggest_friendly_name(command: &str) -> String {
    Path::new(command)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether the add-application form may be submitted.
pub fn can_add_application(command: &str, friendly_name: &str) -> bool {
    !command.is_empty() && !friendly_name.is_empty()
}

/// An application added by the user for one key.
///
/// Shared between the catalog and any open configuration session, so the
/// session flags and the provider handle use interior mutability.
pub struct UserDefinedViewer {
    application: ApplicationViewer,
    is_new: Cell<bool>,
    is_default: Cell<bool>,
    provider: RefCell<Option<Rc<ViewerProvider>>>,
}

impl UserDefinedViewer {
    pub fn new(application: ApplicationViewer) -> Rc<Self> {
        Rc::new(Self {
            application,
            is_new: Cell::new(false),
            is_default: Cell::new(false),
            provider: RefCell::new(None),
        })
    }

    /// Record created in a session and not yet committed.
    pub fn pending(application: ApplicationViewer) -> Rc<Self> {
        let record = Self::new(application);
        record.is_new.set(true);
        record
    }

    pub fn application(&self) -> &ApplicationViewer {
        &self.application
    }

    pub fn identity(&self) -> &str {
        &self.application.app_id
    }

    pub fn is_new(&self) -> bool {
        self.is_new.get()
    }

    pub fn is_default(&self) -> bool {
        self.is_default.get()
    }

    pub(crate) fn set_new(&self, value: bool) {
        self.is_new.set(value);
    }

    pub(crate) fn set_default(&self, value: bool) {
        self.is_default.set(value);
    }

    /// Provider registered for this record while it lives in a catalog.
    pub fn provider(&self) -> Option<Rc<ViewerProvider>> {
        self.provider.borrow().clone()
    }

    pub(crate) fn attach_provider(&self, provider: Rc<ViewerProvider>) {
        *self.provider.borrow_mut() = Some(provider);
    }

    pub(crate) fn detach_provider(&self) -> Option<Rc<ViewerProvider>> {
        self.provider.borrow_mut().take()
    }
}

impl fmt::Debug for UserDefinedViewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDefinedViewer")
            .field("app_id", &self.application.app_id)
            .field("title", &self.application.title)
            .field("is_new", &self.is_new.get())
            .field("is_default", &self.is_default.get())
            .field("registered", &self.provider.borrow().is_some())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum Viewer {
    Content(ContentViewer),
    Application(ApplicationViewer),
    UserDefined(Rc<UserDefinedViewer>),
}

impl Viewer {
    pub fn identity(&self) -> &str {
        match self {
            Viewer::Content(viewer) => &viewer.binding_identity,
            Viewer::Application(app) => &app.app_id,
            Viewer::UserDefined(record) => record.identity(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Viewer::Content(viewer) => &viewer.title,
            Viewer::Application(app) => &app.title,
            Viewer::UserDefined(record) => &record.application().title,
        }
    }

    pub fn can_be_default(&self) -> bool {
        match self {
            Viewer::Content(viewer) => viewer.can_be_default,
            Viewer::Application(app) => app.can_be_default,
            Viewer::UserDefined(record) => record.application().can_be_default,
        }
    }

    pub fn as_user_defined(&self) -> Option<&Rc<UserDefinedViewer>> {
        match self {
            Viewer::UserDefined(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_user_defined(&self) -> bool {
        self.as_user_defined().is_some()
    }

    /// The application behind this viewer, if it launches one.
    pub fn application(&self) -> Option<&ApplicationViewer> {
        match self {
            Viewer::Content(_) => None,
            Viewer::Application(app) => Some(app),
            Viewer::UserDefined(record) => Some(record.application()),
        }
    }
}

/// User-defined viewers compare by record, everything else by identity.
impl PartialEq for Viewer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Viewer::Content(a), Viewer::Content(b)) => a.binding_identity == b.binding_identity,
            (Viewer::Application(a), Viewer::Application(b)) => a.app_id == b.app_id,
            (Viewer::UserDefined(a), Viewer::UserDefined(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Viewer {}

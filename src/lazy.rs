//! Deferred resolution of persisted defaults.
//!
//! A persisted default can name an application that only shows up once a
//! concrete file is probed (OS application lists are per file). The lazy
//! provider remembers the identity and resolves it the first time a real
//! file with the right extension is queried.
//!
//! Resolution enumerates every registered provider, this one included, so
//! the `Resolving` state doubles as the re-entrancy guard.

use crate::candidates;
use crate::host::Host;
use crate::key::ViewerKey;
use crate::provider::{FileQuery, MappedViewerProvider};
use crate::viewer::ApplicationViewer;
use std::cell::{Cell, RefCell};
use std::fmt;
use tracing::debug;

#[derive(Clone, Debug)]
pub enum ResolutionState {
    Unresolved,
    Resolving,
    Resolved(MappedViewerProvider),
}

pub struct LazyViewerProvider {
    key: ViewerKey,
    identity: String,
    state: RefCell<ResolutionState>,
    scans: Cell<usize>,
}

impl LazyViewerProvider {
    pub fn new(key: &ViewerKey, identity: &str) -> Self {
        Self {
            key: key.clone(),
            identity: identity.to_string(),
            state: RefCell::new(ResolutionState::Unresolved),
            scans: Cell::new(0),
        }
    }

    pub fn key(&self) -> &ViewerKey {
        &self.key
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn state(&self) -> ResolutionState {
        self.state.borrow().clone()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), ResolutionState::Resolved(_))
    }

    /// Number of candidate scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans.get()
    }

    pub fn can_handle(&self, query: &FileQuery, host: &dyn Host) -> bool {
        if !self.key.matches_extension(&query.extension) {
            return false;
        }

        match &*self.state.borrow() {
            ResolutionState::Resolved(provider) => return provider.can_handle(query),
            ResolutionState::Resolving => return false,
            ResolutionState::Unresolved => {}
        }

        // Only a real file can tell us which applications exist for it.
        if query.path.is_none() {
            return false;
        }

        self.resolve(query, host);

        match &*self.state.borrow() {
            ResolutionState::Resolved(provider) => provider.can_handle(query),
            _ => false,
        }
    }

    pub fn application(&self, _query: &FileQuery) -> Option<ApplicationViewer> {
        match &*self.state.borrow() {
            ResolutionState::Resolved(provider) => provider.application(),
            _ => None,
        }
    }

    fn resolve(&self, query: &FileQuery, host: &dyn Host) {
        *self.state.borrow_mut() = ResolutionState::Resolving;
        self.scans.set(self.scans.get() + 1);

        let found = candidates::enumerate_viewers(host, query)
            .into_iter()
            .find(|viewer| viewer.identity() == self.identity);

        let next = match found {
            Some(viewer) => {
                debug!(
                    identity = %self.identity,
                    extension = %query.extension,
                    mime_type = %query.media_type,
                    "resolved lazy default"
                );
                ResolutionState::Resolved(MappedViewerProvider::default_for(&query.key(), viewer))
            }
            None => {
                debug!(
                    identity = %self.identity,
                    extension = %query.extension,
                    "lazy default still unresolved"
                );
                ResolutionState::Unresolved
            }
        };
        *self.state.borrow_mut() = next;
    }
}

impl fmt::Debug for LazyViewerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyViewerProvider")
            .field("key", &self.key)
            .field("identity", &self.identity)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#![allow(dead_code)]

// Shared host fixture: two content viewers, one healthy and one failing
// external binding, and a couple of OS applications.

use openwith::{
    ApplicationViewer, ContentViewer, ExternalBinding, FileMatcher, SettingsStore, StaticHost,
    Viewer, ViewerCatalog, ViewerKey,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const TEXT: &str = "viewer:text";
pub const HEX: &str = "viewer:hex";
pub const GEDIT: &str = "org.gnome.gedit";
pub const KATE: &str = "org.kde.kate";
pub const PHOTOSHOP: &str = "com.adobe.photoshop";
pub const PSD_TYPE: &str = "image/vnd.adobe.photoshop";

pub fn fixture_host() -> Rc<StaticHost> {
    let host = Rc::new(StaticHost::new());
    host.set_media_type("txt", "text/plain");
    host.set_media_type("log", "text/plain");
    host.set_media_type("psd", PSD_TYPE);

    host.add_content_viewer(
        ContentViewer::new(TEXT, "Text Editor", true),
        FileMatcher::new()
            .extension("txt")
            .extension("log")
            .media_type("text/plain"),
    );
    host.add_content_viewer(
        ContentViewer::new(HEX, "Hex Editor", false),
        FileMatcher::new()
            .extension("txt")
            .extension("log")
            .extension("bin"),
    );
    host.add_external_binding(ExternalBinding::new("broken-registry", |_| {
        anyhow::bail!("desktop database is locked")
    }));
    host.add_external_binding(ExternalBinding::fixed(
        ApplicationViewer::new(GEDIT, "Gedit", false),
        FileMatcher::new().media_type("text/plain"),
    ));
    host.add_os_application(
        FileMatcher::new().extension("txt").extension("log"),
        ApplicationViewer::new(KATE, "Kate", false),
    );
    host.add_os_application(
        FileMatcher::new().extension("psd"),
        ApplicationViewer::new(PHOTOSHOP, "Photoshop", false),
    );
    host
}

pub fn settings_path(dir: &Path) -> PathBuf {
    dir.join("OpenWithSettings.xml")
}

/// Catalog over a fresh fixture host, persisting into `dir`.
pub fn catalog_in(dir: &Path) -> (Rc<StaticHost>, ViewerCatalog) {
    let host = fixture_host();
    let catalog = ViewerCatalog::new(host.clone(), SettingsStore::new(settings_path(dir)));
    (host, catalog)
}

pub fn text_key() -> ViewerKey {
    ViewerKey::new("txt", "text/plain")
}

pub fn log_key() -> ViewerKey {
    ViewerKey::new("log", "text/plain")
}

pub fn psd_key() -> ViewerKey {
    ViewerKey::new("psd", PSD_TYPE)
}

pub fn ids(viewers: &[Viewer]) -> Vec<String> {
    viewers
        .iter()
        .map(|viewer| viewer.identity().to_string())
        .collect()
}

pub fn content(identity: &str, title: &str) -> Viewer {
    Viewer::Content(ContentViewer::new(identity, title, false))
}

pub fn application(app_id: &str, title: &str) -> Viewer {
    Viewer::Application(ApplicationViewer::new(app_id, title, false))
}

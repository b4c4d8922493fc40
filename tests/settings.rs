// Persistence of defaults and user-defined viewers across catalogs.
mod support;

use anyhow::Result;
use openwith::{ApplicationViewer, UserDefinedViewer, Viewer};
use std::fs;

use support::{GEDIT, HEX, PHOTOSHOP, catalog_in, content, log_key, psd_key, settings_path, text_key};

fn add_less(catalog: &mut openwith::ViewerCatalog) -> Result<Viewer> {
    let record = UserDefinedViewer::new(ApplicationViewer::from_command(
        "/usr/bin/less",
        "-R",
        "Less",
    )?);
    catalog.add_user_defined_viewer(&log_key(), record.clone());
    Ok(Viewer::UserDefined(record))
}

#[test]
fn user_defined_default_survives_a_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (_host, mut catalog) = catalog_in(dir.path());
    let less = add_less(&mut catalog)?;
    catalog.set_as_default(&log_key(), Some(&less));
    assert!(catalog.is_custom_default(&log_key(), &less));
    catalog.try_save()?;

    let (_host, mut reloaded) = catalog_in(dir.path());
    reloaded.try_load()?;
    let record = reloaded
        .find_user_defined_viewer(&log_key(), "/usr/bin/less")
        .expect("reloaded record");
    assert_eq!(record.application().title, "Less");
    assert_eq!(record.application().launch_args, "-R");
    assert!(reloaded.is_custom_default(&log_key(), &Viewer::UserDefined(record)));
    Ok(())
}

#[test]
fn save_then_load_reproduces_the_catalog() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (_host, mut catalog) = catalog_in(dir.path());
    add_less(&mut catalog)?;
    catalog.add_user_defined_viewer(
        &log_key(),
        UserDefinedViewer::new(ApplicationViewer::from_command("/usr/bin/most", "", "Most")?),
    );
    catalog.set_as_default(&text_key(), Some(&support::application(GEDIT, "Gedit")));
    catalog.set_as_default(&log_key(), Some(&content(HEX, "Hex Editor")));
    catalog.try_save()?;

    let (host, mut reloaded) = catalog_in(dir.path());
    reloaded.try_load()?;
    assert_eq!(reloaded.snapshot(), catalog.snapshot());
    assert_eq!(reloaded.default_identity(&text_key()), Some(GEDIT));
    assert_eq!(
        reloaded
            .resolve_default(&log_key())
            .as_ref()
            .map(Viewer::identity),
        Some(HEX)
    );
    // two user-defined viewers plus two defaults
    assert_eq!(host.catalog_providers().len(), 4);
    Ok(())
}

#[test]
fn unknown_default_is_kept_until_a_file_resolves_it() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        settings_path(dir.path()),
        r#"<?xml version="1.0" encoding="utf-8"?>
<OpenWithSettings>
  <DefaultMapping extension="psd" mimeType="image/vnd.adobe.photoshop">
    <DisplayBinding>com.adobe.photoshop</DisplayBinding>
  </DefaultMapping>
</OpenWithSettings>
"#,
    )?;

    let (_host, mut catalog) = catalog_in(dir.path());
    catalog.try_load()?;
    let provider = catalog.default_provider(&psd_key()).expect("lazy provider").clone();
    let lazy = provider.as_lazy().expect("lazy provider");
    assert!(!lazy.is_resolved());

    catalog.try_save()?;
    let saved = fs::read_to_string(settings_path(dir.path()))?;
    assert!(saved.contains("<DisplayBinding>com.adobe.photoshop</DisplayBinding>"));

    let resolved =
        catalog.resolve_default_for_file(std::path::Path::new("/art/cover.psd"), "");
    assert_eq!(resolved.as_ref().map(Viewer::identity), Some(PHOTOSHOP));
    assert!(lazy.is_resolved());
    Ok(())
}

#[test]
fn corrupt_file_keeps_the_previous_state() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (_host, mut catalog) = catalog_in(dir.path());
    catalog.set_as_default(&text_key(), Some(&content(HEX, "Hex Editor")));

    fs::write(settings_path(dir.path()), "<Settings><Nope/></Settings>")?;
    assert!(catalog.try_load().is_err());
    catalog.load();
    assert_eq!(catalog.default_identity(&text_key()), Some(HEX));
    Ok(())
}

#[test]
fn invalid_record_aborts_the_whole_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        settings_path(dir.path()),
        r#"<OpenWithSettings>
  <UserDefinedFileViewerGroup extension="log" mimeType="text/plain">
    <UserDefinedFileViewer>
      <Application>/usr/bin/less</Application>
      <DisplayName>Less</DisplayName>
      <Arguments></Arguments>
      <IsDefault>False</IsDefault>
    </UserDefinedFileViewer>
    <UserDefinedFileViewer>
      <Application>/usr/bin/most</Application>
      <DisplayName></DisplayName>
      <Arguments></Arguments>
      <IsDefault>False</IsDefault>
    </UserDefinedFileViewer>
  </UserDefinedFileViewerGroup>
</OpenWithSettings>
"#,
    )?;

    let (host, mut catalog) = catalog_in(dir.path());
    catalog.load();
    assert!(catalog.user_defined_viewers(&log_key()).is_empty());
    assert_eq!(host.registration_count(), 0);
    Ok(())
}

#[test]
fn missing_file_loads_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (host, mut catalog) = catalog_in(dir.path());
    catalog.try_load()?;
    assert!(catalog.snapshot().is_empty());
    assert_eq!(host.registration_count(), 0);
    Ok(())
}

#[test]
fn legacy_dotted_extensions_are_normalised() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        settings_path(dir.path()),
        r#"<OpenWithSettings>
  <UserDefinedFileViewerGroup extension=".LOG" mimeType="text/plain">
    <UserDefinedFileViewer>
      <Application>/usr/bin/less</Application>
      <DisplayName>Less</DisplayName>
      <Arguments></Arguments>
      <IsDefault>true</IsDefault>
    </UserDefinedFileViewer>
  </UserDefinedFileViewerGroup>
</OpenWithSettings>
"#,
    )?;

    let (_host, mut catalog) = catalog_in(dir.path());
    catalog.try_load()?;
    let records = catalog.user_defined_viewers(&log_key());
    assert_eq!(records.len(), 1);
    assert!(records[0].is_default());
    Ok(())
}

#[test]
fn save_creates_missing_directories() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("config").join("openwith");
    let (_host, mut catalog) = catalog_in(&nested);
    catalog.set_as_default(&text_key(), Some(&content(HEX, "Hex Editor")));
    catalog.save();

    let saved = fs::read_to_string(settings_path(&nested))?;
    assert!(saved.starts_with("<?xml"));
    assert!(saved.contains(r#"<DefaultMapping extension="txt" mimeType="text/plain">"#));
    Ok(())
}

#[test]
fn default_mapping_can_name_a_user_defined_viewer() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(
        settings_path(dir.path()),
        r#"<OpenWithSettings>
  <UserDefinedFileViewerGroup extension="log" mimeType="text/plain">
    <UserDefinedFileViewer>
      <Application>/usr/bin/less</Application>
      <DisplayName>Less</DisplayName>
      <Arguments></Arguments>
      <IsDefault>False</IsDefault>
    </UserDefinedFileViewer>
  </UserDefinedFileViewerGroup>
  <DefaultMapping extension="log" mimeType="text/plain">
    <DisplayBinding>/usr/bin/less</DisplayBinding>
  </DefaultMapping>
</OpenWithSettings>
"#,
    )?;

    let (host, mut catalog) = catalog_in(dir.path());
    catalog.try_load()?;
    let record = catalog
        .find_user_defined_viewer(&log_key(), "/usr/bin/less")
        .expect("replayed record");
    assert!(record.is_default());
    assert!(catalog.default_provider(&log_key()).is_none());
    // only the record's own provider
    assert_eq!(host.catalog_providers().len(), 1);
    Ok(())
}

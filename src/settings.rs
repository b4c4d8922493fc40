//! On-disk Open With settings.
//!
//! The settings live in one XML document, `OpenWithSettings.xml`, holding
//! user-defined viewer groups followed by default mappings:
//!
//! ```text
//! <OpenWithSettings>
//!   <UserDefinedFileViewerGroup extension="log" mimeType="text/plain">
//!     <UserDefinedFileViewer>
//!       <Application>/usr/bin/less</Application>
//!       <DisplayName>Less</DisplayName>
//!       <Arguments></Arguments>
//!       <IsDefault>True</IsDefault>
//!     </UserDefinedFileViewer>
//!   </UserDefinedFileViewerGroup>
//!   <DefaultMapping extension="txt" mimeType="text/plain">
//!     <DisplayBinding>viewer:text</DisplayBinding>
//!   </DefaultMapping>
//! </OpenWithSettings>
//! ```
//!
//! Reads are all-or-nothing: a document is parsed completely into a
//! [`SettingsDocument`] before anything is applied to a catalog. Writes
//! replace the whole file through a temporary file in the same directory.

use crate::viewer::ApplicationViewer;
use anyhow::{Context, Result, bail};
use roxmltree::{Document, Node};
use serde::Serialize;
use std::env;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const SETTINGS_FILE_NAME: &str = "OpenWithSettings.xml";
pub const CONFIG_DIR_ENV: &str = "OPENWITH_CONFIG_DIR";
const CONFIG_SUBDIR: &str = "openwith";

const ROOT_ELEMENT: &str = "OpenWithSettings";
const GROUP_ELEMENT: &str = "UserDefinedFileViewerGroup";
const VIEWER_ELEMENT: &str = "UserDefinedFileViewer";
const MAPPING_ELEMENT: &str = "DefaultMapping";
const MAPPING_IDENTITY_ELEMENT: &str = "DisplayBinding";

/// Per-user settings file: `$OPENWITH_CONFIG_DIR/OpenWithSettings.xml`, or
/// the platform config directory when the variable is unset.
pub fn default_settings_path() -> Result<PathBuf> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir).join(SETTINGS_FILE_NAME));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join(CONFIG_SUBDIR).join(SETTINGS_FILE_NAME));
    }

    bail!("Unable to locate a configuration directory. Set {CONFIG_DIR_ENV} to choose one.")
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SettingsDocument {
    pub user_defined_groups: Vec<UserDefinedViewerGroup>,
    pub default_mappings: Vec<DefaultMapping>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserDefinedViewerGroup {
    pub extension: String,
    pub mime_type: String,
    pub viewers: Vec<PersistedViewer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersistedViewer {
    pub application: String,
    pub display_name: String,
    pub arguments: String,
    pub is_default: bool,
}

impl PersistedViewer {
    pub fn to_application(&self) -> Result<ApplicationViewer> {
        ApplicationViewer::from_command(&self.application, &self.arguments, &self.display_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DefaultMapping {
    pub extension: String,
    pub mime_type: String,
    pub identity: String,
}

impl SettingsDocument {
    pub fn is_empty(&self) -> bool {
        self.user_defined_groups.is_empty() && self.default_mappings.is_empty()
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("parsing Open With settings XML")?;
        let root = document.root_element();
        if root.tag_name().name() != ROOT_ELEMENT {
            bail!(
                "expected <{ROOT_ELEMENT}> root element, found <{}>",
                root.tag_name().name()
            );
        }

        let mut settings = SettingsDocument::default();
        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                GROUP_ELEMENT => settings.user_defined_groups.push(parse_group(child)?),
                MAPPING_ELEMENT => settings.default_mappings.push(parse_mapping(child)?),
                other => warn!(element = other, "skipping unknown settings element"),
            }
        }
        Ok(settings)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        if self.is_empty() {
            out.push_str(&format!("<{ROOT_ELEMENT} />\n"));
            return out;
        }

        out.push_str(&format!("<{ROOT_ELEMENT}>\n"));
        for group in &self.user_defined_groups {
            out.push_str(&format!(
                "  <{GROUP_ELEMENT} extension=\"{}\" mimeType=\"{}\">\n",
                escape(&group.extension),
                escape(&group.mime_type)
            ));
            for viewer in &group.viewers {
                out.push_str(&format!("    <{VIEWER_ELEMENT}>\n"));
                push_text_element(&mut out, 6, "Application", &viewer.application);
                push_text_element(&mut out, 6, "DisplayName", &viewer.display_name);
                push_text_element(&mut out, 6, "Arguments", &viewer.arguments);
                push_text_element(&mut out, 6, "IsDefault", format_bool(viewer.is_default));
                out.push_str(&format!("    </{VIEWER_ELEMENT}>\n"));
            }
            out.push_str(&format!("  </{GROUP_ELEMENT}>\n"));
        }
        for mapping in &self.default_mappings {
            out.push_str(&format!(
                "  <{MAPPING_ELEMENT} extension=\"{}\" mimeType=\"{}\">\n",
                escape(&mapping.extension),
                escape(&mapping.mime_type)
            ));
            push_text_element(&mut out, 4, MAPPING_IDENTITY_ELEMENT, &mapping.identity);
            out.push_str(&format!("  </{MAPPING_ELEMENT}>\n"));
        }
        out.push_str(&format!("</{ROOT_ELEMENT}>\n"));
        out
    }
}

fn key_attributes(node: Node<'_, '_>) -> Result<(String, String)> {
    let element = node.tag_name().name();
    let extension = node
        .attribute("extension")
        .with_context(|| format!("<{element}> is missing the extension attribute"))?;
    let mime_type = node
        .attribute("mimeType")
        .with_context(|| format!("<{element}> is missing the mimeType attribute"))?;
    Ok((extension.to_string(), mime_type.to_string()))
}

fn parse_group(node: Node<'_, '_>) -> Result<UserDefinedViewerGroup> {
    let (extension, mime_type) = key_attributes(node)?;
    let mut viewers = Vec::new();
    for child in node.children().filter(Node::is_element) {
        if child.tag_name().name() == VIEWER_ELEMENT {
            let viewer = parse_viewer(child)
                .with_context(|| format!("reading viewers for {extension}/{mime_type}"))?;
            viewers.push(viewer);
        } else {
            warn!(
                element = child.tag_name().name(),
                "skipping unknown element in viewer group"
            );
        }
    }
    Ok(UserDefinedViewerGroup {
        extension,
        mime_type,
        viewers,
    })
}

fn parse_viewer(node: Node<'_, '_>) -> Result<PersistedViewer> {
    let mut application = None;
    let mut display_name = None;
    let mut arguments = None;
    let mut is_default = None;

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "Application" => application = Some(element_text(child)?),
            "DisplayName" => display_name = Some(element_text(child)?),
            "Arguments" => arguments = Some(element_text(child)?),
            "IsDefault" => is_default = Some(parse_bool(&element_text(child)?)?),
            other => bail!("unsupported element <{other}> in <{VIEWER_ELEMENT}>"),
        }
    }

    match (application, display_name, arguments, is_default) {
        (Some(application), Some(display_name), Some(arguments), Some(is_default)) => {
            Ok(PersistedViewer {
                application,
                display_name,
                arguments,
                is_default,
            })
        }
        _ => bail!(
            "<{VIEWER_ELEMENT}> requires Application, DisplayName, Arguments and IsDefault"
        ),
    }
}

fn parse_mapping(node: Node<'_, '_>) -> Result<DefaultMapping> {
    let (extension, mime_type) = key_attributes(node)?;
    let children: Vec<_> = node.children().filter(Node::is_element).collect();
    if let Some(other) = children
        .iter()
        .find(|child| child.tag_name().name() != MAPPING_IDENTITY_ELEMENT)
    {
        bail!(
            "unsupported element <{}> in <{MAPPING_ELEMENT}>",
            other.tag_name().name()
        );
    }
    let child = match children.as_slice() {
        [child] => *child,
        [] => bail!(
            "<{MAPPING_ELEMENT}> for {extension}/{mime_type} has no <{MAPPING_IDENTITY_ELEMENT}>"
        ),
        _ => bail!(
            "<{MAPPING_ELEMENT}> for {extension}/{mime_type} has more than one <{MAPPING_IDENTITY_ELEMENT}>"
        ),
    };
    Ok(DefaultMapping {
        extension,
        mime_type,
        identity: element_text(child)?,
    })
}

fn element_text(node: Node<'_, '_>) -> Result<String> {
    if node.children().any(|child| child.is_element()) {
        bail!("<{}> must contain text only", node.tag_name().name());
    }
    Ok(node.text().unwrap_or_default().to_string())
}

fn parse_bool(raw: &str) -> Result<bool> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        bail!("IsDefault must be True or False, got '{raw}'")
    }
}

fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn push_text_element(out: &mut String, indent: usize, name: &str, text: &str) {
    out.push_str(&" ".repeat(indent));
    out.push_str(&format!("<{name}>{}</{name}>\n", escape(text)));
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(default_settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file. A missing file is an empty document.
    pub fn read(&self) -> Result<SettingsDocument> {
        let xml = match fs::read_to_string(&self.path) {
            Ok(xml) => xml,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no Open With settings file");
                return Ok(SettingsDocument::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading {}", self.path.display()));
            }
        };
        let document = SettingsDocument::parse(&xml)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            groups = document.user_defined_groups.len(),
            mappings = document.default_mappings.len(),
            "read Open With settings"
        );
        Ok(document)
    }

    /// Replaces the settings file with `document`.
    ///
    /// The previous file stays intact until the new one is fully written.
    pub fn write(&self, document: &SettingsDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let xml = document.to_xml();
        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temporary settings file in {}", dir.display()))?;
        temp.write_all(xml.as_bytes())
            .context("writing temporary settings file")?;
        temp.as_file()
            .sync_all()
            .context("flushing temporary settings file")?;
        temp.persist(&self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            groups = document.user_defined_groups.len(),
            mappings = document.default_mappings.len(),
            bytes = xml.len(),
            "saved Open With settings"
        );
        Ok(())
    }
}

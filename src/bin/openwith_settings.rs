//! Inspect and edit the Open With settings file.
//!
//! Usage:
//!   openwith-settings show
//!   openwith-settings add --extension log --mime-type text/plain --command /usr/bin/less --name Less --default
//!   openwith-settings remove --extension log --mime-type text/plain --command /usr/bin/less
//!   openwith-settings clear-default --extension log --mime-type text/plain
//!
//! No viewers are installed in this process, so persisted defaults that name
//! host viewers are carried through unchanged.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use openwith::{
    ApplicationViewer, SettingsStore, StaticHost, UserDefinedViewer, Viewer, ViewerCatalog,
    ViewerKey, logging,
};
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(name = "openwith-settings")]
#[command(about = "Inspect and edit Open With viewer settings")]
struct Cli {
    /// Settings file to operate on instead of the per-user default.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the persisted settings as JSON.
    Show,
    /// Add a user-defined application for a file class.
    Add {
        #[command(flatten)]
        key: KeyArgs,
        /// Command path of the application.
        #[arg(long)]
        command: String,
        /// Arguments passed before the file name.
        #[arg(long, default_value = "")]
        arguments: String,
        /// Display name; defaults to the command's file name.
        #[arg(long)]
        name: Option<String>,
        /// Make the application the default for this file class.
        #[arg(long)]
        default: bool,
    },
    /// Remove a user-defined application.
    Remove {
        #[command(flatten)]
        key: KeyArgs,
        #[arg(long)]
        command: String,
    },
    /// Forget the default chosen for a file class.
    ClearDefault {
        #[command(flatten)]
        key: KeyArgs,
    },
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// File extension, with or without the leading dot.
    #[arg(long)]
    extension: String,
    #[arg(long)]
    mime_type: String,
}

impl KeyArgs {
    fn key(&self) -> ViewerKey {
        ViewerKey::new(&self.extension, &self.mime_type)
    }
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let store = match cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::at_default_location()?,
    };

    if let Command::Show = cli.command {
        let document = store.read()?;
        let json = serde_json::to_string_pretty(&document).context("serializing settings")?;
        println!("{json}");
        return Ok(());
    }

    let mut catalog = ViewerCatalog::new(Rc::new(StaticHost::new()), store);
    catalog.try_load()?;

    match cli.command {
        Command::Show => {}
        Command::Add {
            key,
            command,
            arguments,
            name,
            default,
        } => {
            let key = key.key();
            if catalog.find_user_defined_viewer(&key, &command).is_some() {
                bail!("{command} is already registered for {key}");
            }
            let name = name.unwrap_or_else(|| openwith::suggest_friendly_name(&command));
            let application = ApplicationViewer::from_command(&command, &arguments, &name)?;
            let record = UserDefinedViewer::new(application);
            catalog.add_user_defined_viewer(&key, record.clone());
            if default {
                catalog.set_as_default(&key, Some(&Viewer::UserDefined(record)));
            }
        }
        Command::Remove { key, command } => {
            let key = key.key();
            let Some(record) = catalog.find_user_defined_viewer(&key, &command) else {
                bail!("{command} is not registered for {key}");
            };
            catalog.remove_user_defined_viewer(&key, &record);
        }
        Command::ClearDefault { key } => catalog.clear_default(&key.key()),
    }

    catalog
        .try_save()
        .with_context(|| format!("writing {}", catalog.store().path().display()))
}

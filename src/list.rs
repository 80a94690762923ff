use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::core::InstallerConfig;
use crate::registrar::DesktopEntry;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// State of the entry the desktop environment reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuEntryState {
    /// Present and identical to the in-app copy.
    Registered,
    Missing,
    /// Present but edited or replaced since install.
    Diverged,
    /// Interrupted install: no entry of its own, or its executable or icon
    /// was never copied.
    Incomplete,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstalledAppStatus {
    pub app_id: String,
    pub name: Option<String>,
    pub exec: Option<String>,
    pub icon: Option<String>,
    pub menu_entry: MenuEntryState,
    pub installed_at: Option<String>,
}

/// Every app directory under the packages root, sorted by id.
pub fn collect(config: &InstallerConfig) -> Result<Vec<InstalledAppStatus>, ListError> {
    let mut apps = Vec::new();

    if !config.packages_root.exists() {
        debug!("Packages root does not exist: {:?}", config.packages_root);
        return Ok(apps);
    }

    for entry in fs::read_dir(&config.packages_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let app_id = entry.file_name().to_string_lossy().into_owned();
        let layout = config.layout_for(&app_id);

        let own_entry = match fs::read(&layout.entry_copy) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                apps.push(InstalledAppStatus {
                    app_id,
                    name: None,
                    exec: None,
                    icon: None,
                    menu_entry: MenuEntryState::Incomplete,
                    installed_at: None,
                });
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let parsed = DesktopEntry::parse(&String::from_utf8_lossy(&own_entry));

        // The icon is copied last, so a missing Exec= or Icon= target means
        // the install stopped partway.
        let payload_missing = !Path::new(&parsed.exec_path).exists()
            || parsed
                .icon_path
                .as_deref()
                .is_some_and(|icon| !Path::new(icon).exists());

        let menu_entry = match fs::read(&layout.desktop_entry) {
            _ if payload_missing => MenuEntryState::Incomplete,
            Ok(registered) if registered == own_entry => MenuEntryState::Registered,
            Ok(_) => MenuEntryState::Diverged,
            Err(e) if e.kind() == io::ErrorKind::NotFound => MenuEntryState::Missing,
            Err(e) => return Err(e.into()),
        };

        let installed_at = fs::metadata(&layout.entry_copy)?
            .modified()
            .ok()
            .map(|time| DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S").to_string());

        apps.push(InstalledAppStatus {
            app_id,
            name: Some(parsed.name),
            exec: Some(parsed.exec_path),
            icon: parsed.icon_path,
            menu_entry,
            installed_at,
        });
    }

    apps.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    Ok(apps)
}

pub fn print_list(apps: &[InstalledAppStatus], json_output: bool) -> Result<(), ListError> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(apps)?);
        return Ok(());
    }

    println!("📦 Installed applications: {}", apps.len());
    if apps.is_empty() {
        return Ok(());
    }

    println!("  {:<20} {:<24} {:<12} {:<19}", "ID", "Name", "Menu entry", "Installed");
    println!(
        "  {:<20} {:<24} {:<12} {:<19}",
        "─".repeat(20),
        "─".repeat(24),
        "─".repeat(12),
        "─".repeat(19)
    );

    for app in apps {
        let state = match app.menu_entry {
            MenuEntryState::Registered => "✅",
            MenuEntryState::Missing => "❌ missing",
            MenuEntryState::Diverged => "⚠️ changed",
            MenuEntryState::Incomplete => "⚠️ partial",
        };

        println!(
            "  {:<20} {:<24} {:<12} {:<19}",
            app.app_id,
            app.name.as_deref().unwrap_or("-"),
            state,
            app.installed_at.as_deref().unwrap_or("unknown")
        );
    }

    Ok(())
}

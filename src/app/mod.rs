use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use eframe::{egui, NativeOptions};
use log::{error, info, warn};

use crate::{gui::RoleTreeGui, io, ui};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "roletree",
    about = "Interactive collapsible taxonomy-tree explorer with role-based coloring."
)]
pub struct AppConfig {
    /// Taxonomy document to load (nested JSON records).
    #[arg(value_name = "DOCUMENT")]
    pub document: Option<PathBuf>,

    /// Export the initial diagram to an SVG file (headless mode).
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 960)]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Run without launching the GUI; print a document summary instead.
    #[arg(long)]
    pub headless: bool,

    /// Force launch of the egui window even when a document is provided.
    #[arg(long)]
    pub gui: bool,

    /// Ignore display detection safeguards and attempt to launch the GUI anyway.
    #[arg(long)]
    pub force_gui: bool,
}

pub struct RoleTreeApp;

impl RoleTreeApp {
    pub fn run(config: &AppConfig) -> Result<()> {
        let wants_gui = !config.headless || config.gui || config.force_gui;

        if !wants_gui {
            return Self::run_headless(config);
        }

        if !config.force_gui && !Self::display_available() {
            warn!("GUI requested but no display was detected; falling back to headless mode.");
            return Self::run_headless(config);
        }

        let mut native_options = NativeOptions::default();
        info!(
            "Launching egui window ({}x{}).",
            config.width, config.height
        );
        native_options.viewport = egui::ViewportBuilder::default()
            .with_title("roletree")
            .with_inner_size(egui::vec2(config.width as f32, config.height as f32));

        let mut initial_config = config.clone();
        if initial_config.document.is_none() {
            initial_config.document = Self::default_document_path();
        }

        match eframe::run_native(
            "roletree",
            native_options,
            Box::new(move |cc| Ok(Box::new(RoleTreeGui::new(cc, initial_config)))),
        ) {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("Failed to launch egui window: {}", err);
                if config.document.is_some() {
                    warn!("Falling back to headless mode.");
                    Self::run_headless(config)
                } else {
                    Err(anyhow!(err.to_string()))
                }
            }
        }
    }

    fn display_available() -> bool {
        #[cfg(target_os = "macos")]
        {
            true
        }
        #[cfg(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd"
        ))]
        {
            std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
        }
        #[cfg(target_os = "windows")]
        {
            true
        }
        #[cfg(not(any(
            target_os = "macos",
            target_os = "linux",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd",
            target_os = "windows"
        )))]
        {
            false
        }
    }

    fn default_document_path() -> Option<PathBuf> {
        const MANIFEST_DIR: &str = env!("CARGO_MANIFEST_DIR");
        let candidate = PathBuf::from(MANIFEST_DIR).join("demos/roles.json");
        if candidate.exists() {
            Some(candidate)
        } else {
            None
        }
    }

    fn run_headless(config: &AppConfig) -> Result<()> {
        let document = config
            .document
            .clone()
            .or_else(Self::default_document_path)
            .ok_or_else(|| {
                anyhow!("headless mode requires a DOCUMENT argument or an accessible demo document")
            })?;

        if config.document.is_none() {
            info!("Using demo document at {}", document.display());
        }
        let record = io::load_document(&document)?;
        ui::render_preview(&record, config);

        if let Some(dest) = &config.output {
            ui::export(&record, config, dest)?;
        }

        Ok(())
    }
}

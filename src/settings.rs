//! Host settings
//!
//! Loaded from a JSON file on native; missing keys fall back to defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};

/// Runtime configuration for a session host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// Playfield width in pixels
    pub world_width: f32,
    /// Playfield height in pixels
    pub world_height: f32,

    // === Run ===
    /// RNG seed (None = derive from the clock at startup)
    pub seed: Option<u64>,
    /// Number of ticks the headless host simulates before exiting
    pub max_ticks: u64,
    /// Let the built-in autopilot drive the player
    pub autopilot: bool,
    /// Pace the headless host against the wall clock (false = run flat out)
    pub realtime: bool,

    // === Reporting ===
    /// Forward coarse status changes to the status reporter
    pub report_status: bool,
    /// Dump the final snapshot as JSON on exit
    pub dump_snapshot: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,

            seed: None,
            max_ticks: 60 * 60 * 3,
            autopilot: true,
            realtime: false,

            report_status: true,
            dump_snapshot: false,
        }
    }
}

impl Settings {
    /// World dimensions as a vector
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width.max(1.0), self.world_height.max(1.0))
    }

    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load settings from a JSON file, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {}; using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

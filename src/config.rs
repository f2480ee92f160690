use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{HyphaError, Result};
use crate::raster::{Polarity, Region};
use crate::skeleton_pruner::{LoopRemoval, PruneOptions};

/// Configuration for hypha_morph
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub input_path: String,
    pub output_base_dir: String,

    /// Physical units per pixel
    #[serde(default = "default_resolution")]
    pub resolution: f64,

    /// Branches shorter than this (physical units) are pruned
    #[serde(default = "default_min_branch_length")]
    pub min_branch_length: f64,

    #[serde(default = "default_foreground")]
    pub foreground: ForegroundChoice,

    #[serde(default = "default_loop_removal")]
    pub loop_removal: LoopRemovalChoice,

    /// Write the retained branch segments of every image
    #[serde(default)]
    pub record_branches: bool,

    /// Alpha (percent) for the batch summary confidence interval
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    // Overlay parameters
    #[serde(default = "default_annotation_radius")]
    pub annotation_radius: u32,

    #[serde(default = "default_tip_color")]
    pub tip_color_rgb: [u8; 3],

    #[serde(default = "default_branch_point_color")]
    pub branch_point_color_rgb: [u8; 3],

    #[serde(default = "default_skeleton_color")]
    pub skeleton_color_rgb: [u8; 3],

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    /// Bounding boxes the metrics are restricted to; empty means the whole image
    #[serde(default)]
    pub regions: Vec<Region>,
}

/// Which grey value of the input marks the skeleton
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForegroundChoice {
    /// White skeleton on black (inverted LUT)
    Light,
    /// Black skeleton on white (normal LUT)
    Dark,
}

impl ForegroundChoice {
    pub fn polarity(self) -> Polarity {
        Polarity::from_lut(self == ForegroundChoice::Light)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoopRemovalChoice {
    Off,
    Before,
    After,
}

impl From<LoopRemovalChoice> for LoopRemoval {
    fn from(choice: LoopRemovalChoice) -> Self {
        match choice {
            LoopRemovalChoice::Off => LoopRemoval::Off,
            LoopRemovalChoice::Before => LoopRemoval::BeforeBranches,
            LoopRemovalChoice::After => LoopRemoval::AfterBranches,
        }
    }
}

fn default_resolution() -> f64 {
    1.0
}

fn default_min_branch_length() -> f64 {
    10.0
}

fn default_foreground() -> ForegroundChoice {
    ForegroundChoice::Light
}

fn default_loop_removal() -> LoopRemovalChoice {
    LoopRemovalChoice::Off
}

fn default_confidence_level() -> f64 {
    5.0
}

fn default_annotation_radius() -> u32 {
    3
}

fn default_tip_color() -> [u8; 3] {
    [255, 0, 0]
}

fn default_branch_point_color() -> [u8; 3] {
    [0, 128, 255]
}

fn default_skeleton_color() -> [u8; 3] {
    [255, 255, 255]
}

fn default_parallel() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "./input".to_string(),
            output_base_dir: "./output".to_string(),
            resolution: default_resolution(),
            min_branch_length: default_min_branch_length(),
            foreground: default_foreground(),
            loop_removal: default_loop_removal(),
            record_branches: false,
            confidence_level: default_confidence_level(),
            annotation_radius: default_annotation_radius(),
            tip_color_rgb: default_tip_color(),
            branch_point_color_rgb: default_branch_point_color(),
            skeleton_color_rgb: default_skeleton_color(),
            use_parallel: default_parallel(),
            regions: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HyphaError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|source| HyphaError::ConfigLoad {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Minimum branch length in whole pixels
    pub fn min_branch_length_px(&self) -> usize {
        if self.resolution <= 0.0 {
            return 0;
        }
        (self.min_branch_length / self.resolution).ceil().max(0.0) as usize
    }

    /// Pruning options for one image; the origin is left at zero
    pub fn prune_options(&self) -> PruneOptions {
        PruneOptions {
            min_branch_length: self.min_branch_length_px(),
            loop_removal: self.loop_removal.into(),
            record_branches: self.record_branches,
            ..PruneOptions::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let input_path = PathBuf::from(&self.input_path);
        if !input_path.exists() {
            return Err(HyphaError::InvalidPath(input_path));
        }

        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(HyphaError::Config(
                "resolution must be a finite value > 0.0".to_string(),
            ));
        }

        if !(self.min_branch_length.is_finite() && self.min_branch_length >= 0.0) {
            return Err(HyphaError::Config(
                "min_branch_length must be a finite value >= 0.0".to_string(),
            ));
        }

        if self.confidence_level <= 0.0 || self.confidence_level >= 100.0 {
            return Err(HyphaError::Config(
                "confidence_level must be between 0.0 and 100.0 (exclusive)".to_string(),
            ));
        }

        if self.annotation_radius == 0 {
            return Err(HyphaError::Config(
                "annotation_radius must be > 0".to_string(),
            ));
        }

        if let Some(region) = self.regions.iter().find(|r| r.width == 0 || r.height == 0) {
            return Err(HyphaError::InvalidRegion(format!("{:?} is empty", region)));
        }

        fs::create_dir_all(&self.output_base_dir)?;

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            HyphaError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_branch_length_is_rounded_up_to_pixels() {
        let config = Config {
            resolution: 0.5,
            min_branch_length: 4.2,
            ..Config::default()
        };
        assert_eq!(config.min_branch_length_px(), 9);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            "input_path = \"in\"\noutput_base_dir = \"out\"\nforeground = \"DARK\"\n",
        )
        .expect("valid toml");

        assert_eq!(config.foreground, ForegroundChoice::Dark);
        assert_eq!(config.loop_removal, LoopRemovalChoice::Off);
        assert_eq!(config.annotation_radius, 3);
        assert!(config.use_parallel);
    }

    #[test]
    fn saved_config_loads_back() {
        let path = std::env::temp_dir().join(format!("hypha_morph_config_{}.toml", std::process::id()));
        let config = Config {
            loop_removal: LoopRemovalChoice::Before,
            resolution: 0.25,
            ..Config::default()
        };
        config.save_to_file(&path).expect("writable");

        let loaded = Config::from_file(&path).expect("parsable");
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.loop_removal, LoopRemovalChoice::Before);
        assert_eq!(loaded.resolution, 0.25);
        assert_eq!(loaded.tip_color_rgb, config.tip_color_rgb);
    }

    #[test]
    fn regions_parse_from_table_array() {
        let config: Config = toml::from_str(
            "input_path = \"in\"\noutput_base_dir = \"out\"\n\n[[regions]]\nx = 1\ny = 2\nwidth = 30\nheight = 40\n",
        )
        .expect("valid toml");

        assert_eq!(config.regions, vec![Region::new(1, 2, 30, 40)]);
        assert!(Config::default().regions.is_empty());
    }

    #[test]
    fn validate_rejects_empty_region() {
        let config = Config {
            input_path: std::env::temp_dir().to_string_lossy().into_owned(),
            output_base_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            regions: vec![Region::new(0, 0, 0, 5)],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(HyphaError::InvalidRegion(_))));
    }

    #[test]
    fn validate_rejects_missing_input() {
        let config = Config {
            input_path: "/definitely/not/here".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(HyphaError::InvalidPath(_))));
    }
}

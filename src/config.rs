use crate::error::Error;
use serde_derive::Deserialize;
use std::fs;
use std::path::Path;

/// Width all pixel-valued settings are expressed against.
pub const REFERENCE_WIDTH: f32 = 320.0;

/// Tracker settings. Distances, velocities and sizes are given for a
/// 320 pixel wide frame and scaled to the processing width, see
/// [`Thresholds`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// how many objects to track at once
    pub max_objects: usize,
    /// x resolution frames are processed at
    pub processing_width: u32,
    /// minimum blob area in processing pixels, `rf² * 500` when unset
    pub min_area: Option<f32>,
    /// blobs whose center is more than this fraction of the height above
    /// the bottom edge are ignored
    pub roi_fraction: f32,
    /// blobs left of this x position are ignored
    pub min_x_pos: f32,
    pub x_dist_thresh: f32,
    pub y_dist_thresh: f32,
    pub x_vel_thresh: f32,
    pub y_vel_thresh: f32,
    /// fastest plausible per-frame velocity
    pub max_vel: f32,
    /// largest plausible per-frame change of the smoothed x velocity
    pub max_delta_vel: f32,
    /// largest plausible per-frame change of the box width
    pub max_delta_width: f32,
    /// velocity low pass factor
    pub vfilt: f32,
    /// background adaptation fraction per idle frame
    pub frac_f: f32,
    /// idle frames before the background starts adapting
    pub no_motion_limit: u32,
    /// idle frames before a hard background reset is considered
    pub reset_idle_frames: u32,
    /// hard reset only happens while the peak frame difference is below this
    pub reset_max_diff: u8,
    /// binary threshold applied to the background difference
    pub diff_threshold: u8,
    /// gaussian blur kernel size, must be odd
    pub blur_size: u32,
    /// dilation passes joining adjacent regions, `int(rf)` when unset
    pub dilate_iterations: Option<u32>,
    /// perspective correction at the left hand side of the frame
    pub ps_f1: f32,
    /// perspective correction at the right hand side of the frame
    pub ps_f2: f32,
    /// top `1/y_crop_frac` of the captured frame is blacked out (timestamp)
    pub y_crop_frac: u32,
    pub display_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_objects: 3,
            processing_width: 1296,
            min_area: None,
            roi_fraction: 0.65,
            min_x_pos: 12.0,
            x_dist_thresh: 15.0,
            y_dist_thresh: 5.0,
            x_vel_thresh: 1.0,
            y_vel_thresh: 0.3,
            max_vel: 20.0,
            max_delta_vel: 2.0,
            max_delta_width: 20.0,
            vfilt: 0.5,
            frac_f: 0.15,
            no_motion_limit: 5,
            reset_idle_frames: 30,
            reset_max_diff: 30,
            diff_threshold: 25,
            blur_size: 15,
            dilate_iterations: None,
            ps_f1: 1.7,
            ps_f2: 1.2,
            y_crop_frac: 14,
            display_width: 320,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn with_processing_width(mut self, width: u32) -> Self {
        self.processing_width = width;
        self
    }

    /// Resolution scaling factor relative to 320 pixels across
    #[inline]
    pub fn rf(&self) -> f32 {
        self.processing_width as f32 / REFERENCE_WIDTH
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.processing_width == 0 {
            return Err(Error::Config("processing_width must be positive".into()));
        }

        if self.max_objects == 0 {
            return Err(Error::Config("max_objects must be positive".into()));
        }

        for (name, value) in [
            ("vfilt", self.vfilt),
            ("frac_f", self.frac_f),
            ("roi_fraction", self.roi_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.blur_size == 0 || self.blur_size % 2 == 0 {
            return Err(Error::Config(format!(
                "blur_size must be odd, got {}",
                self.blur_size
            )));
        }

        if self.y_crop_frac == 0 {
            return Err(Error::Config("y_crop_frac must be positive".into()));
        }

        if let Some(area) = self.min_area {
            if !area.is_finite() || area < 0.0 {
                return Err(Error::Config(format!("invalid min_area {}", area)));
            }
        }

        Ok(())
    }
}

/// Config values scaled to the processing resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub rf: f32,
    pub min_area: f32,
    pub min_x_pos: f32,
    pub x_dist: f32,
    pub y_dist: f32,
    pub x_vel: f32,
    pub y_vel: f32,
    pub max_vel: f32,
    pub max_delta_vel: f32,
    pub max_delta_width: f32,
    pub dilate_iterations: u32,
}

impl From<&Config> for Thresholds {
    fn from(cfg: &Config) -> Self {
        let rf = cfg.rf();

        Self {
            rf,
            min_area: cfg.min_area.unwrap_or(rf * rf * 500.0),
            min_x_pos: rf * cfg.min_x_pos,
            x_dist: rf * cfg.x_dist_thresh,
            y_dist: rf * cfg.y_dist_thresh,
            x_vel: rf * cfg.x_vel_thresh,
            y_vel: rf * cfg.y_vel_thresh,
            max_vel: rf * cfg.max_vel,
            max_delta_vel: rf * cfg.max_delta_vel,
            max_delta_width: rf * cfg.max_delta_width,
            dilate_iterations: cfg.dilate_iterations.unwrap_or(rf as u32),
        }
    }
}

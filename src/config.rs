//! Viewer configuration
//!
//! All fields have defaults, so hosts only pass the values they want to
//! override (from a JS object or a JSON string).

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Lower zoom bound (inclusive)
    pub min_scale: f64,
    /// Upper zoom bound (inclusive)
    pub max_scale: f64,
    /// Wheel factor applied when scrolling down
    pub wheel_zoom_out: f64,
    /// Wheel factor applied when scrolling up
    pub wheel_zoom_in: f64,

    /// CSS transition used for interactive camera updates
    pub gesture_transition: String,
    /// CSS transition used when focusing a member
    pub focus_transition: String,
    /// How long the focus animation runs before the camera is reapplied
    pub focus_transition_ms: u32,
    /// Default highlight lifetime
    pub highlight_ms: u32,

    pub member_class: String,
    pub selected_class: String,
    pub highlight_class: String,

    pub tree_url: String,
    pub members_data_path: String,
    pub root_member_id: String,

    pub export_filename: String,
    pub background_color: String,
    pub load_error_message: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.3,
            max_scale: 5.0,
            wheel_zoom_out: 0.9,
            wheel_zoom_in: 1.1,
            gesture_transition: "transform 0.1s ease-out".to_string(),
            focus_transition: "transform 0.8s ease-out".to_string(),
            focus_transition_ms: 800,
            highlight_ms: 3000,
            member_class: "member".to_string(),
            selected_class: "selected".to_string(),
            highlight_class: "highlight".to_string(),
            tree_url: "assets/family-tree/tennekoon-family-tree.svg".to_string(),
            members_data_path: "./assets/members-data/".to_string(),
            root_member_id: "MID-0001".to_string(),
            export_filename: "tennekoon-family-tree.svg".to_string(),
            background_color: "#0d202a".to_string(),
            load_error_message: "Error loading family tree. Check console.".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parse a (possibly partial) JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ViewerConfig =
            serde_json::from_str(json).map_err(|e| ViewerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(ViewerError::Config(format!(
                "scale bounds must satisfy 0 < min <= max (got {} .. {})",
                self.min_scale, self.max_scale
            )));
        }
        if self.wheel_zoom_out <= 0.0 || self.wheel_zoom_in <= 0.0 {
            return Err(ViewerError::Config("wheel factors must be positive".to_string()));
        }
        Ok(())
    }

    /// Whether `scale` lies inside the configured zoom bounds
    pub fn scale_in_bounds(&self, scale: f64) -> bool {
        scale >= self.min_scale && scale <= self.max_scale
    }
}

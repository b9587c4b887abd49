use serde::{Deserialize, Serialize};

use crate::errors::RacedayError;

const TEMPLATE_FILE_NAME: &str = "template.json";

/// The seven literal prefixes a race file header must open its lines with,
/// in file order. The prefixes are configuration, not hard-coded knowledge:
/// matching is character-for-character against whatever template the engine
/// was handed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HeaderTemplate {
    pub race_name_prefix: String,
    pub track_type_prefix: String,
    pub width_prefix: String,
    pub height_prefix: String,
    pub lap_distance_prefix: String,
    pub total_time_prefix: String,
    pub participants_prefix: String,
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self {
            race_name_prefix: "Name:".to_string(),
            track_type_prefix: "Track:".to_string(),
            width_prefix: "Width:".to_string(),
            height_prefix: "Height:".to_string(),
            lap_distance_prefix: "Distance:".to_string(),
            total_time_prefix: "Time:".to_string(),
            participants_prefix: "Participants:".to_string(),
        }
    }
}

impl HeaderTemplate {
    /// Loads the template from the platform config dir, if one was saved
    /// there. Returns `None` when no file exists so callers can fall back to
    /// the stock prefixes.
    pub fn from_local_file() -> Option<Self> {
        let template_path = dirs::config_dir()?.join("raceday").join(TEMPLATE_FILE_NAME);

        if template_path.exists() {
            let file = std::fs::File::open(template_path).ok()?;
            serde_json::from_reader(file).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<(), RacedayError> {
        let template_path = dirs::config_dir()
            .ok_or(RacedayError::NoConfigDir)?
            .join("raceday")
            .join(TEMPLATE_FILE_NAME);

        if !template_path.exists() {
            if let Some(parent) = template_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RacedayError::TemplateIo { source: e })?;
            }
        }

        let file = std::fs::File::create(template_path)
            .map_err(|e| RacedayError::TemplateIo { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| RacedayError::TemplateSerialize { source: e })
    }

    /// Prefixes paired with a short field name for diagnostics, in the fixed
    /// header-line order.
    pub(crate) fn prefixes(&self) -> [(&str, &str); 7] {
        [
            ("race name", &self.race_name_prefix),
            ("track type", &self.track_type_prefix),
            ("width", &self.width_prefix),
            ("height", &self.height_prefix),
            ("lap distance", &self.lap_distance_prefix),
            ("total time", &self.total_time_prefix),
            ("participants", &self.participants_prefix),
        ]
    }
}

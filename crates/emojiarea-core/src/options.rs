//! Per-field options: where the picker trigger goes and what it says.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::Result;

pub const DEFAULT_BUTTON_LABEL: &str = "Emojis";

/// Options for one attached field.
///
/// ```json
/// { "button": false, "button_label": "Emojis", "button_position": "before" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiAreaOptions {
    pub button: ButtonConfig,
    pub button_label: SmolStr,
    pub button_position: ButtonPosition,
}

impl Default for EmojiAreaOptions {
    fn default() -> Self {
        Self {
            button: ButtonConfig::Default,
            button_label: SmolStr::new_static(DEFAULT_BUTTON_LABEL),
            button_position: ButtonPosition::After,
        }
    }
}

impl EmojiAreaOptions {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// What the host should do about the picker trigger.
    pub fn button_plan(&self) -> ButtonPlan {
        match &self.button {
            ButtonConfig::Suppressed => ButtonPlan::Suppressed,
            ButtonConfig::Default => ButtonPlan::Create {
                label: self.button_label.clone(),
                position: self.button_position,
            },
            ButtonConfig::Custom(id) => ButtonPlan::Existing { id: id.clone() },
        }
    }
}

/// Picker trigger setting.
///
/// Serialized as `null` (create one), `false` (no trigger) or the id of an
/// existing element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<RawButton>", into = "Option<RawButton>")]
pub enum ButtonConfig {
    #[default]
    Default,
    Custom(SmolStr),
    Suppressed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawButton {
    Flag(bool),
    Id(SmolStr),
}

impl From<Option<RawButton>> for ButtonConfig {
    fn from(raw: Option<RawButton>) -> Self {
        match raw {
            None | Some(RawButton::Flag(true)) => ButtonConfig::Default,
            Some(RawButton::Flag(false)) => ButtonConfig::Suppressed,
            Some(RawButton::Id(id)) => ButtonConfig::Custom(id),
        }
    }
}

impl From<ButtonConfig> for Option<RawButton> {
    fn from(button: ButtonConfig) -> Self {
        match button {
            ButtonConfig::Default => None,
            ButtonConfig::Suppressed => Some(RawButton::Flag(false)),
            ButtonConfig::Custom(id) => Some(RawButton::Id(id)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonPosition {
    Before,
    #[default]
    After,
}

/// Resolved trigger placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonPlan {
    Suppressed,
    /// Create a trigger with `label`, placed relative to the editor.
    Create {
        label: SmolStr,
        position: ButtonPosition,
    },
    /// Use the element with this id; it is not moved.
    Existing { id: SmolStr },
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry of the `rules` table.
///
/// ```json
/// { "test": "\\.(scss|sass)$", "use": ["style-to-css", "css-to-bundle-entry"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Regular expression matched against the project-relative path
    pub test: String,

    /// Regular expression that vetoes an otherwise matching path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Transformer names, applied in order
    #[serde(rename = "use")]
    pub stages: Vec<String>,
}

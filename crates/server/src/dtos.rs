use deck_core::{DeckSpec, PatchOps, StyleProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub style_profile: StyleProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub template_url: String,
    /// Kept as sent so it can be echoed back verbatim.
    pub deck_spec: serde_json::Value,
}

impl GenerateRequest {
    pub fn parse_deck_spec(&self) -> Result<DeckSpec, serde_json::Error> {
        DeckSpec::deserialize(&self.deck_spec)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    pub pptx_url: String,
    #[serde(default)]
    pub patch_ops: PatchOps,
    /// Accepted for compatibility; patches are applied to the fetched deck.
    #[serde(default)]
    pub current_spec: serde_json::Value,
}

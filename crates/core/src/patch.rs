//! Patch operations applied to an existing deck.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::deck::{ChartPoint, TextValue};

/// Layout used by `add_slide` when the operation names none.
pub const DEFAULT_PATCH_LAYOUT: &str = "Title and Content";

/// An ordered list of patch operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchOps {
    #[serde(default)]
    pub ops: Vec<PatchOp>,
}

/// A single edit to a deck, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PatchOp {
    /// Replace the text of the shape named `placeholder` on one slide.
    ReplaceText {
        #[serde(default)]
        slide_index: i64,
        placeholder: String,
        #[serde(default)]
        new_text: TextValue,
    },

    /// Add a slide from a layout and fill shapes by name.
    AddSlide {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after_index: Option<i64>,
        #[serde(default = "default_patch_layout")]
        layout: String,
        #[serde(default)]
        placeholders: BTreeMap<String, TextValue>,
    },

    /// Replace the data of an existing chart.
    UpdateChartSeries {
        #[serde(default)]
        slide_index: i64,
        #[serde(default)]
        chart_index: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        series_name: Option<String>,
        #[serde(default)]
        data: Vec<ChartPoint>,
    },

    /// Any operation type this service does not know.
    #[serde(other)]
    Unsupported,
}

fn default_patch_layout() -> String {
    DEFAULT_PATCH_LAYOUT.to_string()
}

impl PatchOp {
    /// Wire name of the operation, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            PatchOp::ReplaceText { .. } => "replace_text",
            PatchOp::AddSlide { .. } => "add_slide",
            PatchOp::UpdateChartSeries { .. } => "update_chart_series",
            PatchOp::Unsupported => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_replace_text() {
        let op: PatchOp = serde_json::from_value(json!({
            "type": "replace_text",
            "slideIndex": 2,
            "placeholder": "Title 1",
            "newText": "Revenue"
        }))
        .unwrap();
        assert_eq!(
            op,
            PatchOp::ReplaceText {
                slide_index: 2,
                placeholder: "Title 1".into(),
                new_text: "Revenue".into(),
            }
        );
    }

    #[test]
    fn test_replace_text_defaults() {
        let op: PatchOp =
            serde_json::from_value(json!({"type": "replace_text", "placeholder": "Title 1"})).unwrap();
        match op {
            PatchOp::ReplaceText {
                slide_index,
                new_text,
                ..
            } => {
                assert_eq!(slide_index, 0);
                assert_eq!(new_text.0, "");
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_negative_indices_parse() {
        let ops: PatchOps = serde_json::from_value(json!({"ops": [
            {"type": "replace_text", "slideIndex": -1, "placeholder": "Title 1"},
            {"type": "add_slide", "afterIndex": -3}
        ]}))
        .unwrap();
        assert!(matches!(ops.ops[0], PatchOp::ReplaceText { slide_index: -1, .. }));
        assert!(matches!(ops.ops[1], PatchOp::AddSlide { after_index: Some(-3), .. }));
    }

    #[test]
    fn test_parse_add_slide_defaults() {
        let op: PatchOp = serde_json::from_value(json!({
            "type": "add_slide",
            "placeholders": {"Title 1": "Agenda", "Content Placeholder 2": 42}
        }))
        .unwrap();
        match op {
            PatchOp::AddSlide {
                after_index,
                layout,
                placeholders,
            } => {
                assert_eq!(after_index, None);
                assert_eq!(layout, DEFAULT_PATCH_LAYOUT);
                assert_eq!(placeholders["Content Placeholder 2"].0, "42");
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_chart_series() {
        let op: PatchOp = serde_json::from_value(json!({
            "type": "update_chart_series",
            "slideIndex": 1,
            "data": [["Q1", 3], ["Q2", 4.5]]
        }))
        .unwrap();
        assert_eq!(op.kind(), "update_chart_series");
        match op {
            PatchOp::UpdateChartSeries {
                chart_index, data, ..
            } => {
                assert_eq!(chart_index, 0);
                assert_eq!(data.len(), 2);
                assert_eq!(data[1].value, 4.5);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_is_unsupported() {
        let ops: PatchOps = serde_json::from_value(json!({
            "ops": [{"type": "delete_everything", "force": true}]
        }))
        .unwrap();
        assert_eq!(ops.ops, vec![PatchOp::Unsupported]);
    }
}

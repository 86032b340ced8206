//! Style profile extracted from a PPTX template.

use serde::{Deserialize, Serialize};

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Visual summary of a template, consumed by a downstream deck planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    /// Slide dimensions in EMU.
    pub slide_size: SlideSize,

    /// Layouts of the first slide master, in master order.
    pub layouts: Vec<LayoutInfo>,

    /// Theme color scheme slots.
    pub theme_colors: Vec<ThemeColor>,

    /// Theme heading and body fonts.
    pub fonts: Vec<ThemeFont>,

    /// Number of slides present in the template.
    pub slide_count: usize,
}

/// Slide dimensions in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: i64,
    pub height: i64,
}

impl Default for SlideSize {
    /// 10in x 7.5in, the size PowerPoint assumes when `p:sldSz` is absent.
    fn default() -> Self {
        Self {
            width: 10 * EMU_PER_INCH,
            height: 7 * EMU_PER_INCH + EMU_PER_INCH / 2,
        }
    }
}

/// A slide layout and the placeholders it offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub name: String,
    pub index: usize,
    pub placeholders: Vec<PlaceholderInfo>,
}

impl LayoutInfo {
    /// Whether the layout has a placeholder of the given OOXML type.
    pub fn has_placeholder_type(&self, ph_type: &str) -> bool {
        self.placeholders.iter().any(|p| p.ph_type == ph_type)
    }
}

/// A placeholder shape on a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderInfo {
    /// Placeholder index, `0` when the layout omits it.
    pub idx: u32,

    /// OOXML placeholder type token (`title`, `body`, `ctrTitle`, ...).
    #[serde(rename = "type")]
    pub ph_type: String,

    /// Shape name as shown in the selection pane.
    pub name: Option<String>,
}

/// One slot of the theme color scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColor {
    /// Slot name (`dk1`, `accent1`, `hlink`, ...).
    pub name: String,

    /// Upper-case hex RGB without a leading `#`.
    pub rgb: String,
}

/// A font from the theme font scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeFont {
    pub role: FontRole,
    pub typeface: String,
}

/// Which font of the scheme a typeface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontRole {
    /// Headings.
    Major,
    /// Body text.
    Minor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = StyleProfile {
            slide_size: SlideSize {
                width: 12_192_000,
                height: 6_858_000,
            },
            layouts: vec![LayoutInfo {
                name: "Title Slide".into(),
                index: 0,
                placeholders: vec![PlaceholderInfo {
                    idx: 0,
                    ph_type: "ctrTitle".into(),
                    name: Some("Title 1".into()),
                }],
            }],
            theme_colors: vec![ThemeColor {
                name: "accent1".into(),
                rgb: "4472C4".into(),
            }],
            fonts: vec![ThemeFont {
                role: FontRole::Major,
                typeface: "Calibri Light".into(),
            }],
            slide_count: 3,
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["slideSize"]["width"], 12_192_000);
        assert_eq!(json["layouts"][0]["placeholders"][0]["type"], "ctrTitle");
        assert_eq!(json["themeColors"][0]["rgb"], "4472C4");
        assert_eq!(json["fonts"][0]["role"], "major");
        assert_eq!(json["slideCount"], 3);
    }

    #[test]
    fn test_default_slide_size_is_four_by_three() {
        let size = SlideSize::default();
        assert_eq!(size.width, 9_144_000);
        assert_eq!(size.height, 6_858_000);
    }

    #[test]
    fn test_has_placeholder_type() {
        let layout = LayoutInfo {
            name: "Title Only".into(),
            index: 5,
            placeholders: vec![PlaceholderInfo {
                idx: 0,
                ph_type: "title".into(),
                name: None,
            }],
        };
        assert!(layout.has_placeholder_type("title"));
        assert!(!layout.has_placeholder_type("body"));
    }
}

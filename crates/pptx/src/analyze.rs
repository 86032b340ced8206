//! Template analysis: extract a [`StyleProfile`] from a PPTX package.

use deck_core::{
    Error, FontRole, LayoutInfo, PlaceholderInfo, Result, SlideSize, StyleProfile, ThemeColor,
    ThemeFont,
};
use std::io::{Read, Seek};

use crate::package::Package;
use crate::xml::XmlElement;

/// Placeholder type the OOXML schema assumes when `p:ph` omits `type`.
pub const DEFAULT_PLACEHOLDER_TYPE: &str = "obj";

/// Color scheme slots of a theme, in schema order.
pub const THEME_COLOR_SLOTS: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Parser that turns a template into a style profile.
pub struct TemplateAnalyzer;

impl TemplateAnalyzer {
    /// Create a new template analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Analyze a PPTX file from a reader.
    pub fn analyze<R: Read + Seek>(&self, reader: R) -> Result<StyleProfile> {
        let package = Package::open(reader)?;
        self.analyze_package(&package)
    }

    /// Analyze an already opened package.
    pub fn analyze_package(&self, package: &Package) -> Result<StyleProfile> {
        let presentation_part = package.presentation_part()?;
        let presentation = package.read_xml(&presentation_part)?;
        let root = &presentation.root;

        if root.local_name() != "presentation" {
            return Err(Error::InvalidPackage(format!(
                "main part is <{}>, not a presentation",
                root.name
            )));
        }

        let slide_size = root
            .child("sldSz")
            .and_then(|e| Some(SlideSize {
                width: e.attr("cx")?.parse().ok()?,
                height: e.attr("cy")?.parse().ok()?,
            }))
            .unwrap_or_default();

        let slide_count = root
            .child("sldIdLst")
            .map(|list| list.elements().filter(|e| e.local_name() == "sldId").count())
            .unwrap_or(0);

        let master_part = first_master_part(package, &presentation_part, root)?;

        let layouts = match &master_part {
            Some(master) => layout_parts(package, master)?
                .iter()
                .enumerate()
                .map(|(index, part)| self.read_layout(package, part, index))
                .collect::<Result<Vec<_>>>()?,
            None => {
                log::warn!("Presentation has no slide master, reporting no layouts");
                Vec::new()
            }
        };

        let theme_part = match &master_part {
            Some(master) => package.theme_of(master)?,
            None => None,
        };
        let theme_part = match theme_part {
            Some(part) => Some(part),
            None => package.theme_of(&presentation_part)?,
        };

        let (theme_colors, fonts) = match theme_part {
            Some(part) => match package.read_xml(&part) {
                Ok(theme) => (read_theme_colors(&theme.root), read_theme_fonts(&theme.root)),
                Err(e) => {
                    log::warn!("Ignoring unreadable theme {}: {}", part, e);
                    (Vec::new(), Vec::new())
                }
            },
            None => {
                log::debug!("No theme part found");
                (Vec::new(), Vec::new())
            }
        };

        log::debug!(
            "Analyzed template: {} layouts, {} theme colors, {} slides",
            layouts.len(),
            theme_colors.len(),
            slide_count
        );

        Ok(StyleProfile {
            slide_size,
            layouts,
            theme_colors,
            fonts,
            slide_count,
        })
    }

    /// Read one layout part.
    fn read_layout(&self, package: &Package, part: &str, index: usize) -> Result<LayoutInfo> {
        let doc = package.read_xml(part)?;
        let c_sld = doc.root.child("cSld");

        let name = c_sld
            .and_then(|c| c.attr("name"))
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Layout {}", index));

        let placeholders = c_sld
            .and_then(|c| c.child("spTree"))
            .map(placeholders_in)
            .unwrap_or_default();

        Ok(LayoutInfo {
            name,
            index,
            placeholders,
        })
    }
}

impl Default for TemplateAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Part name of the first slide master, if the presentation lists one.
pub(crate) fn first_master_part(
    package: &Package,
    presentation_part: &str,
    presentation: &XmlElement,
) -> Result<Option<String>> {
    let rels = package.relationships(presentation_part)?;

    let listed = presentation
        .child("sldMasterIdLst")
        .and_then(|list| list.elements().find(|e| e.local_name() == "sldMasterId"))
        .and_then(|e| e.attr("r:id"))
        .and_then(|id| rels.target_of(id));

    let part = listed.or_else(|| {
        rels.first_of_type("slideMaster")
            .and_then(|r| rels.target_part(r))
    });

    Ok(part.filter(|p| package.contains(p)))
}

/// Layout part names of a master in `p:sldLayoutIdLst` order.
pub(crate) fn layout_parts(package: &Package, master_part: &str) -> Result<Vec<String>> {
    let master = package.read_xml(master_part)?;
    let rels = package.relationships(master_part)?;

    let mut parts: Vec<String> = master
        .root
        .child("sldLayoutIdLst")
        .map(|list| {
            list.elements()
                .filter(|e| e.local_name() == "sldLayoutId")
                .filter_map(|e| e.attr("r:id"))
                .filter_map(|id| rels.target_of(id))
                .collect()
        })
        .unwrap_or_default();

    // Masters without an id list still relate to their layouts.
    if parts.is_empty() {
        parts = rels
            .iter()
            .filter(|r| r.is_type("slideLayout"))
            .filter_map(|r| rels.target_part(r))
            .collect();
    }

    parts.retain(|p| {
        let present = package.contains(p);
        if !present {
            log::warn!("Layout part {} is referenced but missing", p);
        }
        present
    });
    Ok(parts)
}

/// The `p:ph` element of a shape, if it is a placeholder.
pub(crate) fn placeholder_of(shape: &XmlElement) -> Option<&XmlElement> {
    let nv = shape
        .elements()
        .find(|e| e.local_name().starts_with("nv") && e.local_name().ends_with("Pr"))?;
    nv.child("nvPr")?.child("ph")
}

/// Shape name from its non-visual properties.
pub(crate) fn shape_name(shape: &XmlElement) -> Option<&str> {
    shape
        .elements()
        .find(|e| e.local_name().starts_with("nv") && e.local_name().ends_with("Pr"))?
        .child("cNvPr")?
        .attr("name")
}

/// Placeholders among the top-level shapes of a shape tree.
fn placeholders_in(sp_tree: &XmlElement) -> Vec<PlaceholderInfo> {
    sp_tree
        .elements()
        .filter(|e| matches!(e.local_name(), "sp" | "pic" | "graphicFrame"))
        .filter_map(|shape| {
            let ph = placeholder_of(shape)?;
            Some(PlaceholderInfo {
                idx: ph.attr("idx").and_then(|i| i.parse().ok()).unwrap_or(0),
                ph_type: ph
                    .attr("type")
                    .unwrap_or(DEFAULT_PLACEHOLDER_TYPE)
                    .to_string(),
                name: shape_name(shape).map(str::to_string),
            })
        })
        .collect()
}

/// Color scheme slots in document order.
fn read_theme_colors(theme: &XmlElement) -> Vec<ThemeColor> {
    let Some(scheme) = theme.find(&["themeElements", "clrScheme"]) else {
        return Vec::new();
    };

    scheme
        .elements()
        .filter(|slot| THEME_COLOR_SLOTS.contains(&slot.local_name()))
        .filter_map(|slot| {
            let color = slot.elements().next()?;
            let rgb = match color.local_name() {
                "srgbClr" => color.attr("val"),
                "sysClr" => color.attr("lastClr"),
                _ => None,
            }
            .unwrap_or_default();
            Some(ThemeColor {
                name: slot.local_name().to_string(),
                rgb: rgb.to_uppercase(),
            })
        })
        .collect()
}

/// Latin typefaces of the major and minor fonts.
fn read_theme_fonts(theme: &XmlElement) -> Vec<ThemeFont> {
    let Some(scheme) = theme.find(&["themeElements", "fontScheme"]) else {
        return Vec::new();
    };

    [("majorFont", FontRole::Major), ("minorFont", FontRole::Minor)]
        .into_iter()
        .filter_map(|(element, role)| {
            let typeface = scheme.find(&[element, "latin"])?.attr("typeface")?;
            (!typeface.is_empty()).then(|| ThemeFont {
                role,
                typeface: typeface.to_string(),
            })
        })
        .collect()
}

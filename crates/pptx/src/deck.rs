//! Editable presentation: slide list management, placeholder cloning,
//! text replacement and chart insertion.

use deck_core::{ChartPoint, Error, Result};
use std::io::{Read, Seek, Write};

use crate::analyze::{first_master_part, layout_parts, placeholder_of, shape_name};
use crate::chart::{chart_rel_id, graphic_frame, ChartData, Frame};
use crate::package::{content_type, Package};
use crate::rels::{rel_type, Relationships};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// Lowest slide id PowerPoint accepts.
const MIN_SLIDE_ID: u32 = 256;

/// Placeholder types that stay on the layout instead of being cloned.
const NON_CLONED_PLACEHOLDERS: [&str; 3] = ["dt", "ftr", "sldNum"];

/// Placeholder types that get an empty text body when cloned.
const TEXT_PLACEHOLDERS: [&str; 5] = ["title", "ctrTitle", "subTitle", "body", "obj"];

/// A slide layout available for new slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRef {
    pub name: String,
    pub part: String,
}

/// A presentation opened for editing.
pub struct Deck {
    package: Package,
    presentation_part: String,
    presentation: XmlDocument,
    presentation_rels: Relationships,
    layouts: Vec<LayoutRef>,
}

impl Deck {
    /// Open a PPTX file from a reader.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(Package::open(reader)?)
    }

    /// Open a PPTX file held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    fn from_package(package: Package) -> Result<Self> {
        let presentation_part = package.presentation_part()?;
        let presentation = package.read_xml(&presentation_part)?;
        if presentation.root.local_name() != "presentation" {
            return Err(Error::InvalidPackage(format!(
                "main part is <{}>, not a presentation",
                presentation.root.name
            )));
        }
        let presentation_rels = package.relationships(&presentation_part)?;

        let mut layouts = Vec::new();
        if let Some(master) = first_master_part(&package, &presentation_part, &presentation.root)? {
            for (index, part) in layout_parts(&package, &master)?.into_iter().enumerate() {
                let doc = package.read_xml(&part)?;
                let name = doc
                    .root
                    .child("cSld")
                    .and_then(|c| c.attr("name"))
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Layout {}", index));
                layouts.push(LayoutRef { name, part });
            }
        }

        Ok(Self {
            package,
            presentation_part,
            presentation,
            presentation_rels,
            layouts,
        })
    }

    /// Layouts of the first slide master, in master order.
    pub fn layouts(&self) -> &[LayoutRef] {
        &self.layouts
    }

    /// Layout with exactly this name, else the first layout.
    pub fn layout_by_name(&self, name: &str) -> Result<&LayoutRef> {
        match self.layouts.iter().find(|l| l.name == name) {
            Some(layout) => Ok(layout),
            None => {
                let fallback = self.layouts.first().ok_or_else(|| {
                    Error::InvalidPackage("template has no slide layouts".to_string())
                })?;
                log::debug!("Layout '{}' not found, using '{}'", name, fallback.name);
                Ok(fallback)
            }
        }
    }

    /// Part names of the slides in presentation order.
    pub fn slide_parts(&self) -> Vec<String> {
        self.presentation
            .root
            .child("sldIdLst")
            .map(|list| {
                list.elements()
                    .filter(|e| e.local_name() == "sldId")
                    .filter_map(|e| e.attr("r:id"))
                    .filter_map(|id| self.presentation_rels.target_of(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn slide_count(&self) -> usize {
        self.slide_parts().len()
    }

    /// Remove every slide, keeping masters, layouts and theme.
    pub fn remove_all_slides(&mut self) -> Result<()> {
        let rel_ids: Vec<String> = self
            .presentation
            .root
            .child("sldIdLst")
            .map(|list| {
                list.elements()
                    .filter_map(|e| e.attr("r:id"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        for rel_id in &rel_ids {
            if let Some(rel) = self.presentation_rels.remove(rel_id) {
                if let Some(part) = self.presentation_rels.target_part(&rel) {
                    self.delete_slide_part(&part)?;
                }
            }
        }

        if let Some(list) = self.presentation.root.child_mut("sldIdLst") {
            list.children.clear();
        }

        log::debug!("Removed {} slides", rel_ids.len());
        Ok(())
    }

    /// Delete a slide part with the notes and charts only it owns.
    fn delete_slide_part(&mut self, part: &str) -> Result<()> {
        let rels = self.package.relationships(part)?;
        for rel in rels.iter() {
            let Some(target) = rels.target_part(rel) else {
                continue;
            };
            if rel.is_type("notesSlide") {
                self.package.delete_part(&target)?;
            } else if rel.is_type("chart") {
                let chart_rels = self.package.relationships(&target)?;
                for owned in chart_rels.iter().filter_map(|r| chart_rels.target_part(r)) {
                    if owned.starts_with("ppt/embeddings/") || owned.starts_with("ppt/charts/") {
                        self.package.delete_part(&owned)?;
                    }
                }
                self.package.delete_part(&target)?;
            }
        }
        self.package.delete_part(part)
    }

    /// Add a slide based on `layout`, after slide `after` when that index
    /// exists (appending otherwise). Returns the new slide's index.
    pub fn add_slide(&mut self, layout: &LayoutRef, after: Option<usize>) -> Result<usize> {
        let layout_doc = self.package.read_xml(&layout.part)?;
        let slide_part = self.package.next_part_name("ppt/slides", "slide");

        let slide = new_slide_from_layout(&layout_doc.root);
        self.package.write_xml(&slide_part, &XmlDocument::new(slide))?;

        let mut slide_rels = Relationships::new(slide_part.as_str());
        slide_rels.add(rel_type::SLIDE_LAYOUT, &layout.part);
        self.package.write_relationships(&slide_rels)?;
        self.package.add_override(&slide_part, content_type::SLIDE)?;

        let rel_id = self.presentation_rels.add(rel_type::SLIDE, &slide_part);
        let list = self.slide_id_list();
        let next_id = list
            .elements()
            .filter_map(|e| e.attr("id"))
            .filter_map(|id| id.parse::<u32>().ok())
            .max()
            .map(|max| max + 1)
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID);
        let count = list.elements().count();
        let position = match after {
            Some(i) if i < count => i + 1,
            _ => count,
        };
        list.insert_element(
            position,
            XmlElement::new("p:sldId")
                .with_attr("id", next_id.to_string())
                .with_attr("r:id", rel_id),
        );

        log::debug!(
            "Added {} from layout '{}' at index {}",
            slide_part,
            layout.name,
            position
        );
        Ok(position)
    }

    /// The `p:sldIdLst`, created in schema position when missing.
    fn slide_id_list(&mut self) -> &mut XmlElement {
        let root = &mut self.presentation.root;
        let position = root
            .elements()
            .take_while(|e| {
                matches!(
                    e.local_name(),
                    "sldMasterIdLst" | "notesMasterIdLst" | "handoutMasterIdLst"
                )
            })
            .count();
        root.ensure_child("sldIdLst", "p:sldIdLst", position)
    }

    /// Replace the text of the first text shape on a slide whose name
    /// satisfies `matches`. Returns whether a shape was updated.
    pub fn set_text_where<F>(&mut self, slide: usize, matches: F, text: &str) -> Result<bool>
    where
        F: Fn(&str) -> bool,
    {
        let lines: Vec<&str> = text.split('\n').collect();
        self.set_paragraphs_where(slide, matches, &lines)
    }

    /// Replace the text of the shape named exactly `name`.
    pub fn set_text(&mut self, slide: usize, name: &str, text: &str) -> Result<bool> {
        self.set_text_where(slide, |n| n == name, text)
    }

    /// Fill the first matching text shape with one paragraph per entry.
    pub fn set_paragraphs_where<F, S>(&mut self, slide: usize, matches: F, paragraphs: &[S]) -> Result<bool>
    where
        F: Fn(&str) -> bool,
        S: AsRef<str>,
    {
        let Some(part) = self.slide_parts().into_iter().nth(slide) else {
            log::warn!("Slide index {} out of range", slide);
            return Ok(false);
        };

        let mut doc = self.package.read_xml(&part)?;
        let Some(sp_tree) = doc.root.find_mut(&["cSld", "spTree"]) else {
            return Ok(false);
        };

        let target = sp_tree.elements_mut().find(|shape| {
            shape.local_name() == "sp"
                && shape.child("txBody").is_some()
                && shape_name(shape).map(&matches).unwrap_or(false)
        });

        let Some(shape) = target else {
            return Ok(false);
        };
        if let Some(body) = shape.child_mut("txBody") {
            fill_text_body(body, paragraphs);
        }

        self.package.write_xml(&part, &doc)?;
        Ok(true)
    }

    /// Add a chart frame to a slide.
    pub fn add_chart(&mut self, slide: usize, chart: &ChartData, frame: Frame) -> Result<()> {
        let part = self
            .slide_parts()
            .into_iter()
            .nth(slide)
            .ok_or_else(|| Error::InvalidInput(format!("slide index {} out of range", slide)))?;

        let chart_part = self.package.next_part_name("ppt/charts", "chart");
        self.package.write_xml(&chart_part, &chart.to_document())?;
        self.package.add_override(&chart_part, content_type::CHART)?;

        let mut rels = self.package.relationships(&part)?;
        let rel_id = rels.add(rel_type::CHART, &chart_part);
        self.package.write_relationships(&rels)?;

        let mut doc = self.package.read_xml(&part)?;
        let shape_id = next_shape_id(&doc.root);
        let sp_tree = doc
            .root
            .find_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::InvalidPackage(format!("{} has no shape tree", part)))?;
        sp_tree.push(graphic_frame(
            shape_id,
            &format!("Chart {}", shape_id - 1),
            &rel_id,
            frame,
        ));
        self.package.write_xml(&part, &doc)?;

        log::debug!("Added {:?} chart {} to {}", chart.kind, chart_part, part);
        Ok(())
    }

    /// Replace the data of the `chart_index`-th chart on a slide, keeping its
    /// kind and title. Returns whether a chart was found.
    pub fn update_chart(
        &mut self,
        slide: usize,
        chart_index: usize,
        points: &[ChartPoint],
        series_name: Option<&str>,
    ) -> Result<bool> {
        let Some(part) = self.slide_parts().into_iter().nth(slide) else {
            return Ok(false);
        };

        let doc = self.package.read_xml(&part)?;
        let rels = self.package.relationships(&part)?;
        let chart_part = doc
            .root
            .find(&["cSld", "spTree"])
            .map(|tree| {
                tree.elements()
                    .filter(|e| e.local_name() == "graphicFrame")
                    .filter_map(chart_rel_id)
                    .filter_map(|id| rels.target_of(id))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
            .into_iter()
            .nth(chart_index);

        let Some(chart_part) = chart_part.filter(|p| self.package.contains(p)) else {
            return Ok(false);
        };

        let mut data = ChartData::read(&self.package.read_xml(&chart_part)?);
        data.points = points.to_vec();
        if let Some(name) = series_name {
            data.series_name = name.to_string();
        }
        self.package.write_xml(&chart_part, &data.to_document())?;
        Ok(true)
    }

    /// Write the presentation.
    pub fn save<W: Write + Seek>(mut self, writer: W) -> Result<W> {
        self.flush()?;
        self.package.save(writer)
    }

    /// Serialize the presentation to bytes.
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    fn flush(&mut self) -> Result<()> {
        let part = self.presentation_part.clone();
        self.package.write_xml(&part, &self.presentation)?;
        self.package.write_relationships(&self.presentation_rels)
    }
}

/// Build a slide whose shape tree holds clones of the layout's placeholders.
fn new_slide_from_layout(layout: &XmlElement) -> XmlElement {
    let mut sp_tree = XmlElement::new("p:spTree")
        .with_child(
            XmlElement::new("p:nvGrpSpPr")
                .with_child(XmlElement::new("p:cNvPr").with_attr("id", "1").with_attr("name", ""))
                .with_child(XmlElement::new("p:cNvGrpSpPr"))
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(XmlElement::new("p:grpSpPr"));

    let layout_shapes = layout
        .find(&["cSld", "spTree"])
        .map(|tree| tree.elements().collect::<Vec<_>>())
        .unwrap_or_default();

    let mut next_id = 2u32;
    for shape in layout_shapes {
        let Some(ph) = placeholder_of(shape) else {
            continue;
        };
        let ph_type = ph.attr("type").unwrap_or("obj");
        if NON_CLONED_PLACEHOLDERS.contains(&ph_type) {
            continue;
        }
        sp_tree.push(clone_placeholder(ph, next_id));
        next_id += 1;
    }

    XmlElement::new("p:sld")
        .with_attr("xmlns:a", NS_A)
        .with_attr("xmlns:r", NS_R)
        .with_attr("xmlns:p", NS_P)
        .with_child(XmlElement::new("p:cSld").with_child(sp_tree))
        .with_child(XmlElement::new("p:clrMapOvr").with_child(XmlElement::new("a:masterClrMapping")))
}

/// A slide placeholder inheriting position and formatting from `ph`.
fn clone_placeholder(ph: &XmlElement, id: u32) -> XmlElement {
    let ph_type = ph.attr("type").unwrap_or("obj");
    let vertical = ph.attr("orient") == Some("vert");

    let mut new_ph = XmlElement::new("p:ph");
    for key in ["type", "orient", "sz", "idx"] {
        if let Some(value) = ph.attr(key) {
            new_ph.set_attr(key, value);
        }
    }

    let mut sp = XmlElement::new("p:sp")
        .with_child(
            XmlElement::new("p:nvSpPr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", id.to_string())
                        .with_attr("name", placeholder_name(ph_type, vertical, id)),
                )
                .with_child(
                    XmlElement::new("p:cNvSpPr")
                        .with_child(XmlElement::new("a:spLocks").with_attr("noGrp", "1")),
                )
                .with_child(XmlElement::new("p:nvPr").with_child(new_ph)),
        )
        .with_child(XmlElement::new("p:spPr"));

    if TEXT_PLACEHOLDERS.contains(&ph_type) {
        sp.push(
            XmlElement::new("p:txBody")
                .with_child(XmlElement::new("a:bodyPr"))
                .with_child(XmlElement::new("a:lstStyle"))
                .with_child(XmlElement::new("a:p")),
        );
    }
    sp
}

/// Name PowerPoint gives a new placeholder shape, e.g. "Content Placeholder 2".
pub fn placeholder_name(ph_type: &str, vertical: bool, id: u32) -> String {
    let base = match ph_type {
        "title" | "ctrTitle" => "Title",
        "subTitle" => "Subtitle",
        "body" => "Text Placeholder",
        "obj" => "Content Placeholder",
        "chart" => "Chart Placeholder",
        "tbl" => "Table Placeholder",
        "dgm" => "SmartArt Placeholder",
        "media" => "Media Placeholder",
        "clipArt" => "Picture",
        "pic" => "Picture Placeholder",
        "sldImg" => "Slide Image Placeholder",
        "dt" => "Date Placeholder",
        "ftr" => "Footer Placeholder",
        "hdr" => "Header Placeholder",
        "sldNum" => "Slide Number Placeholder",
        _ => "Placeholder",
    };
    if vertical {
        format!("Vertical {} {}", base, id - 1)
    } else {
        format!("{} {}", base, id - 1)
    }
}

/// Replace every paragraph of a text body.
fn fill_text_body<S: AsRef<str>>(body: &mut XmlElement, paragraphs: &[S]) {
    body.remove_children("p");
    if paragraphs.is_empty() {
        body.push(XmlElement::new("a:p"));
        return;
    }
    for text in paragraphs {
        let text = text.as_ref();
        let mut p = XmlElement::new("a:p");
        if !text.is_empty() {
            p.push(
                XmlElement::new("a:r")
                    .with_child(XmlElement::new("a:rPr").with_attr("lang", "en-US").with_attr("dirty", "0"))
                    .with_child(XmlElement::new("a:t").with_text(text)),
            );
        }
        body.children.push(XmlNode::Element(p));
    }
}

/// One above the highest `cNvPr/@id` on the slide.
fn next_shape_id(slide: &XmlElement) -> u32 {
    slide
        .descendants("cNvPr")
        .iter()
        .filter_map(|e| e.attr("id"))
        .filter_map(|id| id.parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        + 1
}

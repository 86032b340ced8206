//! Minimal PPTX template builder for tests.
//!
//! Produces a package with one slide master, three layouts
//! ("Title Slide", "Title and Content", "Title Only"), an Office-like theme
//! and a configurable number of slides.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Names of the layouts in the generated template, in master order.
pub const LAYOUT_NAMES: [&str; 3] = ["Title Slide", "Title and Content", "Title Only"];

/// Builder for a small but structurally complete template.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    slides: usize,
    slide_size: (i64, i64),
    notes: bool,
    theme: bool,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self {
            slides: 1,
            slide_size: (12_192_000, 6_858_000),
            notes: false,
            theme: true,
        }
    }
}

impl TemplateBuilder {
    /// Number of slides, each based on "Title and Content" with a title "Slide N".
    pub fn with_slides(mut self, slides: usize) -> Self {
        self.slides = slides;
        self
    }

    pub fn with_slide_size(mut self, width: i64, height: i64) -> Self {
        self.slide_size = (width, height);
        self
    }

    /// Give every slide a notes slide.
    pub fn with_notes(mut self, notes: bool) -> Self {
        self.notes = notes;
        self
    }

    /// Include the theme part.
    pub fn with_theme(mut self, theme: bool) -> Self {
        self.theme = theme;
        self
    }

    /// Build the `.pptx` bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".into(), self.content_types()),
            ("_rels/.rels".into(), root_rels()),
            ("ppt/presentation.xml".into(), self.presentation()),
            ("ppt/_rels/presentation.xml.rels".into(), self.presentation_rels()),
            ("ppt/slideMasters/slideMaster1.xml".into(), slide_master()),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
                self.master_rels(),
            ),
        ];

        for (i, _) in LAYOUT_NAMES.iter().enumerate() {
            let n = i + 1;
            parts.push((format!("ppt/slideLayouts/slideLayout{}.xml", n), layout(i)));
            parts.push((
                format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
                rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
            ));
        }

        if self.theme {
            parts.push(("ppt/theme/theme1.xml".into(), theme()));
        }

        for n in 1..=self.slides {
            parts.push((format!("ppt/slides/slide{}.xml", n), slide(n)));
            let notes_target = format!("../notesSlides/notesSlide{}.xml", n);
            let mut slide_rels = vec![("rId1", "slideLayout", "../slideLayouts/slideLayout2.xml")];
            if self.notes {
                slide_rels.push(("rId2", "notesSlide", notes_target.as_str()));
            }
            parts.push((format!("ppt/slides/_rels/slide{}.xml.rels", n), rels(&slide_rels)));

            if self.notes {
                let slide_target = format!("../slides/slide{}.xml", n);
                parts.push((format!("ppt/notesSlides/notesSlide{}.xml", n), notes_slide(n)));
                parts.push((
                    format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", n),
                    rels(&[("rId1", "slide", slide_target.as_str())]),
                ));
            }
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(name, FileOptions::default())
                .expect("start fixture entry");
            zip.write_all(content.as_bytes()).expect("write fixture entry");
        }
        zip.finish().expect("finish fixture zip").into_inner()
    }

    fn content_types(&self) -> String {
        let mut overrides = vec![
            override_entry("/ppt/presentation.xml", "presentationml.presentation.main+xml"),
            override_entry("/ppt/slideMasters/slideMaster1.xml", "presentationml.slideMaster+xml"),
        ];
        for n in 1..=LAYOUT_NAMES.len() {
            overrides.push(override_entry(
                &format!("/ppt/slideLayouts/slideLayout{}.xml", n),
                "presentationml.slideLayout+xml",
            ));
        }
        if self.theme {
            overrides.push(override_entry("/ppt/theme/theme1.xml", "theme+xml"));
        }
        for n in 1..=self.slides {
            overrides.push(override_entry(
                &format!("/ppt/slides/slide{}.xml", n),
                "presentationml.slide+xml",
            ));
            if self.notes {
                overrides.push(override_entry(
                    &format!("/ppt/notesSlides/notesSlide{}.xml", n),
                    "presentationml.notesSlide+xml",
                ));
            }
        }

        format!(
            r#"{}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
            DECL,
            overrides.join("")
        )
    }

    fn presentation(&self) -> String {
        let slide_ids: String = (1..=self.slides)
            .map(|n| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, 2 + n))
            .collect();
        let slide_list = if self.slides == 0 {
            String::new()
        } else {
            format!("<p:sldIdLst>{}</p:sldIdLst>", slide_ids)
        };

        format!(
            r#"{}
<p:presentation {} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
            DECL, NS_DECLS, slide_list, self.slide_size.0, self.slide_size.1
        )
    }

    fn presentation_rels(&self) -> String {
        let mut entries = vec![
            ("rId1".to_string(), "slideMaster", "slideMasters/slideMaster1.xml".to_string()),
            ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
        ];
        if !self.theme {
            entries.pop();
        }
        for n in 1..=self.slides {
            entries.push((format!("rId{}", 2 + n), "slide", format!("slides/slide{}.xml", n)));
        }
        let borrowed: Vec<(&str, &str, &str)> = entries
            .iter()
            .map(|(id, t, target)| (id.as_str(), *t, target.as_str()))
            .collect();
        rels(&borrowed)
    }

    fn master_rels(&self) -> String {
        let layout_targets: Vec<String> = (1..=LAYOUT_NAMES.len())
            .map(|n| format!("../slideLayouts/slideLayout{}.xml", n))
            .collect();
        let ids: Vec<String> = (1..=LAYOUT_NAMES.len()).map(|n| format!("rId{}", n)).collect();

        let mut entries: Vec<(&str, &str, &str)> = ids
            .iter()
            .zip(layout_targets.iter())
            .map(|(id, target)| (id.as_str(), "slideLayout", target.as_str()))
            .collect();
        let theme_id = format!("rId{}", LAYOUT_NAMES.len() + 1);
        if self.theme {
            entries.push((theme_id.as_str(), "theme", "../theme/theme1.xml"));
        }
        rels(&entries)
    }
}

fn override_entry(part: &str, suffix: &str) -> String {
    format!(
        r#"<Override PartName="{}" ContentType="application/vnd.openxmlformats-officedocument.{}"/>"#,
        part, suffix
    )
}

fn root_rels() -> String {
    format!(
        r#"{}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
        DECL, REL_NS
    )
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, short, target)| {
            format!(
                r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
                id, REL_NS, short, target
            )
        })
        .collect();
    format!(
        r#"{}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        DECL, body
    )
}

fn placeholder(id: u32, name: &str, ph: &str, text: bool) -> String {
    let body = if text {
        r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody>"#
    } else {
        ""
    };
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/>{}</p:sp>"#,
        id, name, ph, body
    )
}

fn sp_tree(shapes: &str) -> String {
    format!(
        r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree>"#,
        shapes
    )
}

fn slide_master() -> String {
    let shapes = [
        placeholder(2, "Title Placeholder 1", r#"<p:ph type="title"/>"#, true),
        placeholder(3, "Text Placeholder 2", r#"<p:ph type="body" idx="1"/>"#, true),
    ]
    .join("");
    let layout_ids: String = (1..=LAYOUT_NAMES.len())
        .map(|n| format!(r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#, 2147483648u64 + n as u64, n))
        .collect();
    format!(
        r#"{}
<p:sldMaster {}><p:cSld>{}</p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
        DECL,
        NS_DECLS,
        sp_tree(&shapes),
        layout_ids
    )
}

fn layout(index: usize) -> String {
    let shapes = match index {
        0 => [
            placeholder(2, "Title 1", r#"<p:ph type="ctrTitle"/>"#, true),
            placeholder(3, "Subtitle 2", r#"<p:ph type="subTitle" idx="1"/>"#, true),
            placeholder(4, "Date Placeholder 3", r#"<p:ph type="dt" sz="half" idx="10"/>"#, true),
            placeholder(5, "Footer Placeholder 4", r#"<p:ph type="ftr" sz="quarter" idx="11"/>"#, true),
            placeholder(6, "Slide Number Placeholder 5", r#"<p:ph type="sldNum" sz="quarter" idx="12"/>"#, true),
        ]
        .join(""),
        1 => [
            placeholder(2, "Title 1", r#"<p:ph type="title"/>"#, true),
            placeholder(3, "Content Placeholder 2", r#"<p:ph idx="1"/>"#, true),
            placeholder(4, "Slide Number Placeholder 3", r#"<p:ph type="sldNum" sz="quarter" idx="12"/>"#, true),
        ]
        .join(""),
        _ => placeholder(2, "Title 1", r#"<p:ph type="title"/>"#, true),
    };
    format!(
        r#"{}
<p:sldLayout {} preserve="1"><p:cSld name="{}">{}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        DECL,
        NS_DECLS,
        LAYOUT_NAMES[index],
        sp_tree(&shapes)
    )
}

fn slide(n: usize) -> String {
    let title = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Slide {}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        n
    );
    let body = r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Original body</a:t></a:r></a:p></p:txBody></p:sp>"#;
    format!(
        r#"{}
<p:sld {}><p:cSld>{}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        DECL,
        NS_DECLS,
        sp_tree(&format!("{}{}", title, body))
    )
}

fn notes_slide(n: usize) -> String {
    format!(
        r#"{}
<p:notes {}><p:cSld>{}</p:cSld></p:notes>"#,
        DECL,
        NS_DECLS,
        sp_tree(&placeholder(2, &format!("Notes Placeholder {}", n), r#"<p:ph type="body" idx="1"/>"#, true))
    )
}

fn theme() -> String {
    format!(
        r#"{}
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954f72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"/></a:themeElements></a:theme>"#,
        DECL
    )
}

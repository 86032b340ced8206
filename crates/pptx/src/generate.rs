//! Deck generation from a [`DeckSpec`] and patching with [`PatchOps`].

use deck_core::{DeckSpec, PatchOp, PatchOps, Result, SlideSpec};

use crate::chart::{ChartData, Frame};
use crate::deck::Deck;

/// Build a deck from a template: the template's slides are dropped and one
/// slide per spec entry is added.
pub fn generate_deck(template: &[u8], spec: &DeckSpec) -> Result<Vec<u8>> {
    let mut deck = Deck::from_bytes(template)?;
    deck.remove_all_slides()?;

    for slide_spec in &spec.slides {
        add_spec_slide(&mut deck, slide_spec)?;
    }

    log::info!(
        "Generated deck with {} slides from {} layouts",
        deck.slide_count(),
        deck.layouts().len()
    );
    deck.to_bytes()
}

fn add_spec_slide(deck: &mut Deck, spec: &SlideSpec) -> Result<()> {
    let layout = deck.layout_by_name(spec.layout_name())?.clone();
    let index = deck.add_slide(&layout, None)?;

    if let Some(title) = spec.title.as_deref().filter(|t| !t.is_empty()) {
        let placed = deck.set_text_where(index, |name| name.to_lowercase().contains("title"), title)?;
        if !placed {
            log::debug!("Layout '{}' has no title shape, title dropped", layout.name);
        }
    }

    let bullets = spec.bullet_texts();
    if !bullets.is_empty() {
        let placed = deck.set_paragraphs_where(
            index,
            |name| name.to_lowercase().contains("content"),
            &bullets,
        )?;
        if !placed {
            log::debug!("Layout '{}' has no content shape, bullets dropped", layout.name);
        }
    }

    if let Some(chart) = &spec.chart {
        deck.add_chart(index, &ChartData::from(chart), Frame::default())?;
    }

    Ok(())
}

/// Apply patch operations in order and return the patched deck.
pub fn patch_deck(source: &[u8], ops: &PatchOps) -> Result<Vec<u8>> {
    let mut deck = Deck::from_bytes(source)?;

    let mut applied = 0;
    for op in &ops.ops {
        if apply_patch(&mut deck, op)? {
            applied += 1;
        }
    }

    log::info!("Applied {} of {} patch operations", applied, ops.ops.len());
    deck.to_bytes()
}

/// Apply one operation. Returns whether it changed the deck; operations that
/// target missing slides, shapes or charts are skipped.
pub fn apply_patch(deck: &mut Deck, op: &PatchOp) -> Result<bool> {
    match op {
        PatchOp::ReplaceText {
            slide_index,
            placeholder,
            new_text,
        } => {
            let Some(slide) = to_index(*slide_index) else {
                log::warn!("replace_text: slide index {} out of range", slide_index);
                return Ok(false);
            };
            let changed = deck.set_text(slide, placeholder, &new_text.0)?;
            if !changed {
                log::warn!(
                    "replace_text: no shape '{}' on slide {}",
                    placeholder,
                    slide_index
                );
            }
            Ok(changed)
        }
        PatchOp::AddSlide {
            after_index,
            layout,
            placeholders,
        } => {
            let layout = deck.layout_by_name(layout)?.clone();
            let index = deck.add_slide(&layout, after_index.and_then(to_index))?;
            for (name, text) in placeholders {
                if !deck.set_text(index, name, &text.0)? {
                    log::warn!("add_slide: layout '{}' has no shape '{}'", layout.name, name);
                }
            }
            Ok(true)
        }
        PatchOp::UpdateChartSeries {
            slide_index,
            chart_index,
            series_name,
            data,
        } => {
            let (Some(slide), Some(chart)) = (to_index(*slide_index), to_index(*chart_index)) else {
                log::warn!(
                    "update_chart_series: no chart {} on slide {}",
                    chart_index,
                    slide_index
                );
                return Ok(false);
            };
            let changed = deck.update_chart(slide, chart, data, series_name.as_deref())?;
            if !changed {
                log::warn!(
                    "update_chart_series: no chart {} on slide {}",
                    chart_index,
                    slide_index
                );
            }
            Ok(changed)
        }
        PatchOp::Unsupported => {
            log::warn!("Skipping unsupported patch operation");
            Ok(false)
        }
    }
}

/// Negative indices address nothing.
fn to_index(value: i64) -> Option<usize> {
    usize::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::TemplateAnalyzer;
    use crate::package::Package;
    use crate::fixture::TemplateBuilder;
    use deck_core::ChartType;
    use serde_json::json;
    use std::io::Cursor;

    fn slide_xml(bytes: &[u8], part: &str) -> String {
        let package = Package::from_bytes(bytes).unwrap();
        String::from_utf8(package.part(part).unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_generate_replaces_template_slides() {
        let template = TemplateBuilder::default().with_slides(3).with_notes(true).build();
        let spec: DeckSpec = serde_json::from_value(json!({
            "title": "Quarterly review",
            "slides": [
                {"layoutName": "Title Slide", "title": "Q3 Review"},
                {"layout": "Title and Content", "title": "Highlights", "bullets": ["Revenue up", "Churn down"]},
                {"layoutName": "Title Only", "title": "Revenue", "chart": {"type": "bar", "title": "By region", "data": [["EU", 4], ["US", 6]]}}
            ]
        }))
        .unwrap();

        let bytes = generate_deck(&template, &spec).unwrap();
        let profile = TemplateAnalyzer::new().analyze(Cursor::new(&bytes)).unwrap();
        assert_eq!(profile.slide_count, 3);
        assert_eq!(profile.layouts.len(), 3);

        let deck = Deck::from_bytes(&bytes).unwrap();
        let parts = deck.slide_parts();
        assert_eq!(parts.len(), 3);

        let first = slide_xml(&bytes, &parts[0]);
        assert!(first.contains("Q3 Review"));
        assert!(!first.contains("Slide 1"));

        let second = slide_xml(&bytes, &parts[1]);
        assert!(second.contains("<a:t>Revenue up</a:t>"));
        assert!(second.contains("<a:t>Churn down</a:t>"));

        let third = slide_xml(&bytes, &parts[2]);
        assert!(third.contains("p:graphicFrame"));

        let package = Package::from_bytes(&bytes).unwrap();
        assert!(!package.contains("ppt/notesSlides/notesSlide1.xml"));
        let chart = ChartData::read(&package.read_xml("ppt/charts/chart1.xml").unwrap());
        assert_eq!(chart.kind, ChartType::Bar);
        assert_eq!(chart.title.as_deref(), Some("By region"));
    }

    #[test]
    fn test_generate_unknown_layout_uses_first() {
        let template = TemplateBuilder::default().build();
        let spec: DeckSpec = serde_json::from_value(json!({
            "slides": [{"layoutName": "Does Not Exist", "title": "Fallback"}]
        }))
        .unwrap();

        let bytes = generate_deck(&template, &spec).unwrap();
        let package = Package::from_bytes(&bytes).unwrap();
        let deck = Deck::from_bytes(&bytes).unwrap();
        let part = &deck.slide_parts()[0];
        let rels = package.relationships(part).unwrap();
        assert_eq!(
            rels.first_of_type("slideLayout").and_then(|r| rels.target_part(r)),
            Some("ppt/slideLayouts/slideLayout1.xml".to_string())
        );
    }

    #[test]
    fn test_generate_empty_spec() {
        let template = TemplateBuilder::default().with_slides(2).build();
        let bytes = generate_deck(&template, &DeckSpec::default()).unwrap();
        let deck = Deck::from_bytes(&bytes).unwrap();
        assert_eq!(deck.slide_count(), 0);
    }

    #[test]
    fn test_patch_ops() {
        let source = TemplateBuilder::default().with_slides(2).build();
        let ops: PatchOps = serde_json::from_value(json!({
            "ops": [
                {"type": "replace_text", "slideIndex": 1, "placeholder": "Title 1", "newText": "Renamed"},
                {"type": "replace_text", "slideIndex": 7, "placeholder": "Title 1", "newText": "Ignored"},
                {"type": "add_slide", "afterIndex": 0, "placeholders": {"Title 1": "Inserted", "Content Placeholder 2": "Body"}},
                {"type": "update_chart_series", "slideIndex": 0, "data": [["A", 1]]},
                {"type": "rotate_everything"}
            ]
        }))
        .unwrap();

        let bytes = patch_deck(&source, &ops).unwrap();
        let deck = Deck::from_bytes(&bytes).unwrap();
        let parts = deck.slide_parts();
        assert_eq!(parts.len(), 3);

        // Inserted after the first slide, from "Title and Content".
        let inserted = slide_xml(&bytes, &parts[1]);
        assert!(inserted.contains("<a:t>Inserted</a:t>"));
        assert!(inserted.contains("<a:t>Body</a:t>"));

        let renamed = slide_xml(&bytes, &parts[2]);
        assert!(renamed.contains("<a:t>Renamed</a:t>"));
        assert!(!renamed.contains("Slide 2"));
    }

    #[test]
    fn test_patch_negative_indices_are_skipped() {
        let source = TemplateBuilder::default().with_slides(1).build();
        let ops: PatchOps = serde_json::from_value(json!({
            "ops": [
                {"type": "replace_text", "slideIndex": -1, "placeholder": "Title 1", "newText": "Ignored"},
                {"type": "update_chart_series", "slideIndex": -2, "chartIndex": -1, "data": [["A", 1]]},
                {"type": "add_slide", "afterIndex": -5, "placeholders": {"Title 1": "Appended"}}
            ]
        }))
        .unwrap();

        let mut deck = Deck::from_bytes(&source).unwrap();
        assert!(!apply_patch(&mut deck, &ops.ops[0]).unwrap());
        assert!(!apply_patch(&mut deck, &ops.ops[1]).unwrap());
        assert!(apply_patch(&mut deck, &ops.ops[2]).unwrap());

        let bytes = deck.to_bytes().unwrap();
        let deck = Deck::from_bytes(&bytes).unwrap();
        let parts = deck.slide_parts();
        assert_eq!(parts.len(), 2);
        let first = slide_xml(&bytes, &parts[0]);
        assert!(first.contains("Slide 1"));
        assert!(!first.contains("Ignored"));
        assert!(slide_xml(&bytes, &parts[1]).contains("<a:t>Appended</a:t>"));
    }

    #[test]
    fn test_patch_updates_generated_chart() {
        let template = TemplateBuilder::default().build();
        let spec: DeckSpec = serde_json::from_value(json!({
            "slides": [{"layoutName": "Title Only", "chart": {"type": "line", "data": [["Jan", 1], ["Feb", 2]]}}]
        }))
        .unwrap();
        let generated = generate_deck(&template, &spec).unwrap();

        let ops: PatchOps = serde_json::from_value(json!({
            "ops": [{"type": "update_chart_series", "slideIndex": 0, "seriesName": "Visits", "data": [["Mar", 9]]}]
        }))
        .unwrap();
        let patched = patch_deck(&generated, &ops).unwrap();

        let package = Package::from_bytes(&patched).unwrap();
        let chart = ChartData::read(&package.read_xml("ppt/charts/chart1.xml").unwrap());
        assert_eq!(chart.kind, ChartType::Line);
        assert_eq!(chart.series_name, "Visits");
        assert_eq!(chart.points.len(), 1);
        assert_eq!(chart.points[0].category, "Mar");
    }
}

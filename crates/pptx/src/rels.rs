//! Package relationship parts (`_rels/*.rels`).

use deck_core::Result;

use crate::xml::{XmlDocument, XmlElement};

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URIs used by presentations.
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
}

/// One `Relationship` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends with the given short type name,
    /// so both transitional and strict URIs match.
    pub fn is_type(&self, short: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(short)
    }
}

/// The relationships of a single source part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    /// Part name the relationships belong to (empty for the package root).
    source: String,
    items: Vec<Relationship>,
}

impl Relationships {
    /// Empty relationship set for a source part.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            items: Vec::new(),
        }
    }

    /// Parse a `.rels` part.
    pub fn parse(source: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(bytes)?;
        let mut rels = Self::new(source);

        for e in doc.root.elements().filter(|e| e.local_name() == "Relationship") {
            let (Some(id), Some(rel_type), Some(target)) =
                (e.attr("Id"), e.attr("Type"), e.attr("Target"))
            else {
                log::warn!("Skipping incomplete relationship in {}", rels.rels_path());
                continue;
            };
            rels.items.push(Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target: target.to_string(),
                external: e.attr("TargetMode") == Some("External"),
            });
        }

        Ok(rels)
    }

    /// Serialize back to a `.rels` part.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.items {
            let mut e = XmlElement::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                e.set_attr("TargetMode", "External");
            }
            root.push(e);
        }
        XmlDocument::new(root).to_bytes()
    }

    /// Path of the `.rels` part for this source.
    pub fn rels_path(&self) -> String {
        rels_path_for(&self.source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First internal relationship of the given short type.
    pub fn first_of_type(&self, short: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| !r.external && r.is_type(short))
    }

    /// Resolved part name of an internal relationship.
    pub fn target_part(&self, rel: &Relationship) -> Option<String> {
        if rel.external {
            return None;
        }
        Some(resolve_target(&self.source, &rel.target))
    }

    /// Resolved part name of the relationship with the given id.
    pub fn target_of(&self, id: &str) -> Option<String> {
        self.get(id).and_then(|r| self.target_part(r))
    }

    /// Add an internal relationship to `target_part` (an absolute part name)
    /// and return its new id.
    pub fn add(&mut self, rel_type: &str, target_part: &str) -> String {
        let id = self.next_id();
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: relative_target(&self.source, target_part),
            external: false,
        });
        id
    }

    /// Remove a relationship by id, returning it.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Smallest `rIdN` above every numeric id in use.
    pub fn next_id(&self) -> String {
        let max = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }
}

/// `.rels` part path for a source part (`ppt/slides/slide1.xml` ->
/// `ppt/slides/_rels/slide1.xml.rels`; package root -> `_rels/.rels`).
pub fn rels_path_for(source: &str) -> String {
    match source.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if source.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", source),
    }
}

/// Directory containing a part, without trailing slash.
fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against its source part.
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    let base = part_dir(source);
    if base.is_empty() {
        normalize(target)
    } else {
        normalize(&format!("{}/{}", base, target))
    }
}

/// Target string that reaches `target_part` from the source part's directory.
pub fn relative_target(source: &str, target_part: &str) -> String {
    let base: Vec<&str> = part_dir(source).split('/').filter(|s| !s.is_empty()).collect();
    let target: Vec<&str> = target_part.split('/').filter(|s| !s.is_empty()).collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = std::iter::repeat("..").take(base.len() - common).collect();
    parts.extend(&target[common..]);
    parts.join("/")
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}

//! In-memory OPC package: the ZIP container and its content types.

use deck_core::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::rels::{rel_type, rels_path_for, Relationships};
use crate::xml::{XmlDocument, XmlElement};

/// Content types part name.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Part used when the package root does not declare its main document.
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Upper bound on the total decompressed size of a package: 256 MiB.
pub const MAX_UNPACKED_BYTES: u64 = 256 * 1024 * 1024;

/// Content types of parts the editor creates.
pub mod content_type {
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
}

/// All parts of a package, held in memory.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Read every entry of a ZIP container.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::open_with_limit(reader, MAX_UNPACKED_BYTES)
    }

    /// Read every entry, failing once the decompressed parts exceed `limit`
    /// bytes in total. Declared entry sizes are not trusted.
    pub fn open_with_limit<R: Read + Seek>(reader: R, limit: u64) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = BTreeMap::new();
        let mut remaining = limit;
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut content = Vec::new();
            let read = (&mut file)
                .take(remaining.saturating_add(1))
                .read_to_end(&mut content)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?
                as u64;
            if read > remaining {
                return Err(Error::InvalidPackage(format!(
                    "decompressed package exceeds {} bytes at '{}'",
                    limit, name
                )));
            }
            remaining -= read;
            parts.insert(name, content);
        }

        if !parts.contains_key(CONTENT_TYPES_PART) {
            return Err(Error::MissingPart(CONTENT_TYPES_PART.to_string()));
        }

        log::debug!("Opened package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Open a package from an in-memory buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::open(std::io::Cursor::new(bytes))
    }

    /// Write the package as a ZIP container, content types first.
    pub fn save<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name.as_str() == CONTENT_TYPES_PART)
            .chain(
                self.parts
                    .iter()
                    .filter(|(name, _)| name.as_str() != CONTENT_TYPES_PART),
            );

        for (name, content) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(content)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.save(std::io::Cursor::new(Vec::new()))?.into_inner())
    }

    pub fn contains(&self, part: &str) -> bool {
        self.parts.contains_key(part)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Raw part bytes.
    pub fn part(&self, part: &str) -> Result<&[u8]> {
        self.parts
            .get(part)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingPart(part.to_string()))
    }

    pub fn put_part(&mut self, part: impl Into<String>, content: Vec<u8>) {
        self.parts.insert(part.into(), content);
    }

    pub fn remove_part(&mut self, part: &str) -> Option<Vec<u8>> {
        self.parts.remove(part)
    }

    /// Parse a part as XML.
    pub fn read_xml(&self, part: &str) -> Result<XmlDocument> {
        XmlDocument::parse(self.part(part)?).map_err(|e| match e {
            Error::XmlError(msg) => Error::XmlError(format!("{}: {}", part, msg)),
            other => other,
        })
    }

    /// Serialize an XML tree into a part.
    pub fn write_xml(&mut self, part: &str, doc: &XmlDocument) -> Result<()> {
        let bytes = doc.to_bytes()?;
        self.put_part(part, bytes);
        Ok(())
    }

    /// Relationships of a part; empty when it has no `.rels` part.
    pub fn relationships(&self, source: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(source);
        match self.parts.get(&rels_path) {
            Some(bytes) => Relationships::parse(source, bytes),
            None => Ok(Relationships::new(source)),
        }
    }

    /// Store relationships, dropping the `.rels` part when empty.
    pub fn write_relationships(&mut self, rels: &Relationships) -> Result<()> {
        if rels.is_empty() {
            self.remove_part(&rels.rels_path());
            return Ok(());
        }
        let bytes = rels.to_bytes()?;
        self.put_part(rels.rels_path(), bytes);
        Ok(())
    }

    /// Main presentation part name.
    pub fn presentation_part(&self) -> Result<String> {
        let root = self.relationships("")?;
        let part = root
            .first_of_type("officeDocument")
            .and_then(|r| root.target_part(r))
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string());

        if !self.contains(&part) {
            return Err(Error::MissingPart(part));
        }
        Ok(part)
    }

    /// Register a content type override for a new part.
    pub fn add_override(&mut self, part: &str, content_type: &str) -> Result<()> {
        let mut doc = self.read_xml(CONTENT_TYPES_PART)?;
        let part_name = format!("/{}", part);

        doc.root.children.retain(|n| match n {
            crate::xml::XmlNode::Element(e) => {
                !(e.local_name() == "Override" && e.attr("PartName") == Some(part_name.as_str()))
            }
            crate::xml::XmlNode::Text(_) => true,
        });
        doc.root.push(
            XmlElement::new("Override")
                .with_attr("PartName", part_name)
                .with_attr("ContentType", content_type),
        );

        self.write_xml(CONTENT_TYPES_PART, &doc)
    }

    /// Drop the content type override of a removed part.
    pub fn remove_override(&mut self, part: &str) -> Result<()> {
        let mut doc = self.read_xml(CONTENT_TYPES_PART)?;
        let part_name = format!("/{}", part);
        let before = doc.root.children.len();

        doc.root.children.retain(|n| match n {
            crate::xml::XmlNode::Element(e) => e.attr("PartName") != Some(part_name.as_str()),
            crate::xml::XmlNode::Text(_) => true,
        });

        if doc.root.children.len() != before {
            self.write_xml(CONTENT_TYPES_PART, &doc)?;
        }
        Ok(())
    }

    /// Content type override registered for a part, if any.
    pub fn override_for(&self, part: &str) -> Result<Option<String>> {
        let doc = self.read_xml(CONTENT_TYPES_PART)?;
        let part_name = format!("/{}", part);
        let found = doc
            .root
            .elements()
            .find(|e| e.local_name() == "Override" && e.attr("PartName") == Some(part_name.as_str()))
            .and_then(|e| e.attr("ContentType"))
            .map(str::to_string);
        Ok(found)
    }

    /// Remove a part together with its relationships and content type.
    pub fn delete_part(&mut self, part: &str) -> Result<()> {
        self.remove_part(part);
        self.remove_part(&rels_path_for(part));
        self.remove_override(part)
    }

    /// Next free numbered part name such as `ppt/slides/slide7.xml`.
    pub fn next_part_name(&self, dir: &str, stem: &str) -> String {
        let prefix = format!("{}/{}", dir, stem);
        let max = self
            .parts
            .keys()
            .filter_map(|name| name.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.strip_suffix(".xml"))
            .filter_map(|n| n.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{}.xml", prefix, max + 1)
    }

    /// Theme part related to a part (a slide master or the presentation).
    pub fn theme_of(&self, source: &str) -> Result<Option<String>> {
        let rels = self.relationships(source)?;
        let found = rels
            .iter()
            .find(|r| r.rel_type == rel_type::THEME || r.is_type("theme"))
            .and_then(|r| rels.target_part(r))
            .filter(|p| self.contains(p));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::TemplateBuilder;

    #[test]
    fn test_open_and_locate_presentation() {
        let bytes = TemplateBuilder::default().build();
        let package = Package::from_bytes(&bytes).unwrap();
        assert_eq!(package.presentation_part().unwrap(), "ppt/presentation.xml");
        assert!(package.contains("ppt/slideMasters/slideMaster1.xml"));
    }

    #[test]
    fn test_rejects_non_zip() {
        let err = Package::from_bytes(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    fn zip_of(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(method);
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_forged_entry_size_is_not_trusted() {
        let types = br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;
        let mut bytes = zip_of(&[(CONTENT_TYPES_PART, types)], CompressionMethod::Stored);

        // Claim an enormous uncompressed size in the central directory.
        let central = bytes
            .windows(4)
            .position(|w| w == [0x50, 0x4B, 0x01, 0x02])
            .unwrap();
        bytes[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        let package = Package::from_bytes(&bytes).unwrap();
        assert_eq!(package.part(CONTENT_TYPES_PART).unwrap(), &types[..]);
    }

    #[test]
    fn test_decompressed_budget() {
        let zeros = vec![0u8; 1024 * 1024];
        let bytes = zip_of(
            &[(CONTENT_TYPES_PART, b"<Types/>"), ("ppt/media/big.bin", &zeros)],
            CompressionMethod::Deflated,
        );
        assert!(bytes.len() < 64 * 1024);

        let err = Package::open_with_limit(std::io::Cursor::new(&bytes), 64 * 1024).unwrap_err();
        assert!(matches!(err, Error::InvalidPackage(_)));
        assert!(err.is_package_error());

        let package = Package::open_with_limit(std::io::Cursor::new(&bytes), 2 * 1024 * 1024).unwrap();
        assert_eq!(package.part("ppt/media/big.bin").unwrap().len(), zeros.len());
    }

    #[test]
    fn test_save_round_trip() {
        let bytes = TemplateBuilder::default().build();
        let mut package = Package::from_bytes(&bytes).unwrap();
        package.put_part("ppt/custom.bin", vec![1, 2, 3]);

        let saved = package.to_bytes().unwrap();
        let reopened = Package::from_bytes(&saved).unwrap();
        assert_eq!(reopened.part("ppt/custom.bin").unwrap(), &[1, 2, 3]);
        assert_eq!(
            reopened.part_names().count(),
            package.part_names().count()
        );

        // Content types lead the archive.
        let mut archive = ZipArchive::new(std::io::Cursor::new(saved)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), CONTENT_TYPES_PART);
    }

    #[test]
    fn test_next_part_name() {
        let bytes = TemplateBuilder::default().with_slides(3).build();
        let package = Package::from_bytes(&bytes).unwrap();
        assert_eq!(package.next_part_name("ppt/slides", "slide"), "ppt/slides/slide4.xml");
        assert_eq!(package.next_part_name("ppt/charts", "chart"), "ppt/charts/chart1.xml");
    }

    #[test]
    fn test_overrides() {
        let bytes = TemplateBuilder::default().build();
        let mut package = Package::from_bytes(&bytes).unwrap();

        package.add_override("ppt/charts/chart1.xml", content_type::CHART).unwrap();
        assert_eq!(
            package.override_for("ppt/charts/chart1.xml").unwrap().as_deref(),
            Some(content_type::CHART)
        );

        package.remove_override("ppt/charts/chart1.xml").unwrap();
        assert_eq!(package.override_for("ppt/charts/chart1.xml").unwrap(), None);
    }

    #[test]
    fn test_theme_of_master() {
        let bytes = TemplateBuilder::default().build();
        let package = Package::from_bytes(&bytes).unwrap();
        assert_eq!(
            package.theme_of("ppt/slideMasters/slideMaster1.xml").unwrap().as_deref(),
            Some("ppt/theme/theme1.xml")
        );
    }
}

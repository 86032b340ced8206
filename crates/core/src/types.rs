//! File format detection for uploaded presentations.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// MIME type of a PPTX package.
pub const PPTX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// The format of a presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary).
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" | "potx" => Some(Self::Pptx),
            "ppt" | "pot" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }

    /// Check that `bytes` hold a PPTX package.
    ///
    /// Magic bytes win over the filename; the extension is only consulted
    /// when the header is unrecognized, to produce a better error.
    pub fn ensure_pptx(bytes: &[u8], filename: Option<&str>) -> Result<()> {
        let detected = Self::from_magic(bytes).or_else(|| {
            filename
                .and_then(|f| f.rsplit_once('.'))
                .and_then(|(_, ext)| Self::from_extension(ext))
        });

        match detected {
            Some(Self::Pptx) if Self::from_magic(bytes).is_some() => Ok(()),
            Some(Self::Pptx) => Err(Error::UnsupportedFormat(
                "file has a .pptx name but is not a ZIP package".to_string(),
            )),
            Some(Self::Ppt) => Err(Error::UnsupportedFormat(
                "legacy .ppt files are not supported, save as .pptx".to_string(),
            )),
            None => Err(Error::UnsupportedFormat(
                "expected a .pptx presentation".to_string(),
            )),
        }
    }
}

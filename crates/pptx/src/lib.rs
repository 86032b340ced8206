//! PPTX (Office Open XML) backend: template analysis, deck generation and
//! deck patching.
//!
//! A .pptx file is a ZIP archive of XML parts linked by relationship parts.
//! The whole package is read into memory, edited as XML trees and written
//! back as a new archive.

pub mod analyze;
pub mod chart;
pub mod deck;
pub mod generate;
pub mod package;
pub mod rels;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use analyze::TemplateAnalyzer;
pub use chart::{ChartData, Frame};
pub use deck::{Deck, LayoutRef};
pub use generate::{apply_patch, generate_deck, patch_deck};
pub use package::Package;

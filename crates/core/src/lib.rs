//! Core domain types for PPTX template analysis, deck generation and
//! deck patching.

pub mod deck;
pub mod error;
pub mod patch;
pub mod profile;
pub mod types;

pub use deck::{ChartPoint, ChartSpec, ChartType, DeckSpec, SlideSpec, TextValue};
pub use error::{Error, Result};
pub use patch::{PatchOp, PatchOps};
pub use profile::{
    FontRole, LayoutInfo, PlaceholderInfo, SlideSize, StyleProfile, ThemeColor, ThemeFont,
};
pub use types::{PresentationFormat, PPTX_MIME_TYPE};

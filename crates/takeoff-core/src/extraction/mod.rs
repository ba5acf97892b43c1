pub mod pdftotext;

use crate::error::TakeoffError;
use serde::{Deserialize, Serialize};

/// One text token on a drawing page. `x`/`y` is the top-left corner in
/// drawing-native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedWord {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PositionedWord {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Words extracted from a single drawing page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageWords {
    pub page_number: usize,
    pub page_width: f64,
    pub page_height: f64,
    pub words: Vec<PositionedWord>,
}

/// Trait for drawing text extraction backends.
pub trait WordExtractor: Send + Sync {
    /// Extract the positioned words of one page (1-based) from document bytes.
    fn extract_words(&self, pdf_bytes: &[u8], page: usize) -> Result<PageWords, TakeoffError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

//! Text block source: turns a PDF into an ordered list of text blocks.
//!
//! A block is a run of text lines that sit close together on the page, in
//! content-stream order. Lines are placed by following the text positioning
//! operators; a vertical gap of more than [`BLOCK_GAP`] line heights starts a
//! new block.

use std::collections::BTreeMap;
use std::path::Path;

use itertools::Itertools;
use lopdf::{Document, Encoding, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;

/// Vertical distance, in line heights, that separates two blocks.
pub const BLOCK_GAP: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
}

impl TextBlock {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        TextBlock {
            page,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pages {
    First,
    All,
}

pub trait TextBlockSource: Sync {
    /// Blocks of the requested pages, in scan order.
    fn blocks(&self, path: &Path, pages: Pages) -> Result<Vec<TextBlock>, ExtractError>;
}

/// Block source backed by `lopdf` content-stream decoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfSource;

impl TextBlockSource for LopdfSource {
    fn blocks(&self, path: &Path, pages: Pages) -> Result<Vec<TextBlock>, ExtractError> {
        let pdf_err = |source| ExtractError::Pdf {
            path: path.to_path_buf(),
            source,
        };

        let doc = Document::load(path).map_err(pdf_err)?;
        let mut page_ids: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        if pages == Pages::First {
            page_ids.truncate(1);
        }

        let mut blocks = Vec::new();
        for (page, page_id) in page_ids {
            for block in page_blocks(&doc, page_id).map_err(pdf_err)? {
                debug!(file = %path.display(), page, block = %block, "text block");
                blocks.push(TextBlock::new(page, block));
            }
        }
        Ok(blocks)
    }
}

/// Text blocks of one page.
fn page_blocks(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<String>> {
    // fonts whose encoding lopdf cannot read fall back to raw bytes
    let encodings: BTreeMap<Vec<u8>, Encoding> = doc
        .get_page_fonts(page_id)?
        .into_iter()
        .filter_map(|(name, font)| font.get_font_encoding(doc).ok().map(|e| (name, e)))
        .collect();
    let content = doc.get_and_decode_page_content(page_id)?;

    let mut layout = Layout::default();
    let mut encoding = None;
    for op in &content.operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "BT" => layout.begin_text(),
            "Tf" => {
                encoding = operands.first().and_then(|o| o.as_name().ok()).and_then(|n| encodings.get(n));
                if let Some(size) = operands.get(1).and_then(number) {
                    layout.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    layout.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let Some(ty) = operands.get(1).and_then(number) {
                    if op.operator == "TD" {
                        layout.leading = -ty;
                    }
                    layout.move_line(ty);
                }
            }
            "Tm" => {
                if let [_, _, _, d, _, f] = operands {
                    layout.set_matrix(number(d).unwrap_or(1.0), number(f).unwrap_or(0.0));
                }
            }
            "T*" => layout.next_line(),
            "Tj" | "TJ" => layout.show(&decode_operands(encoding, operands)),
            "'" => {
                layout.next_line();
                layout.show(&decode_operands(encoding, operands));
            }
            "\"" => {
                layout.next_line();
                layout.show(&decode_operands(encoding, operands.get(2..).unwrap_or_default()));
            }
            _ => {}
        }
    }
    Ok(layout.finish())
}

fn number(o: &Object) -> Option<f32> {
    o.as_float().ok()
}

/// Text of `Tj`/`TJ` operands. Kerning wider than a tenth of an em reads as
/// a space.
fn decode_operands(encoding: Option<&Encoding>, operands: &[Object]) -> String {
    let mut text = String::new();
    for operand in operands {
        match operand {
            Object::String(bytes, _) => {
                let decoded = encoding.and_then(|e| Document::decode_text(e, bytes).ok());
                text.push_str(&decoded.unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned()));
            }
            Object::Array(items) => text.push_str(&decode_operands(encoding, items)),
            Object::Integer(_) | Object::Real(_) => {
                if number(operand).is_some_and(|n| n < -100.0) {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
    text
}

/// Groups shown text into lines and blocks by baseline position.
#[derive(Debug)]
struct Layout {
    blocks: Vec<String>,
    current: String,
    /// Baseline of the current text line, user space.
    line_y: f32,
    /// Baseline of the last shown text in the current block.
    last_y: Option<f32>,
    /// Vertical scale of the text matrix.
    scale: f32,
    font_size: f32,
    leading: f32,
    /// Set when the position moved since the last shown text.
    moved: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            blocks: Vec::new(),
            current: String::new(),
            line_y: 0.0,
            last_y: None,
            scale: 1.0,
            font_size: 12.0,
            leading: 0.0,
            moved: false,
        }
    }
}

impl Layout {
    /// `BT` resets the text matrix to identity.
    fn begin_text(&mut self) {
        self.line_y = 0.0;
        self.scale = 1.0;
        self.moved = true;
    }

    fn move_line(&mut self, ty: f32) {
        self.line_y += ty * self.scale;
        self.moved = true;
    }

    fn next_line(&mut self) {
        self.move_line(-self.leading);
    }

    fn set_matrix(&mut self, d: f32, f: f32) {
        self.scale = if d == 0.0 { 1.0 } else { d.abs() };
        self.line_y = f;
        self.moved = true;
    }

    fn line_height(&self) -> f32 {
        (self.font_size * self.scale).abs().max(1.0)
    }

    fn show(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(y) = self.last_y {
            let gap = (y - self.line_y).abs();
            if gap > BLOCK_GAP * self.line_height() {
                self.end_block();
            } else if gap > 0.25 * self.line_height() {
                self.current.push('\n');
            } else if self.moved && !self.current.ends_with(char::is_whitespace) {
                self.current.push(' ');
            }
        }
        self.current.push_str(text);
        self.last_y = Some(self.line_y);
        self.moved = false;
    }

    fn end_block(&mut self) {
        let block = self
            .current
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .join("\n");
        if !block.is_empty() {
            self.blocks.push(block);
        }
        self.current.clear();
        self.last_y = None;
    }

    fn finish(mut self) -> Vec<String> {
        self.end_block();
        self.blocks
    }
}

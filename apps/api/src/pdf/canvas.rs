//! Per-page drawing list produced by layout and consumed by the writer.
//!
//! Coordinates are PDF user space in points, origin bottom-left.

use crate::pdf::font_metrics::FontFace;

pub const PAGE_WIDTH_PT: f32 = 612.0;
pub const PAGE_HEIGHT_PT: f32 = 792.0;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        face: FontFace,
        size: f32,
        x: f32,
        y: f32,
        text: String,
    },
    /// Stroked line, `gray` in 0.0 (black) ..= 1.0 (white).
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        gray: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gray: f32,
    },
}

#[derive(Debug, Default, Clone)]
pub struct PageContent {
    ops: Vec<DrawOp>,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `text` with its baseline starting at (`x`, `y`).
    pub fn text(&mut self, face: FontFace, size: f32, x: f32, y: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            face,
            size,
            x,
            y,
            text: text.to_string(),
        });
    }

    /// Draws `text` so that it ends at `right_x`.
    pub fn text_right(&mut self, face: FontFace, size: f32, right_x: f32, y: f32, text: &str) {
        let width = face.metrics().width_pt(text, size);
        self.text(face, size, right_x - width, y, text);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, gray: f32) {
        self.ops.push(DrawOp::Line {
            from: (x1, y1),
            to: (x2, y2),
            width,
            gray,
        });
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            gray,
        });
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text runs in drawing order, paired with their baselines.
    #[cfg(test)]
    pub fn text_runs(&self) -> impl Iterator<Item = (&str, f32)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, y, .. } => Some((text.as_str(), *y)),
            _ => None,
        })
    }
}

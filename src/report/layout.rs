//! Cursor-based page layout in millimetres, top-left origin.
//!
//! Mirrors the usual cell/line model of report writers: `cell` draws a
//! fixed-width single-line cell and advances the cursor right, `ln` moves to
//! the next line at the left margin, `multi_cell` wraps text inside a column.
//! A cell that would cross the bottom break line opens a new page first.

use serde::Serialize;

/// Points → millimetres.
pub const PT_TO_MM: f32 = 0.352_778;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.55;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    /// Distance from the bottom edge at which content overflows.
    pub break_margin: f32,
}

impl PageGeometry {
    /// A4 portrait, 10 mm margins, 20 mm bottom break zone.
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin_left: 10.0,
        margin_top: 10.0,
        margin_right: 10.0,
        break_margin: 20.0,
    };

    fn break_line(&self) -> f32 {
        self.height - self.break_margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const LINK_BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };
}

/// One positioned piece of text. `y` is the top of its cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: String,
    pub style: FontStyle,
    pub size: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    geometry: PageGeometry,
    pages: Vec<Page>,
    x: f32,
    y: f32,
    style: FontStyle,
    size: f32,
    color: Rgb,
}

impl Layout {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            x: geometry.margin_left,
            y: geometry.margin_top,
            style: FontStyle::Regular,
            size: 11.0,
            color: Rgb::BLACK,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// All runs across pages, in drawing order.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.pages.iter().flat_map(|p| p.runs.iter())
    }

    pub fn set_font(&mut self, style: FontStyle, size: f32) {
        self.style = style;
        self.size = size;
    }

    pub fn set_text_color(&mut self, color: Rgb) {
        self.color = color;
    }

    pub fn xy(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn set_xy(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Move to `y`; negative values count up from the bottom edge.
    /// The x cursor returns to the left margin.
    pub fn set_y(&mut self, y: f32) {
        self.x = self.geometry.margin_left;
        self.y = if y < 0.0 { self.geometry.height + y } else { y };
    }

    /// Width left between the cursor and the right margin.
    pub fn remaining_width(&self) -> f32 {
        (self.geometry.width - self.geometry.margin_right - self.x).max(0.0)
    }

    /// Single-line cell; `width` 0 extends to the right margin.
    pub fn cell(&mut self, width: f32, height: f32, text: &str) {
        if self.y + height > self.geometry.break_line() {
            self.add_page();
        }
        self.place(width, height, text);
    }

    /// Line break: left margin, `height` lower.
    pub fn ln(&mut self, height: f32) {
        self.x = self.geometry.margin_left;
        self.y += height;
        if self.y > self.geometry.break_line() {
            self.add_page();
        }
    }

    /// Wrapped text in a column of `width` starting at the cursor's x.
    ///
    /// Continuation lines keep the column's x, also across page breaks.
    /// Leaves the cursor at the left margin just below the last line.
    pub fn multi_cell(&mut self, width: f32, height: f32, text: &str) {
        let column_x = self.x;
        let width = if width <= 0.0 { self.remaining_width() } else { width };
        for line in wrap_text(text, self.max_chars(width)) {
            if self.y + height > self.geometry.break_line() {
                self.add_page();
            }
            self.x = column_x;
            self.place(width, height, &line);
            self.y += height;
        }
        self.x = self.geometry.margin_left;
    }

    /// Draw at the cursor without overflow checks (footers).
    pub fn fixed_cell(&mut self, width: f32, height: f32, text: &str) {
        self.place(width, height, text);
    }

    /// Start a new page; the cursor moves to the top margin, x is kept.
    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.geometry.margin_top;
    }

    fn place(&mut self, width: f32, height: f32, text: &str) {
        let width = if width <= 0.0 { self.remaining_width() } else { width };
        if !text.is_empty() {
            let run = TextRun {
                x: self.x,
                y: self.y,
                width,
                height,
                text: text.to_string(),
                style: self.style,
                size: self.size,
                color: self.color,
            };
            if let Some(page) = self.pages.last_mut() {
                page.runs.push(run);
            }
        }
        self.x += width;
    }

    fn max_chars(&self, width: f32) -> usize {
        let glyph = self.size * PT_TO_MM * AVG_GLYPH_EM;
        ((width / glyph).floor() as usize).max(1)
    }
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }
        if current_len > 0 {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

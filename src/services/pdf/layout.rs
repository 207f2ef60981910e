//! Backend-independent page layout.
//!
//! Documents are built from [`Block`]s that know their own height. A
//! [`Paginator`] stacks them top to bottom and starts a new page whenever the
//! next block would cross the printable area. All coordinates are millimetres
//! from the top-left corner of the page; text `y` is the top of the line box.

pub const PT_TO_MM: f32 = 0.352_778;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const TEXT: Rgb = Rgb(31, 41, 55);
    pub const MUTED: Rgb = Rgb(107, 114, 128);
    pub const BORDER: Rgb = Rgb(209, 213, 219);
    pub const PANEL: Rgb = Rgb(243, 244, 246);
    pub const BRAND: Rgb = Rgb(37, 99, 235);
    pub const BRAND_LIGHT: Rgb = Rgb(219, 234, 254);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };
    pub const LETTER_LANDSCAPE: PageSize = PageSize {
        width: 279.4,
        height: 215.9,
    };
}

/// Handle to an image registered with the document's asset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageId(pub usize);

/// A decoded image and its pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub id: ImageId,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageRef {
    /// Largest size with the image's aspect ratio that fits the box.
    pub fn fit(&self, max_w: f32, max_h: f32) -> (f32, f32) {
        if self.width_px == 0 || self.height_px == 0 {
            return (0.0, 0.0);
        }
        let ratio = self.width_px as f32 / self.height_px as f32;
        if max_w / max_h > ratio {
            (max_h * ratio, max_h)
        } else {
            (max_w, max_w / ratio)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: Weight,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        /// Stroke width in points
        width: f32,
        color: Rgb,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: ImageId,
    },
}

impl DrawOp {
    pub fn text(x: f32, y: f32, size: f32, weight: Weight, color: Rgb, text: impl Into<String>) -> Self {
        DrawOp::Text {
            x,
            y,
            size,
            weight,
            color,
            text: text.into(),
        }
    }

    /// Lowest point the op reaches.
    pub fn bottom(&self) -> f32 {
        match self {
            DrawOp::Text { y, size, .. } => y + line_height(*size),
            DrawOp::Rect { y, h, .. } | DrawOp::Image { y, h, .. } => y + h,
            DrawOp::Line { y1, y2, .. } => y1.max(*y2),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// Vertical space of one line of text at `size` points.
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.3
}

/// Approximate Helvetica advance width, in em.
fn char_em(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' | 'í' | 'ì' => 0.25,
        ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '/' => 0.33,
        'm' | 'w' | 'M' | 'W' | '@' => 0.85,
        c if c.is_ascii_digit() => 0.56,
        c if c.is_uppercase() => 0.68,
        _ => 0.53,
    }
}

/// Estimated rendered width in millimetres.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_em).sum::<f32>() * size * PT_TO_MM
}

/// Greedy word wrap. Explicit newlines are kept; words wider than the line are split.
pub fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width(&current, size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        lines.push(current);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Cut `text` so it fits `max_width`, marking the cut with `...`.
pub fn truncate_to_width(text: &str, size: f32, max_width: f32) -> String {
    if text_width(text, size) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if text_width(&out, size) + text_width("...", size) > max_width {
            out.pop();
            break;
        }
    }
    format!("{}...", out.trim_end())
}

/// Where a block is being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// A unit of layout that is never split across pages.
pub trait Block {
    /// Height the block needs at the given content width.
    fn height(&self, width: f32) -> f32;

    /// Emit draw ops with the block's top-left corner at the frame origin.
    fn draw(&self, frame: Frame, ops: &mut Vec<DrawOp>);
}

/// Stacks blocks down the page, breaking pages as needed.
pub struct Paginator {
    size: PageSize,
    margin: f32,
    footer_reserve: f32,
    cursor: f32,
    fresh: bool,
    pages: Vec<Page>,
    running_header: Option<Box<dyn Block + Send>>,
}

impl Paginator {
    pub fn new(size: PageSize, margin: f32, footer_reserve: f32) -> Self {
        Self {
            size,
            margin,
            footer_reserve,
            cursor: margin,
            fresh: true,
            pages: vec![Page::default()],
            running_header: None,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.size.width - 2.0 * self.margin
    }

    /// Lowest y a block may reach.
    pub fn bottom(&self) -> f32 {
        self.size.height - self.margin - self.footer_reserve
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Block repeated at the top of every page started by a break.
    pub fn set_running_header(&mut self, header: Box<dyn Block + Send>) {
        self.running_header = Some(header);
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = self.margin;

        if let Some(header) = self.running_header.take() {
            self.draw_block(header.as_ref());
            self.running_header = Some(header);
        }
        self.fresh = true;
    }

    /// Break the page unless `height` fits below the cursor. Never breaks a
    /// page that has nothing placed on it yet. Returns whether a break happened.
    pub fn ensure(&mut self, height: f32) -> bool {
        if !self.fresh && self.cursor + height > self.bottom() {
            self.new_page();
            return true;
        }
        false
    }

    pub fn place(&mut self, block: &dyn Block) {
        let height = block.height(self.content_width());
        self.ensure(height);
        self.draw_block(block);
        self.fresh = false;
    }

    /// Vertical gap; clamped to the printable area and never breaks a page.
    pub fn advance(&mut self, mm: f32) {
        self.cursor = (self.cursor + mm).min(self.bottom());
    }

    fn draw_block(&mut self, block: &dyn Block) {
        let width = self.content_width();
        let frame = Frame {
            x: self.margin,
            y: self.cursor,
            width,
        };
        if let Some(page) = self.pages.last_mut() {
            block.draw(frame, &mut page.ops);
        }
        self.cursor += block.height(width);
    }

    /// Finish layout, letting `footer` decorate each page with its 1-based
    /// number and the page total.
    pub fn finish_with<F>(self, footer: F) -> Vec<Page>
    where
        F: Fn(&mut Page, usize, usize),
    {
        let total = self.pages.len();
        let mut pages = self.pages;
        for (index, page) in pages.iter_mut().enumerate() {
            footer(page, index + 1, total);
        }
        pages
    }
}

/// Polygon outline of a rounded rectangle, clockwise from the top-left edge.
pub fn rounded_rect_points(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Vec<(f32, f32)> {
    let r = radius.clamp(0.0, w.min(h) / 2.0);
    if r <= f32::EPSILON {
        return vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
    }

    const STEPS: usize = 4;
    let corners = [
        (x + w - r, y + r, -90.0_f32),
        (x + w - r, y + h - r, 0.0),
        (x + r, y + h - r, 90.0),
        (x + r, y + r, 180.0),
    ];

    let mut points = Vec::with_capacity(corners.len() * (STEPS + 1));
    for (cx, cy, start) in corners {
        for step in 0..=STEPS {
            let angle = (start + 90.0 * step as f32 / STEPS as f32).to_radians();
            points.push((cx + r * angle.cos(), cy + r * angle.sin()));
        }
    }
    points
}

/// A single line of text.
pub struct TextLine {
    pub text: String,
    pub size: f32,
    pub weight: Weight,
    pub color: Rgb,
}

impl Block for TextLine {
    fn height(&self, _width: f32) -> f32 {
        line_height(self.size)
    }

    fn draw(&self, frame: Frame, ops: &mut Vec<DrawOp>) {
        ops.push(DrawOp::text(
            frame.x,
            frame.y,
            self.size,
            self.weight,
            self.color,
            truncate_to_width(&self.text, self.size, frame.width),
        ));
    }
}

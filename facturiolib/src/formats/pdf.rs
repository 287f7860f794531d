//! Разметка (HTML) → PDF формата A4 на встроенных шрифтах.
//!
//! Разметку разбирает `scraper` (html5ever): кавычки в атрибутах, сущности и
//! «сырое» содержимое `script`/`style` обрабатываются по правилам HTML.
//! Блочные теги (`p`, `div`, `h1`..`h6`, `tr`, `li`, `br`, `hr`, ...) дают
//! новые строки, заголовки — жирный крупный шрифт, `title` становится
//! заголовком документа. Длинные строки переносятся по словам, переполненная
//! страница продолжается на следующей. Картинки `<img src>` ищутся
//! относительно `base_dir` и встраиваются; если файла нет, печатается `alt`.

use crate::error::{FacturioError, Result};
use image::{DynamicImage, GenericImageView};
use log::{debug, warn};
use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument};
use scraper::{ElementRef, Html};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;
const BODY_SIZE: f32 = 11.0;
/// Средняя ширина глифа Helvetica в долях кегля.
const GLYPH_WIDTH: f32 = 0.5;
const LINE_SPACING: f32 = 1.35;
/// Пиксели разметки считаются CSS-пикселями.
const CSS_DPI: f32 = 96.0;
const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextKind {
    Heading(u8),
    Body,
}

impl TextKind {
    fn font_size(self) -> f32 {
        match self {
            TextKind::Heading(1) => 20.0,
            TextKind::Heading(2) => 16.0,
            TextKind::Heading(3) => 14.0,
            TextKind::Heading(_) => 12.0,
            TextKind::Body => BODY_SIZE,
        }
    }

    fn bold(self) -> bool {
        matches!(self, TextKind::Heading(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
    /// Атрибут `width` в пикселях, если задан.
    pub width_px: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text { kind: TextKind, text: String },
    Rule,
    Image(ImageRef),
}

#[derive(Debug, Default)]
pub struct Markup {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

/// Содержимое страницы до размещения: картинки уже загружены и имеют размер.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Text { kind: TextKind, text: String },
    Gap,
    Picture { id: usize, width_mm: f32, height_mm: f32 },
}

/// Строка, уже размещённая на странице. `y_mm` отсчитывается от низа листа.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub size: f32,
    pub bold: bool,
    pub x_mm: f32,
    pub y_mm: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Line(PlacedLine),
    /// `y_mm` — нижний край картинки.
    Picture {
        id: usize,
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
}

pub type Page = Vec<Placed>;

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "tr", "li", "ul", "ol", "table", "thead", "tbody", "tfoot", "section", "header",
    "footer", "article", "blockquote", "body", "address", "h1", "h2", "h3", "h4", "h5", "h6",
];
const SKIP_TAGS: &[&str] = &["style", "script", "noscript", "template"];

struct Parser {
    blocks: Vec<Block>,
    current: String,
    kind: TextKind,
}

impl Parser {
    /// Пробелы схлопываются; соседние текстовые узлы склеиваются без пробела.
    fn push_text(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.space();
        }
        let mut words = text.split_whitespace().peekable();
        while let Some(word) = words.next() {
            self.current.push_str(word);
            if words.peek().is_some() {
                self.current.push(' ');
            }
        }
        if text.ends_with(char::is_whitespace) {
            self.space();
        }
    }

    fn space(&mut self) {
        if !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
    }

    fn flush(&mut self) {
        let text = self.current.trim().to_string();
        self.current.clear();
        if !text.is_empty() {
            self.blocks.push(Block::Text {
                kind: self.kind,
                text,
            });
        }
    }

    fn walk(&mut self, el: ElementRef<'_>, title: &mut Option<String>) {
        let name = el.value().name();
        if SKIP_TAGS.contains(&name) {
            return;
        }

        match name {
            "title" => {
                let text = el.text().collect::<Vec<_>>().join(" ");
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if title.is_none() && !text.is_empty() {
                    *title = Some(text);
                }
                return;
            }
            "br" => {
                self.flush();
                return;
            }
            "hr" => {
                self.flush();
                self.blocks.push(Block::Rule);
                return;
            }
            "img" => {
                let attrs = el.value();
                let alt = attrs
                    .attr("alt")
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string);
                match attrs.attr("src").map(str::trim).filter(|s| !s.is_empty()) {
                    Some(src) => {
                        self.flush();
                        self.blocks.push(Block::Image(ImageRef {
                            src: src.to_string(),
                            alt,
                            width_px: attrs
                                .attr("width")
                                .and_then(|w| w.trim().trim_end_matches("px").parse().ok()),
                        }));
                    }
                    None => {
                        if let Some(alt) = alt {
                            self.push_text(&alt);
                        }
                    }
                }
                return;
            }
            "td" | "th" => {
                if !self.current.trim().is_empty() {
                    self.current = format!("{}   ", self.current.trim_end());
                }
            }
            _ => {}
        }

        let is_block = BLOCK_TAGS.contains(&name);
        let outer = self.kind;
        if is_block {
            self.flush();
            if let Some(level) = heading_level(name) {
                self.kind = TextKind::Heading(level);
            } else if name == "li" {
                self.current.push_str("- ");
            }
        }

        for child in el.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                self.walk(child_el, title);
            } else if let Some(text) = child.value().as_text() {
                self.push_text(text);
            }
        }

        if is_block {
            self.flush();
            self.kind = outer;
        }
    }
}

fn heading_level(name: &str) -> Option<u8> {
    name.strip_prefix('h')
        .and_then(|l| l.parse::<u8>().ok())
        .filter(|l| (1..=6).contains(l))
}

/// Разбирает разметку на блоки. html5ever восстанавливает любую разметку,
/// замечания парсера идут в журнал.
pub fn parse_markup(markup: &str) -> Markup {
    let html = Html::parse_document(markup);
    for e in &html.errors {
        debug!("markup: {e}");
    }

    let mut p = Parser {
        blocks: Vec::new(),
        current: String::new(),
        kind: TextKind::Body,
    };
    let mut title = None;
    p.walk(html.root_element(), &mut title);
    p.flush();

    Markup {
        title,
        blocks: p.blocks,
    }
}

/// Перенос по словам на `width` символов; слишком длинное слово режется.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if line.is_empty() { 0 } else { line.chars().count() + 1 };
        if needed + word.chars().count() > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Размер картинки на листе: CSS-пиксели (или атрибут `width`), не шире и
/// не выше рабочей области страницы, с сохранением пропорций.
pub fn fit_image(width_px: u32, height_px: u32, width_attr: Option<f32>) -> (f32, f32) {
    let ratio = height_px as f32 / width_px.max(1) as f32;
    let natural = width_attr.unwrap_or(width_px as f32) * MM_PER_INCH / CSS_DPI;
    let max_w = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let max_h = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;

    let mut w = natural.min(max_w);
    if w * ratio > max_h {
        w = max_h / ratio;
    }
    (w, w * ratio)
}

/// Раскладывает поток по страницам A4. Пустой документ — одна пустая страница.
pub fn layout(flow: &[Flow]) -> Vec<Page> {
    let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let mut pages: Vec<Page> = vec![Vec::new()];
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    for item in flow {
        match item {
            Flow::Gap => y -= BODY_SIZE * PT_TO_MM * LINE_SPACING,
            Flow::Text { kind, text } => {
                let size = kind.font_size();
                let line_height = size * PT_TO_MM * LINE_SPACING;
                let per_line = (usable / (size * PT_TO_MM * GLYPH_WIDTH)) as usize;
                for line in wrap(text, per_line) {
                    place(&mut pages, &mut y, line_height, |y_mm| {
                        Placed::Line(PlacedLine {
                            text: line,
                            size,
                            bold: kind.bold(),
                            x_mm: MARGIN_MM,
                            y_mm,
                        })
                    });
                }
                y -= line_height * 0.4;
            }
            Flow::Picture {
                id,
                width_mm,
                height_mm,
            } => {
                place(&mut pages, &mut y, *height_mm, |y_mm| Placed::Picture {
                    id: *id,
                    x_mm: MARGIN_MM,
                    y_mm,
                    width_mm: *width_mm,
                    height_mm: *height_mm,
                });
                y -= BODY_SIZE * PT_TO_MM * 0.4;
            }
        }
    }

    pages
}

/// Элемент высотой `height` под текущей позицией; не влезает — новая страница.
fn place(pages: &mut Vec<Page>, y: &mut f32, height: f32, item: impl FnOnce(f32) -> Placed) {
    let top = PAGE_HEIGHT_MM - MARGIN_MM;
    if *y - height < MARGIN_MM && *y < top {
        pages.push(Vec::new());
        *y = top;
    }
    *y -= height;
    if let Some(page) = pages.last_mut() {
        page.push(item(*y));
    }
}

/// Локальная картинка или `None` (с предупреждением), если её нельзя использовать.
fn load_image(base_dir: &Path, src: &str) -> Option<DynamicImage> {
    if src.contains("://") || src.starts_with("data:") {
        debug!("skipping non-local asset {src}");
        return None;
    }
    let path = base_dir.join(src);
    match image::open(&path) {
        Ok(img) => {
            debug!("embedding {}", path.display());
            Some(DynamicImage::ImageRgb8(img.to_rgb8()))
        }
        Err(e) => {
            warn!("asset {} unusable ({e}), rendering alt text", path.display());
            None
        }
    }
}

pub struct Pdf;

impl crate::traits::ExportFormat for Pdf {
    fn export<W: Write>(w: W, markup: &str, base_dir: &Path) -> Result<()> {
        let parsed = parse_markup(markup);

        let mut images: Vec<DynamicImage> = Vec::new();
        let mut flow = Vec::with_capacity(parsed.blocks.len());
        for block in parsed.blocks {
            match block {
                Block::Text { kind, text } => flow.push(Flow::Text { kind, text }),
                Block::Rule => flow.push(Flow::Gap),
                Block::Image(img) => match load_image(base_dir, &img.src) {
                    Some(picture) => {
                        let (width_px, height_px) = picture.dimensions();
                        let (width_mm, height_mm) = fit_image(width_px, height_px, img.width_px);
                        flow.push(Flow::Picture {
                            id: images.len(),
                            width_mm,
                            height_mm,
                        });
                        images.push(picture);
                    }
                    None => {
                        if let Some(alt) = img.alt {
                            flow.push(Flow::Text {
                                kind: TextKind::Body,
                                text: alt,
                            });
                        }
                    }
                },
            }
        }

        let pages = layout(&flow);
        let title = parsed.title.unwrap_or_else(|| "Invoice".into());
        let (doc, first_page, first_layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;

        for (i, items) in pages.iter().enumerate() {
            let layer = if i == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                doc.get_page(page).get_layer(layer)
            };
            for item in items {
                match item {
                    Placed::Line(line) => {
                        let font: &IndirectFontRef = if line.bold { &bold } else { &regular };
                        layer.use_text(line.text.as_str(), line.size, Mm(line.x_mm), Mm(line.y_mm), font);
                    }
                    Placed::Picture {
                        id,
                        x_mm,
                        y_mm,
                        width_mm,
                        ..
                    } => {
                        let Some(picture) = images.get(*id) else {
                            continue;
                        };
                        let dpi = picture.width() as f32 * MM_PER_INCH / width_mm;
                        Image::from_dynamic_image(picture).add_to_layer(
                            layer.clone(),
                            ImageTransform {
                                translate_x: Some(Mm(*x_mm)),
                                translate_y: Some(Mm(*y_mm)),
                                dpi: Some(dpi),
                                ..Default::default()
                            },
                        );
                    }
                }
            }
        }

        doc.save(&mut BufWriter::new(w)).map_err(pdf_err)
    }
}

fn pdf_err(e: impl std::fmt::Display) -> FacturioError {
    FacturioError::export("", e)
}

//! Draws laid-out pages into a PDF with printpdf.

use printpdf::image_crate::DynamicImage;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon,
};

use super::assets::ImageStore;
use super::layout::{DrawOp, Page, PageSize, Rgb, Weight, rounded_rect_points};
use crate::error::{AppError, AppResult};

/// Nominal DPI images are placed at before scaling to their target box.
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        rgb.0 as f32 / 255.0,
        rgb.1 as f32 / 255.0,
        rgb.2 as f32 / 255.0,
        None,
    ))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn pick(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

struct Canvas<'a> {
    layer: PdfLayerReference,
    page_height: f32,
    fonts: &'a Fonts,
    images: &'a ImageStore,
}

impl Canvas<'_> {
    /// Top-down layout y to PDF's bottom-up y.
    fn flip(&self, y: f32) -> Mm {
        Mm(self.page_height - y)
    }

    fn point(&self, x: f32, y: f32) -> Point {
        Point::new(Mm(x), self.flip(y))
    }

    fn draw(&self, op: &DrawOp) {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                weight,
                color: rgb,
                text,
            } => {
                // use_text positions the baseline; layout y is the top of the line box.
                let baseline = y + size * super::layout::PT_TO_MM * 0.95;
                self.layer.set_fill_color(color(*rgb));
                self.layer
                    .use_text(text.clone(), *size, Mm(*x), self.flip(baseline), self.fonts.pick(*weight));
            }
            DrawOp::Rect {
                x,
                y,
                w,
                h,
                radius,
                fill,
                stroke,
            } => {
                let mode = match (fill, stroke) {
                    (Some(_), Some(_)) => PaintMode::FillStroke,
                    (Some(_), None) => PaintMode::Fill,
                    (None, Some(_)) => PaintMode::Stroke,
                    (None, None) => return,
                };
                if let Some(fill) = fill {
                    self.layer.set_fill_color(color(*fill));
                }
                if let Some(stroke) = stroke {
                    self.layer.set_outline_color(color(*stroke));
                    self.layer.set_outline_thickness(0.6);
                }
                let ring = rounded_rect_points(*x, *y, *w, *h, *radius)
                    .into_iter()
                    .map(|(px, py)| (self.point(px, py), false))
                    .collect();
                self.layer.add_polygon(Polygon {
                    rings: vec![ring],
                    mode,
                    winding_order: WindingOrder::NonZero,
                });
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color: rgb,
            } => {
                self.layer.set_outline_color(color(*rgb));
                self.layer.set_outline_thickness(*width);
                self.layer.add_line(Line {
                    points: vec![(self.point(*x1, *y1), false), (self.point(*x2, *y2), false)],
                    is_closed: false,
                });
            }
            DrawOp::Image { x, y, w, h, image } => {
                let Some(pixels) = self.images.get(*image) else {
                    return;
                };
                if pixels.width() == 0 || pixels.height() == 0 {
                    return;
                }
                let natural_w = pixels.width() as f32 / IMAGE_DPI * MM_PER_INCH;
                let natural_h = pixels.height() as f32 / IMAGE_DPI * MM_PER_INCH;

                Image::from_dynamic_image(&DynamicImage::ImageRgb8(pixels.clone())).add_to_layer(
                    self.layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(*x)),
                        translate_y: Some(self.flip(y + h)),
                        scale_x: Some(w / natural_w),
                        scale_y: Some(h / natural_h),
                        dpi: Some(IMAGE_DPI),
                        ..Default::default()
                    },
                );
            }
        }
    }
}

/// Render pages into a PDF byte stream.
pub fn render_pdf(title: &str, size: PageSize, pages: &[Page], images: &ImageStore) -> AppResult<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(size.width), Mm(size.height), "Layer 1");

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::Render(format!("Failed to load font: {}", e)))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::Render(format!("Failed to load font: {}", e)))?,
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(Mm(size.width), Mm(size.height), "Layer 1");
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        let canvas = Canvas {
            layer,
            page_height: size.height,
            fonts: &fonts,
            images,
        };
        for op in &page.ops {
            canvas.draw(op);
        }
    }

    doc.save_to_bytes()
        .map_err(|e| AppError::Render(format!("Failed to write PDF: {}", e)))
}

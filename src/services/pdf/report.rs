//! Date-range service report (US letter, landscape).

use chrono::NaiveDate;

use super::layout::{
    Block, DrawOp, Frame, Page, PageSize, Paginator, Rgb, Weight, text_width, truncate_to_width,
};
use super::order::status_color;

pub const PAGE: PageSize = PageSize::LETTER_LANDSCAPE;
const MARGIN: f32 = 12.0;
const FOOTER_RESERVE: f32 = 8.0;
pub const ROW_HEIGHT: f32 = 7.0;
const FONT: f32 = 9.0;
const HEADER_RULE: f32 = 0.6;

/// Column titles and their share of the table width.
const COLUMNS: [(&str, f32); 6] = [
    ("Folio", 0.13),
    ("Fecha", 0.10),
    ("Cliente", 0.24),
    ("Equipo", 0.24),
    ("Técnico", 0.18),
    ("Estado", 0.11),
];

#[derive(Debug, Clone, Default)]
pub struct ReportRow {
    pub folio: String,
    pub date: String,
    pub client: String,
    pub equipment: String,
    pub technician: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct ReportSheet {
    pub company_name: String,
    pub product_caption: String,
    pub generated_at: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: Vec<ReportRow>,
}

fn column_offsets(width: f32) -> Vec<(f32, f32)> {
    let mut x = 0.0;
    COLUMNS
        .iter()
        .map(|(_, share)| {
            let w = width * share;
            let col = (x, w);
            x += w;
            col
        })
        .collect()
}

struct Title<'a> {
    sheet: &'a ReportSheet,
}

impl Block for Title<'_> {
    fn height(&self, _width: f32) -> f32 {
        24.0
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        ops.push(DrawOp::text(f.x, f.y, 16.0, Weight::Bold, Rgb::BRAND, "REPORTE DE SERVICIOS"));
        ops.push(DrawOp::text(
            f.x,
            f.y + 8.0,
            10.0,
            Weight::Regular,
            Rgb::TEXT,
            self.sheet.company_name.clone(),
        ));
        ops.push(DrawOp::text(
            f.x,
            f.y + 13.5,
            10.0,
            Weight::Regular,
            Rgb::MUTED,
            format!(
                "Período: {} - {}",
                self.sheet.start.format("%d/%m/%Y"),
                self.sheet.end.format("%d/%m/%Y")
            ),
        ));
        ops.push(DrawOp::Line {
            x1: f.x,
            y1: f.y + 20.0,
            x2: f.x + f.width,
            y2: f.y + 20.0,
            width: 0.8,
            color: Rgb::BRAND,
        });
    }
}

/// Column headings, repeated at the top of every continuation page.
struct TableHeader;

impl Block for TableHeader {
    fn height(&self, _width: f32) -> f32 {
        ROW_HEIGHT + 1.0
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        ops.push(DrawOp::Rect {
            x: f.x,
            y: f.y,
            w: f.width,
            h: ROW_HEIGHT,
            radius: 0.0,
            fill: Some(Rgb::BRAND_LIGHT),
            stroke: None,
        });
        for ((title, _), (offset, _)) in COLUMNS.iter().zip(column_offsets(f.width)) {
            ops.push(DrawOp::text(f.x + offset + 1.5, f.y + 1.8, FONT, Weight::Bold, Rgb::BRAND, *title));
        }
        ops.push(DrawOp::Line {
            x1: f.x,
            y1: f.y + ROW_HEIGHT,
            x2: f.x + f.width,
            y2: f.y + ROW_HEIGHT,
            width: HEADER_RULE,
            color: Rgb::BRAND,
        });
    }
}

struct TableRow<'a>(&'a ReportRow);

impl Block for TableRow<'_> {
    fn height(&self, _width: f32) -> f32 {
        ROW_HEIGHT
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        let row = self.0;
        let cells = [&row.folio, &row.date, &row.client, &row.equipment, &row.technician, &row.status];

        for (i, (cell, (offset, w))) in cells.into_iter().zip(column_offsets(f.width)).enumerate() {
            let (weight, color) = if i == cells.len() - 1 {
                (Weight::Bold, status_color(cell))
            } else {
                (Weight::Regular, Rgb::TEXT)
            };
            ops.push(DrawOp::text(
                f.x + offset + 1.5,
                f.y + 1.8,
                FONT,
                weight,
                color,
                truncate_to_width(cell, FONT, w - 3.0),
            ));
        }
        ops.push(DrawOp::Line {
            x1: f.x,
            y1: f.y + ROW_HEIGHT,
            x2: f.x + f.width,
            y2: f.y + ROW_HEIGHT,
            width: 0.2,
            color: Rgb::BORDER,
        });
    }
}

struct Summary(usize);

impl Block for Summary {
    fn height(&self, _width: f32) -> f32 {
        10.0
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        ops.push(DrawOp::text(
            f.x,
            f.y + 4.0,
            10.0,
            Weight::Bold,
            Rgb::TEXT,
            format!("Total de servicios: {}", self.0),
        ));
    }
}

/// Lay out the report: title, then one fixed-height row per order with the
/// column headings repeated after every page break, then the total.
pub fn compose_report(sheet: &ReportSheet) -> Vec<Page> {
    let mut pager = Paginator::new(PAGE, MARGIN, FOOTER_RESERVE);

    pager.place(&Title { sheet });
    pager.place(&TableHeader);
    pager.set_running_header(Box::new(TableHeader));

    for row in &sheet.rows {
        pager.place(&TableRow(row));
    }
    pager.place(&Summary(sheet.rows.len()));

    let caption = sheet.product_caption.clone();
    let generated = format!("Generado: {}", sheet.generated_at);
    pager.finish_with(move |page, number, total| {
        let y = PAGE.height - MARGIN - 3.5;
        page.ops.push(DrawOp::text(MARGIN, y, 7.5, Weight::Regular, Rgb::MUTED, generated.clone()));
        page.ops.push(DrawOp::text(
            (PAGE.width - text_width(&caption, 7.5)) / 2.0,
            y,
            7.5,
            Weight::Regular,
            Rgb::MUTED,
            caption.clone(),
        ));
        let pages = format!("Página {} de {}", number, total);
        page.ops.push(DrawOp::text(
            PAGE.width - MARGIN - text_width(&pages, 7.5),
            y,
            7.5,
            Weight::Regular,
            Rgb::MUTED,
            pages,
        ));
    })
}

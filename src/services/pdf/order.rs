//! Single service order sheet (A4 portrait).

use chrono::NaiveDate;

use super::layout::{
    Block, DrawOp, Frame, ImageRef, Page, PageSize, Paginator, Rgb, TextLine, Weight, line_height,
    text_width, truncate_to_width, wrap_text,
};
use crate::models::OrderStatus;

pub const PAGE: PageSize = PageSize::A4;
const MARGIN: f32 = 15.0;
const FOOTER_RESERVE: f32 = 10.0;
const SECTION_GAP: f32 = 4.0;
const EQUIPMENT_PANEL_HEIGHT: f32 = 18.0;
const MAX_PHOTOS: usize = 6;

/// Badge fill for a status label; unknown labels are gray.
pub fn status_color(status: &str) -> Rgb {
    match OrderStatus::parse(status) {
        Some(OrderStatus::Completed) => Rgb(22, 163, 74),
        Some(OrderStatus::InProgress) => Rgb(37, 99, 235),
        Some(OrderStatus::Pending) => Rgb(245, 158, 11),
        Some(OrderStatus::Cancelled) => Rgb(220, 38, 38),
        None => Rgb(107, 114, 128),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EquipmentLine {
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PhotoAsset {
    pub caption: String,
    pub image: ImageRef,
}

/// Everything printed on an order sheet, already resolved to display values.
#[derive(Debug, Clone)]
pub struct OrderSheet {
    pub company_name: String,
    pub product_caption: String,
    pub generated_at: String,
    pub folio: String,
    pub status: String,
    pub service_date: NaiveDate,
    pub service_type: Option<String>,
    pub order_type: Option<String>,
    pub technician_name: Option<String>,
    pub client: Option<ClientInfo>,
    pub branch_name: Option<String>,
    pub branch_address: Option<String>,
    pub equipment: Vec<EquipmentLine>,
    pub description: Option<String>,
    pub work_performed: Option<String>,
    pub logo: Option<ImageRef>,
    pub technician_signature: Option<ImageRef>,
    pub client_signature: Option<ImageRef>,
    pub photos: Vec<PhotoAsset>,
}

fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

struct HeaderBand<'a> {
    sheet: &'a OrderSheet,
}

impl HeaderBand<'_> {
    const BAND: f32 = 28.0;
}

impl Block for HeaderBand<'_> {
    fn height(&self, _width: f32) -> f32 {
        Self::BAND + 6.0
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        ops.push(DrawOp::Rect {
            x: f.x,
            y: f.y,
            w: f.width,
            h: Self::BAND,
            radius: 3.0,
            fill: Some(Rgb::BRAND),
            stroke: None,
        });

        let mut text_x = f.x + 6.0;
        if let Some(logo) = self.sheet.logo {
            let (w, h) = logo.fit(30.0, Self::BAND - 6.0);
            ops.push(DrawOp::Image {
                x: f.x + 4.0,
                y: f.y + (Self::BAND - h) / 2.0,
                w,
                h,
                image: logo.id,
            });
            text_x = f.x + 4.0 + w + 4.0;
        }

        let folio = format!("Folio: {}", self.sheet.folio);
        let folio_w = text_width(&folio, 12.0);
        let right = f.x + f.width - 6.0;
        let name_room = (right - folio_w - 4.0 - text_x).max(10.0);

        ops.push(DrawOp::text(
            text_x,
            f.y + 5.0,
            14.0,
            Weight::Bold,
            Rgb::WHITE,
            truncate_to_width(&self.sheet.company_name, 14.0, name_room),
        ));
        ops.push(DrawOp::text(text_x, f.y + 13.0, 10.0, Weight::Regular, Rgb::WHITE, "ORDEN DE SERVICIO"));
        ops.push(DrawOp::text(right - folio_w, f.y + 5.0, 12.0, Weight::Bold, Rgb::WHITE, folio));

        let badge_w = text_width(&self.sheet.status, 9.0) + 8.0;
        let badge_x = right - badge_w;
        ops.push(DrawOp::Rect {
            x: badge_x,
            y: f.y + 15.0,
            w: badge_w,
            h: 7.0,
            radius: 2.0,
            fill: Some(status_color(&self.sheet.status)),
            stroke: Some(Rgb::WHITE),
        });
        ops.push(DrawOp::text(
            badge_x + 4.0,
            f.y + 16.5,
            9.0,
            Weight::Bold,
            Rgb::WHITE,
            self.sheet.status.clone(),
        ));
    }
}

struct SectionTitle(&'static str);

impl Block for SectionTitle {
    fn height(&self, _width: f32) -> f32 {
        9.0
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        ops.push(DrawOp::text(f.x, f.y + 1.0, 11.0, Weight::Bold, Rgb::BRAND, self.0));
        ops.push(DrawOp::Line {
            x1: f.x,
            y1: f.y + 6.5,
            x2: f.x + f.width,
            y2: f.y + 6.5,
            width: 0.8,
            color: Rgb::BRAND,
        });
    }
}

/// Label/value pairs laid out in two columns.
struct FieldGrid {
    fields: Vec<(&'static str, String)>,
}

impl FieldGrid {
    const LABEL: f32 = 8.0;
    const VALUE: f32 = 10.0;
    const GUTTER: f32 = 8.0;

    fn column_width(width: f32) -> f32 {
        (width - Self::GUTTER) / 2.0
    }

    fn row_heights(&self, width: f32) -> Vec<f32> {
        let col = Self::column_width(width);
        self.fields
            .chunks(2)
            .map(|row| {
                let lines = row
                    .iter()
                    .map(|(_, v)| wrap_text(v, Self::VALUE, col).len().max(1))
                    .max()
                    .unwrap_or(1);
                line_height(Self::LABEL) + lines as f32 * line_height(Self::VALUE) + 2.0
            })
            .collect()
    }
}

impl Block for FieldGrid {
    fn height(&self, width: f32) -> f32 {
        self.row_heights(width).iter().sum()
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        let col = Self::column_width(f.width);
        let mut y = f.y;

        for (row, height) in self.fields.chunks(2).zip(self.row_heights(f.width)) {
            for (i, (label, value)) in row.iter().enumerate() {
                let x = f.x + i as f32 * (col + Self::GUTTER);
                ops.push(DrawOp::text(x, y, Self::LABEL, Weight::Bold, Rgb::MUTED, *label));
                let mut line_y = y + line_height(Self::LABEL);
                for line in wrap_text(value, Self::VALUE, col) {
                    ops.push(DrawOp::text(x, line_y, Self::VALUE, Weight::Regular, Rgb::TEXT, line));
                    line_y += line_height(Self::VALUE);
                }
            }
            y += height;
        }
    }
}

struct EquipmentPanel<'a>(&'a EquipmentLine);

impl Block for EquipmentPanel<'_> {
    fn height(&self, _width: f32) -> f32 {
        EQUIPMENT_PANEL_HEIGHT
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        ops.push(DrawOp::Rect {
            x: f.x,
            y: f.y,
            w: f.width,
            h: EQUIPMENT_PANEL_HEIGHT - 3.0,
            radius: 2.0,
            fill: Some(Rgb::PANEL),
            stroke: Some(Rgb::BORDER),
        });
        ops.push(DrawOp::text(
            f.x + 4.0,
            f.y + 2.5,
            10.0,
            Weight::Bold,
            Rgb::TEXT,
            truncate_to_width(&self.0.name, 10.0, f.width - 8.0),
        ));
        let details = format!(
            "Marca: {}    Modelo: {}    Serie: {}",
            or_dash(self.0.brand.as_deref()),
            or_dash(self.0.model.as_deref()),
            or_dash(self.0.serial.as_deref()),
        );
        ops.push(DrawOp::text(
            f.x + 4.0,
            f.y + 8.5,
            8.5,
            Weight::Regular,
            Rgb::MUTED,
            truncate_to_width(&details, 8.5, f.width - 8.0),
        ));
    }
}

/// One line of each of two side-by-side text columns.
struct ColumnRow {
    left: Option<(String, Weight)>,
    right: Option<(String, Weight)>,
}

impl ColumnRow {
    const SIZE: f32 = 10.0;
}

impl Block for ColumnRow {
    fn height(&self, _width: f32) -> f32 {
        line_height(Self::SIZE)
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        let col = (f.width - 8.0) / 2.0;
        for (i, cell) in [&self.left, &self.right].into_iter().enumerate() {
            if let Some((text, weight)) = cell {
                let color = if *weight == Weight::Bold { Rgb::MUTED } else { Rgb::TEXT };
                ops.push(DrawOp::text(
                    f.x + i as f32 * (col + 8.0),
                    f.y,
                    Self::SIZE,
                    *weight,
                    color,
                    text.clone(),
                ));
            }
        }
    }
}

fn detail_rows(description: Option<&str>, work: Option<&str>, width: f32) -> Vec<ColumnRow> {
    let col = (width - 8.0) / 2.0;
    let body = |text: Option<&str>| -> Vec<String> {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => wrap_text(t, ColumnRow::SIZE, col),
            _ => vec!["Sin información".to_string()],
        }
    };
    let left = body(description);
    let right = body(work);

    let mut rows = vec![ColumnRow {
        left: Some(("Descripción del problema".to_string(), Weight::Bold)),
        right: Some(("Trabajo realizado".to_string(), Weight::Bold)),
    }];
    for i in 0..left.len().max(right.len()) {
        rows.push(ColumnRow {
            left: left.get(i).map(|l| (l.clone(), Weight::Regular)),
            right: right.get(i).map(|r| (r.clone(), Weight::Regular)),
        });
    }
    rows
}

struct SignaturePair<'a> {
    sheet: &'a OrderSheet,
}

impl SignaturePair<'_> {
    const BOX: f32 = 32.0;
}

impl Block for SignaturePair<'_> {
    fn height(&self, _width: f32) -> f32 {
        50.0
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        let box_w = (f.width - 10.0) / 2.0;
        let client_name = self.sheet.client.as_ref().map(|c| c.name.as_str());
        let slots = [
            ("Firma del Técnico", self.sheet.technician_signature, self.sheet.technician_name.as_deref()),
            ("Firma de Conformidad", self.sheet.client_signature, client_name),
        ];

        for (i, (label, image, name)) in slots.into_iter().enumerate() {
            let x = f.x + i as f32 * (box_w + 10.0);
            ops.push(DrawOp::Rect {
                x,
                y: f.y,
                w: box_w,
                h: Self::BOX,
                radius: 2.0,
                fill: None,
                stroke: Some(Rgb::BORDER),
            });

            if let Some(image) = image {
                let (w, h) = image.fit(box_w - 4.0, Self::BOX - 4.0);
                ops.push(DrawOp::Image {
                    x: x + (box_w - w) / 2.0,
                    y: f.y + (Self::BOX - h) / 2.0,
                    w,
                    h,
                    image: image.id,
                });
            }

            ops.push(DrawOp::Line {
                x1: x + 8.0,
                y1: f.y + Self::BOX + 4.0,
                x2: x + box_w - 8.0,
                y2: f.y + Self::BOX + 4.0,
                width: 0.5,
                color: Rgb::TEXT,
            });
            ops.push(DrawOp::text(
                x + (box_w - text_width(label, 9.0)) / 2.0,
                f.y + Self::BOX + 6.0,
                9.0,
                Weight::Bold,
                Rgb::TEXT,
                label,
            ));
            if let Some(name) = name {
                let name = truncate_to_width(name, 8.0, box_w);
                ops.push(DrawOp::text(
                    x + (box_w - text_width(&name, 8.0)) / 2.0,
                    f.y + Self::BOX + 11.0,
                    8.0,
                    Weight::Regular,
                    Rgb::MUTED,
                    name,
                ));
            }
        }
    }
}

/// Up to two photos side by side, 4:3 frames with captions.
struct PhotoRow<'a> {
    photos: &'a [PhotoAsset],
}

impl PhotoRow<'_> {
    const GUTTER: f32 = 6.0;

    fn cell_width(width: f32) -> f32 {
        (width - Self::GUTTER) / 2.0
    }
}

impl Block for PhotoRow<'_> {
    fn height(&self, width: f32) -> f32 {
        Self::cell_width(width) * 0.75 + 9.0
    }

    fn draw(&self, f: Frame, ops: &mut Vec<DrawOp>) {
        let cell_w = Self::cell_width(f.width);
        let box_h = cell_w * 0.75;

        for (i, photo) in self.photos.iter().take(2).enumerate() {
            let x = f.x + i as f32 * (cell_w + Self::GUTTER);
            ops.push(DrawOp::Rect {
                x,
                y: f.y,
                w: cell_w,
                h: box_h,
                radius: 2.0,
                fill: Some(Rgb::PANEL),
                stroke: Some(Rgb::BORDER),
            });
            let (w, h) = photo.image.fit(cell_w - 2.0, box_h - 2.0);
            ops.push(DrawOp::Image {
                x: x + (cell_w - w) / 2.0,
                y: f.y + (box_h - h) / 2.0,
                w,
                h,
                image: photo.image.id,
            });
            ops.push(DrawOp::text(
                x + (cell_w - text_width(&photo.caption, 8.0)) / 2.0,
                f.y + box_h + 2.0,
                8.0,
                Weight::Regular,
                Rgb::MUTED,
                photo.caption.clone(),
            ));
        }
    }
}

fn footer(caption: &str, generated_at: &str) -> impl Fn(&mut Page, usize, usize) {
    let caption = caption.to_string();
    let generated = format!("Generado: {}", generated_at);
    move |page, number, total| {
        let y = PAGE.height - MARGIN - 4.0;
        page.ops.push(DrawOp::Line {
            x1: MARGIN,
            y1: y - 2.0,
            x2: PAGE.width - MARGIN,
            y2: y - 2.0,
            width: 0.3,
            color: Rgb::BORDER,
        });
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
    }
}

/// Lay out an order sheet. Sections never split across pages; equipment
/// panels and photo rows break individually.
pub fn compose_order(sheet: &OrderSheet) -> Vec<Page> {
    let mut pager = Paginator::new(PAGE, MARGIN, FOOTER_RESERVE);
    let width = pager.content_width();

    pager.place(&HeaderBand { sheet });

    let info = FieldGrid {
        fields: vec![
            ("Fecha de servicio", sheet.service_date.format("%d/%m/%Y").to_string()),
            ("Tipo de servicio", or_dash(sheet.service_type.as_deref())),
            ("Técnico", or_dash(sheet.technician_name.as_deref())),
            ("Tipo de orden", or_dash(sheet.order_type.as_deref())),
        ],
    };
    place_section(&mut pager, "INFORMACIÓN DEL SERVICIO", &info);

    let client = sheet.client.clone().unwrap_or_default();
    let client_grid = FieldGrid {
        fields: vec![
            ("Cliente", or_dash(Some(&client.name))),
            ("Empresa", or_dash(client.company.as_deref())),
            ("Teléfono", or_dash(client.phone.as_deref())),
            ("Correo", or_dash(client.email.as_deref())),
            ("Sucursal", or_dash(sheet.branch_name.as_deref())),
            ("Dirección", or_dash(sheet.branch_address.as_deref())),
        ],
    };
    place_section(&mut pager, "CLIENTE", &client_grid);

    let title = SectionTitle("EQUIPO");
    match sheet.equipment.split_first() {
        None => {
            let empty = TextLine {
                text: "Sin equipo registrado".to_string(),
                size: 9.0,
                weight: Weight::Regular,
                color: Rgb::MUTED,
            };
            pager.ensure(title.height(width) + empty.height(width));
            pager.place(&title);
            pager.place(&empty);
        }
        Some((first, rest)) => {
            pager.ensure(title.height(width) + EQUIPMENT_PANEL_HEIGHT);
            pager.place(&title);
            pager.place(&EquipmentPanel(first));
            for item in rest {
                pager.place(&EquipmentPanel(item));
            }
        }
    }
    pager.advance(SECTION_GAP);

    let title = SectionTitle("DETALLES DEL SERVICIO");
    let rows = detail_rows(sheet.description.as_deref(), sheet.work_performed.as_deref(), width);
    let lead = rows.iter().take(2).map(|r| r.height(width)).sum::<f32>();
    pager.ensure(title.height(width) + lead);
    pager.place(&title);
    for row in &rows {
        pager.place(row);
    }
    pager.advance(SECTION_GAP);

    let signatures = SignaturePair { sheet };
    place_section(&mut pager, "FIRMAS", &signatures);

    let photos = &sheet.photos[..sheet.photos.len().min(MAX_PHOTOS)];
    if !photos.is_empty() {
        let title = SectionTitle("EVIDENCIA FOTOGRÁFICA");
        let first_row = PhotoRow { photos: &photos[..photos.len().min(2)] };
        pager.ensure(title.height(width) + first_row.height(width));
        pager.place(&title);
        for chunk in photos.chunks(2) {
            pager.place(&PhotoRow { photos: chunk });
        }
    }

    pager.finish_with(footer(&sheet.product_caption, &sheet.generated_at))
}

/// Title plus body kept together on one page.
fn place_section(pager: &mut Paginator, title: &'static str, body: &dyn Block) {
    let title = SectionTitle(title);
    let width = pager.content_width();
    pager.ensure(title.height(width) + body.height(width));
    pager.place(&title);
    pager.place(body);
    pager.advance(SECTION_GAP);
}

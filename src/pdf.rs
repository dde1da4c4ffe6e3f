use crate::assets::{self, LogoImage};
use crate::layout::wrap;
use crate::metrics::FontFace;
use crate::models::{Field, InvoiceRecord, ValidationError};
use crate::words::{amount_parts, MAX_AMOUNT};
use bytes::Bytes;
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Line, Mm, PdfDocument, Point, Pt, Px,
};
use std::io::BufWriter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

// A4 in points.
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 50.0;
pub const LINE_HEIGHT: f32 = 15.0;
pub const BODY_SIZE: f32 = 10.0;
pub const LOGO_SCALE: f32 = 0.25;
/// Blank space between the agreement paragraph and the bank details.
pub const PARAGRAPH_GAP: f32 = 2.0 * LINE_HEIGHT;
/// Drop from the last bank-details baseline to the signature rules.
pub const SIGNATURE_DROP: f32 = 60.0;

const AGREEMENT_TOP: f32 = 370.0;
const COMPANY_NAME: &str = "STEEL WHEEL AUTO LIMITED";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invoice amount must be a finite number from 0 to 10 trillion, got {0}")]
    InvalidAmount(f64),
    #[error("PDF error: {0}")]
    Pdf(String),
}

fn pdf_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(e.to_string())
}

/// One drawing instruction, in points from the bottom-left page corner.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text { text: String, x: f32, y: f32, size: f32, face: FontFace },
    Rule { x1: f32, x2: f32, y: f32, thickness: f32 },
    Image { logo: Arc<LogoImage>, x: f32, y: f32, scale: f32 },
}

/// Everything that goes on the single invoice page, in drawing order.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

/// Running baseline shared by consecutive blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub y: f32,
}

impl Cursor {
    /// `offset` points below the top edge of the page.
    pub fn from_top(offset: f32) -> Self {
        Self { y: PAGE_HEIGHT - offset }
    }

    /// Start of the next block after one spanning `lines` lines plus `gap`.
    pub fn below(self, lines: usize, gap: f32) -> Self {
        Self { y: self.y - lines as f32 * LINE_HEIGHT - gap }
    }
}

impl PagePlan {
    fn new(title: String) -> Self {
        Self { title, width: PAGE_WIDTH, height: PAGE_HEIGHT, ops: Vec::new() }
    }

    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, face: FontFace) {
        self.ops.push(DrawOp::Text { text: text.into(), x, y, size, face });
    }

    /// Text runs in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether `needle` occurs within any single text run.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    /// Serialize the plan as a one-page PDF.
    pub fn to_pdf(&self) -> Result<Vec<u8>, RenderError> {
        let (doc, page, layer) = PdfDocument::new(
            self.title.as_str(),
            Mm::from(Pt(self.width)),
            Mm::from(Pt(self.height)),
            "Layer 1",
        );
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);

        for op in &self.ops {
            match op {
                DrawOp::Text { text, x, y, size, face } => {
                    let font = match face {
                        FontFace::Helvetica => &regular,
                        FontFace::HelveticaBold => &bold,
                    };
                    layer.use_text(text.as_str(), *size, Mm::from(Pt(*x)), Mm::from(Pt(*y)), font);
                }
                DrawOp::Rule { x1, x2, y, thickness } => {
                    layer.set_outline_thickness(*thickness);
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm::from(Pt(*x1)), Mm::from(Pt(*y))), false),
                            (Point::new(Mm::from(Pt(*x2)), Mm::from(Pt(*y))), false),
                        ],
                        is_closed: false,
                    });
                }
                DrawOp::Image { logo, x, y, scale } => {
                    let image = Image::from(ImageXObject {
                        width: Px(logo.width as usize),
                        height: Px(logo.height as usize),
                        color_space: ColorSpace::Rgb,
                        bits_per_component: ColorBits::Bit8,
                        interpolate: true,
                        image_data: logo.rgb.clone(),
                        image_filter: None,
                        clipping_bbox: None,
                        smask: None,
                    });
                    // At 72 dpi one pixel is one point.
                    image.add_to_layer(
                        layer.clone(),
                        ImageTransform {
                            translate_x: Some(Mm::from(Pt(*x))),
                            translate_y: Some(Mm::from(Pt(*y))),
                            scale_x: Some(*scale),
                            scale_y: Some(*scale),
                            dpi: Some(72.0),
                            ..Default::default()
                        },
                    );
                }
            }
        }

        let mut buf: Vec<u8> = Vec::new();
        {
            let mut writer = BufWriter::new(&mut buf);
            doc.save(&mut writer).map_err(pdf_err)?;
        }
        Ok(buf)
    }
}

/// A finished PDF file. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument(Bytes);

impl RenderedDocument {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where the renderer gets its logo from.
#[derive(Debug, Clone, Default)]
pub enum LogoSource {
    /// The image compiled into the binary.
    #[default]
    Bundled,
    /// Encoded image bytes, decoded on every render.
    Bytes(Arc<[u8]>),
}

/// Renders invoice records to PDF. Holds no per-render state, so one value
/// can be shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct InvoiceRenderer {
    logo: LogoSource,
}

impl InvoiceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logo_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { logo: LogoSource::Bytes(bytes.into()) }
    }

    /// The logo is cosmetic: a decode failure is logged and the page is
    /// drawn without it.
    fn logo(&self) -> Option<Arc<LogoImage>> {
        let decoded = match &self.logo {
            LogoSource::Bundled => assets::bundled_logo(),
            LogoSource::Bytes(bytes) => LogoImage::decode(bytes).map(Arc::new),
        };
        match decoded {
            Ok(logo) => Some(logo),
            Err(e) => {
                warn!(error = %e, "invoice logo unavailable, rendering without it");
                None
            }
        }
    }

    pub fn plan(&self, record: &InvoiceRecord, bank_info: &str) -> Result<PagePlan, RenderError> {
        // Validate before touching the logo so a bad record costs nothing.
        let fields = Fields::from_record(record)?;
        Ok(lay_out(record, &fields, bank_info, self.logo()))
    }

    pub fn render(&self, record: &InvoiceRecord, bank_info: &str) -> Result<RenderedDocument, RenderError> {
        let plan = self.plan(record, bank_info)?;
        let bytes = plan.to_pdf()?;
        debug!(bytes = bytes.len(), ops = plan.ops.len(), "rendered invoice pdf");
        Ok(RenderedDocument(Bytes::from(bytes)))
    }
}

/// Validated view of the fields the layout draws.
struct Fields<'a> {
    customer_name: &'a str,
    customer_address: &'a str,
    customer_email: &'a str,
    vehicle: String,
    chassis_no: &'a str,
    engine_no: &'a str,
    amount: f64,
}

impl<'a> Fields<'a> {
    fn from_record(record: &'a InvoiceRecord) -> Result<Self, RenderError> {
        record.require(&Field::LAYOUT)?;
        let amount = record.invoice_amount.unwrap_or_default();
        if !amount.is_finite() || !(0.0..=MAX_AMOUNT).contains(&amount) {
            return Err(RenderError::InvalidAmount(amount));
        }
        let s = |v: &'a Option<String>| v.as_deref().map(str::trim).unwrap_or_default();
        Ok(Self {
            customer_name: s(&record.customer_name),
            customer_address: s(&record.customer_address),
            customer_email: s(&record.customer_email),
            vehicle: record.vehicle_description(),
            chassis_no: s(&record.chassis_no),
            engine_no: s(&record.engine_no),
            amount,
        })
    }
}

/// The purchase agreement sentence. The amount is rounded to cents once and
/// its whole part is spelled out.
pub fn agreement_text(name: &str, address: &str, vehicle: &str, amount: f64) -> String {
    let (words, numerals) = amount_parts(amount);
    format!("I {name} of {address} agree to purchase a {vehicle} Motor Vehicle in the amount of {words} JMD ${numerals}.")
}

/// Lay out the invoice page. `logo`, when present, sits in the top-right corner.
pub fn plan_page(record: &InvoiceRecord, bank_info: &str, logo: Option<Arc<LogoImage>>) -> Result<PagePlan, RenderError> {
    let fields = Fields::from_record(record)?;
    Ok(lay_out(record, &fields, bank_info, logo))
}

fn lay_out(record: &InvoiceRecord, fields: &Fields<'_>, bank_info: &str, logo: Option<Arc<LogoImage>>) -> PagePlan {
    let mut plan = PagePlan::new(format!("Invoice - {}", fields.customer_name));

    if let Some(logo) = logo {
        draw_logo(&mut plan, logo);
    }
    draw_header(&mut plan, record);
    draw_customer(&mut plan, fields);
    draw_vehicle(&mut plan, fields);

    let agreement = agreement_text(fields.customer_name, fields.customer_address, &fields.vehicle, fields.amount);
    let cursor = Cursor::from_top(AGREEMENT_TOP);
    let lines = draw_paragraph(&mut plan, cursor, &agreement);
    let cursor = cursor.below(lines, PARAGRAPH_GAP);
    let bank_lines = draw_paragraph(&mut plan, cursor, bank_info);
    let cursor = cursor.below(bank_lines.saturating_sub(1), SIGNATURE_DROP);
    draw_signatures(&mut plan, cursor);

    plan
}

fn draw_logo(plan: &mut PagePlan, logo: Arc<LogoImage>) {
    let w = logo.width as f32 * LOGO_SCALE;
    let h = logo.height as f32 * LOGO_SCALE;
    plan.ops.push(DrawOp::Image {
        logo,
        x: PAGE_WIDTH - w - MARGIN,
        y: PAGE_HEIGHT - h - MARGIN,
        scale: LOGO_SCALE,
    });
}

fn draw_header(plan: &mut PagePlan, record: &InvoiceRecord) {
    plan.text(COMPANY_NAME, MARGIN, PAGE_HEIGHT - 50.0, 18.0, FontFace::HelveticaBold);
    plan.text("INVOICE", MARGIN, PAGE_HEIGHT - 80.0, 14.0, FontFace::HelveticaBold);
    if let Some(date) = record.invoice_date {
        let date = date.format("%B %-d, %Y");
        plan.text(format!("Date: {date}"), MARGIN, PAGE_HEIGHT - 110.0, 12.0, FontFace::Helvetica);
    }
}

fn draw_customer(plan: &mut PagePlan, fields: &Fields<'_>) {
    plan.text("CUSTOMER INFORMATION", MARGIN, PAGE_HEIGHT - 150.0, 12.0, FontFace::HelveticaBold);
    plan.text(format!("Name: {}", fields.customer_name), MARGIN, PAGE_HEIGHT - 170.0, BODY_SIZE, FontFace::Helvetica);
    plan.text(format!("Address: {}", fields.customer_address), MARGIN, PAGE_HEIGHT - 190.0, BODY_SIZE, FontFace::Helvetica);
    plan.text(format!("Email: {}", fields.customer_email), MARGIN, PAGE_HEIGHT - 210.0, BODY_SIZE, FontFace::Helvetica);
}

fn draw_vehicle(plan: &mut PagePlan, fields: &Fields<'_>) {
    plan.text("VEHICLE DETAILS", MARGIN, PAGE_HEIGHT - 250.0, 12.0, FontFace::HelveticaBold);
    plan.text(format!("Vehicle: {}", fields.vehicle), MARGIN, PAGE_HEIGHT - 270.0, BODY_SIZE, FontFace::Helvetica);
    plan.text(format!("Chassis No: {}", fields.chassis_no), MARGIN, PAGE_HEIGHT - 290.0, BODY_SIZE, FontFace::Helvetica);
    plan.text(format!("Engine No: {}", fields.engine_no), MARGIN, PAGE_HEIGHT - 310.0, BODY_SIZE, FontFace::Helvetica);
}

/// Wrap `text` to the margins and stack it down from `cursor`. Returns the
/// number of lines drawn.
fn draw_paragraph(plan: &mut PagePlan, cursor: Cursor, text: &str) -> usize {
    let measure = FontFace::Helvetica.measure(BODY_SIZE);
    let mut count = 0;
    for (i, line) in wrap(text, &measure, PAGE_WIDTH - 2.0 * MARGIN).enumerate() {
        plan.text(line, MARGIN, cursor.y - i as f32 * LINE_HEIGHT, BODY_SIZE, FontFace::Helvetica);
        count += 1;
    }
    count
}

fn draw_signatures(plan: &mut PagePlan, cursor: Cursor) {
    for (x, label) in [(MARGIN, "Customer Signature"), (350.0, "Steel Wheel Auto Representative")] {
        plan.ops.push(DrawOp::Rule { x1: x, x2: x + 200.0, y: cursor.y, thickness: 1.0 });
        plan.text(label, x, cursor.y - LINE_HEIGHT, BODY_SIZE, FontFace::Helvetica);
    }
}

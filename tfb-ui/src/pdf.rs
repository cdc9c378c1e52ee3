//! PDF report rendering
//!
//! Draws the member report as an A4 PDF: title block, the butterfly
//! chart as diverging horizontal bars, comment sections per source, and
//! the manager's commentary. Pure vector output, no raster assets.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rect, Rgb,
};
use tfb_common::TenetCatalog;

use crate::api::report::MemberReport;
use crate::{ApiError, ApiResult};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;

const BAR_HEIGHT_MM: f32 = 5.0;
const BAR_MAX_WIDTH_MM: f32 = 55.0;
const CHART_CENTER_MM: f32 = PAGE_WIDTH_MM / 2.0;

fn strength_color(highlighted: bool) -> Color {
    if highlighted {
        Color::Rgb(Rgb::new(0.08, 0.50, 0.20, None))
    } else {
        Color::Rgb(Rgb::new(0.16, 0.65, 0.27, None))
    }
}

fn improvement_color(highlighted: bool) -> Color {
    if highlighted {
        Color::Rgb(Rgb::new(0.65, 0.10, 0.15, None))
    } else {
        Color::Rgb(Rgb::new(0.86, 0.21, 0.27, None))
    }
}

/// Greedy word wrap sized for Helvetica at the given point size.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.len() + 1 + word.len() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Cursor over a growing document; adds pages as sections run past the
/// bottom margin.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> ApiResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ApiError::Internal(format!("PDF font error: {}", e)))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ApiError::Internal(format!("PDF font error: {}", e)))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            font,
            font_bold,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        })
    }

    fn ensure_space(&mut self, needed_mm: f32) {
        if self.y - needed_mm < MARGIN_MM {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn advance(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn text(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(14.0);
        self.advance(8.0);
        self.text(text, 13.0, MARGIN_MM, true);
        self.advance(6.0);
    }

    fn paragraph(&mut self, text: &str, size: f32, indent: f32) {
        for line in wrap_text(text, 95) {
            self.ensure_space(5.0);
            self.text(&line, size, MARGIN_MM + indent, false);
            self.advance(4.5);
        }
    }

    fn bar(&mut self, x_from: f32, x_to: f32, color: Color) {
        self.layer.set_fill_color(color);
        let rect = Rect::new(
            Mm(x_from.min(x_to)),
            Mm(self.y - BAR_HEIGHT_MM / 2.0),
            Mm(x_from.max(x_to)),
            Mm(self.y + BAR_HEIGHT_MM / 2.0),
        );
        self.layer.add_rect(rect);
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    }
}

fn draw_butterfly(writer: &mut PdfWriter, report: &MemberReport) {
    let max_count = report
        .butterfly
        .iter()
        .map(|row| row.strength_count.max(row.improvement_count))
        .max()
        .unwrap_or(0)
        .max(1) as f32;

    let highlighted_strengths: Vec<String> = report
        .manager_feedback
        .as_ref()
        .map(|mf| mf.selected_strengths())
        .unwrap_or_default();
    let highlighted_improvements: Vec<String> = report
        .manager_feedback
        .as_ref()
        .map(|mf| mf.selected_improvements())
        .unwrap_or_default();

    writer.ensure_space(10.0);
    writer.text("Improvements", 9.0, CHART_CENTER_MM - 45.0, true);
    writer.text("Strengths", 9.0, CHART_CENTER_MM + 25.0, true);
    writer.advance(8.0);

    for row in &report.butterfly {
        writer.ensure_space(8.0);

        let s_width = row.strength_count as f32 / max_count * BAR_MAX_WIDTH_MM;
        let i_width = row.improvement_count as f32 / max_count * BAR_MAX_WIDTH_MM;

        if row.strength_count > 0 {
            writer.bar(
                CHART_CENTER_MM + 1.0,
                CHART_CENTER_MM + 1.0 + s_width,
                strength_color(highlighted_strengths.contains(&row.id)),
            );
            writer.text(
                &row.strength_count.to_string(),
                8.0,
                CHART_CENTER_MM + 3.0 + s_width,
                false,
            );
        }
        if row.improvement_count > 0 {
            writer.bar(
                CHART_CENTER_MM - 1.0 - i_width,
                CHART_CENTER_MM - 1.0,
                improvement_color(highlighted_improvements.contains(&row.id)),
            );
            writer.text(
                &row.improvement_count.to_string(),
                8.0,
                CHART_CENTER_MM - 7.0 - i_width,
                false,
            );
        }

        writer.text(&row.name, 9.0, MARGIN_MM, false);
        writer.advance(7.5);
    }
}

fn comment_block(writer: &mut PdfWriter, label: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    writer.ensure_space(10.0);
    writer.text(label, 10.0, MARGIN_MM, true);
    writer.advance(5.0);
    writer.paragraph(text.trim(), 9.0, 3.0);
    writer.advance(2.0);
}

fn value_str(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Render the full report as PDF bytes.
pub fn render_report(catalog: &TenetCatalog, report: &MemberReport) -> ApiResult<Vec<u8>> {
    let title = format!("Feedback Report - {}", report.member.name);
    let mut writer = PdfWriter::new(&title)?;

    writer.text(&report.member.name, 18.0, MARGIN_MM, true);
    writer.advance(7.0);
    if let Some(job_title) = &report.member.job_title {
        writer.text(job_title, 11.0, MARGIN_MM, false);
        writer.advance(6.0);
    }
    writer.text(
        &format!("Generated {}", chrono::Utc::now().format("%Y-%m-%d")),
        9.0,
        MARGIN_MM,
        false,
    );
    writer.advance(4.0);

    writer.heading("Tenet Overview");
    draw_butterfly(&mut writer, report);

    if !report.feedbacks.is_empty() {
        writer.heading("Peer Feedback");
        for entry in &report.feedbacks {
            let from = value_str(entry, "from_name");
            let strengths_text = value_str(entry, "strengths_text");
            let improvements_text = value_str(entry, "improvements_text");
            writer.ensure_space(8.0);
            writer.text(&format!("From {}", from), 10.0, MARGIN_MM, true);
            writer.advance(5.0);
            comment_block(&mut writer, "Strengths:", &strengths_text);
            comment_block(&mut writer, "Improvements:", &improvements_text);
            writer.advance(2.0);
        }
    }

    if !report.generic_feedbacks.is_empty() {
        writer.heading("Other Feedback");
        for entry in &report.generic_feedbacks {
            let from = value_str(entry, "from_name");
            let text = value_str(entry, "feedback");
            if text.trim().is_empty() {
                continue;
            }
            writer.ensure_space(8.0);
            writer.text(&format!("From {}", from), 10.0, MARGIN_MM, true);
            writer.advance(5.0);
            writer.paragraph(text.trim(), 9.0, 3.0);
            writer.advance(2.0);
        }
    }

    if let Some(mf) = &report.manager_feedback {
        writer.heading("Manager Commentary");
        let highlight_names = |ids: &[String]| -> String {
            ids.iter()
                .filter_map(|id| catalog.name_of(id))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let strengths = highlight_names(&mf.selected_strengths());
        if !strengths.is_empty() {
            comment_block(&mut writer, "Highlighted strengths:", &strengths);
        }
        let improvements = highlight_names(&mf.selected_improvements());
        if !improvements.is_empty() {
            comment_block(&mut writer, "Highlighted improvements:", &improvements);
        }
        comment_block(&mut writer, "Comments:", &mf.feedback_text);
    }

    writer
        .doc
        .save_to_bytes()
        .map_err(|e| ApiError::Internal(format!("PDF write error: {}", e)))
}

//! Prescription analysis report: fixed section order over a parsed tree.
//!
//! Order: title, patient information, prescribed medicines, dietary
//! recommendations, additional information, footer. Any field may be
//! missing; missing leaves print as `N/A` and optional rows are skipped.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::layout::{FontStyle, Layout, PageGeometry, Rgb};
use crate::analysis::{Field, ParsedAnalysis};
use crate::models::PrescriptionRecord;

pub const REPORT_TITLE: &str = "MediMate Prescription Analysis Report";
pub const PURCHASE_SEARCH_URL: &str = "https://pharmeasy.in/search/all?name=";

const FULL_W: f32 = 190.0;
const LABEL_W: f32 = 40.0;
const VALUE_W: f32 = 150.0;
const ROW_H: f32 = 8.0;
const BULLET: &str = "\u{2022}";

/// Record metadata printed alongside the parsed analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMeta {
    pub record_id: Uuid,
    pub owner: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&PrescriptionRecord> for ReportMeta {
    fn from(record: &PrescriptionRecord) -> Self {
        Self {
            record_id: record.id,
            owner: record.owner.clone(),
            uploaded_at: record.uploaded_at,
        }
    }
}

/// "January 2, 2006 15:04:05" style, UTC.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%B %-d, %Y %H:%M:%S").to_string()
}

/// Pharmacy search URL for a medicine name (form-encoded).
pub fn purchase_link(name: &str) -> String {
    format!(
        "{PURCHASE_SEARCH_URL}{}",
        urlencoding::encode(name).replace("%20", "+")
    )
}

/// Lay out the full report. Never fails; same inputs give the same layout.
pub fn compose_report(
    parsed: &ParsedAnalysis,
    meta: &ReportMeta,
    generated_at: DateTime<Utc>,
) -> Layout {
    let mut layout = Layout::new(PageGeometry::A4);

    layout.set_font(FontStyle::Bold, 16.0);
    layout.cell(FULL_W, 10.0, REPORT_TITLE);
    layout.ln(15.0);

    patient_information(&mut layout, parsed, meta);
    medicines(&mut layout, parsed);
    dietary_recommendations(&mut layout, parsed);
    additional_information(&mut layout, parsed);

    layout.set_y(-15.0);
    layout.set_font(FontStyle::Italic, 8.0);
    layout.set_text_color(Rgb::BLACK);
    layout.fixed_cell(
        0.0,
        10.0,
        &format!("Generated by MediMate on {}", format_timestamp(&generated_at)),
    );

    layout
}

fn section_heading(layout: &mut Layout, title: &str, gap: f32) {
    layout.set_font(FontStyle::Bold, 12.0);
    layout.cell(FULL_W, 10.0, title);
    layout.ln(gap);
    layout.set_font(FontStyle::Regular, 11.0);
}

fn field_row(layout: &mut Layout, label: &str, value: &str) {
    layout.cell(LABEL_W, ROW_H, label);
    layout.cell(VALUE_W, ROW_H, value);
    layout.ln(ROW_H);
}

/// Label in the fixed column, value wrapped in the value column; the cursor
/// ends at the left margin below the wrapped block.
fn wrapped_row(layout: &mut Layout, label: &str, value: &str) {
    layout.cell(LABEL_W, ROW_H, label);
    layout.multi_cell(VALUE_W, ROW_H, value);
}

fn patient_information(layout: &mut Layout, parsed: &ParsedAnalysis, meta: &ReportMeta) {
    section_heading(layout, "Patient Information", 8.0);
    field_row(layout, "Date:", &format_timestamp(&meta.uploaded_at));
    field_row(layout, "Patient ID:", &meta.owner);
    field_row(layout, "Patient Name:", &parsed.field("patient_name").display());
    field_row(layout, "Prescriber:", &parsed.field("prescriber").display());
    if parsed.field("date").is_present() {
        field_row(layout, "Prescribed On:", &parsed.field("date").display());
    }
    layout.ln(7.0);
}

fn medicines(layout: &mut Layout, parsed: &ParsedAnalysis) {
    section_heading(layout, "Prescribed Medicines", 10.0);
    for (i, medicine) in parsed.medicines().into_iter().enumerate() {
        medicine_entry(layout, i + 1, medicine);
    }
}

fn medicine_entry(layout: &mut Layout, number: usize, medicine: Field<'_>) {
    let name = medicine.get("name");

    layout.set_font(FontStyle::Bold, 11.0);
    layout.cell(FULL_W, ROW_H, &format!("{number}. {}", name.display()));
    layout.ln(ROW_H);
    layout.set_font(FontStyle::Regular, 11.0);

    field_row(layout, "Dosage:", &medicine.get("dosage").display());
    wrapped_row(layout, "Purpose:", &medicine.get("purpose").display());
    wrapped_row(layout, "Instructions:", &medicine.get("instructions").display());

    let warnings = medicine.get("warnings");
    if warnings.exists() {
        wrapped_row(layout, "Warnings:", &warnings.display());
    }

    let appropriate = medicine.get("dosage_appropriate");
    if appropriate.exists() {
        field_row(layout, "Dosage Status:", &appropriate.display());
    }

    if let Some(name) = name.as_str().filter(|n| !n.trim().is_empty()) {
        layout.cell(LABEL_W, ROW_H, "Purchase Link:");
        layout.set_text_color(Rgb::LINK_BLUE);
        layout.cell(VALUE_W, ROW_H, &purchase_link(name));
        layout.set_text_color(Rgb::BLACK);
        layout.ln(ROW_H);
    }

    let alternatives = medicine.get("generic_alternatives");
    if !alternatives.is_empty() {
        layout.cell(LABEL_W, ROW_H, "Generic Alternatives:");
        layout.ln(6.0);
        for alternative in alternatives.items() {
            layout.cell(20.0, ROW_H, BULLET);
            layout.multi_cell(130.0, ROW_H, &alternative_line(alternative));
        }
        layout.ln(2.0);
    }

    layout.ln(4.0);
}

fn alternative_line(alternative: Field<'_>) -> String {
    if !alternative.is_object() {
        return alternative.display();
    }
    let name = alternative.get("name").display();
    let saving = alternative.get("cost_saving");
    if saving.is_present() {
        format!("{name} ({}% cheaper)", saving.display())
    } else {
        name
    }
}

fn dietary_recommendations(layout: &mut Layout, parsed: &ParsedAnalysis) {
    section_heading(layout, "Dietary Recommendations", 10.0);
    let dietary = parsed.field("dietary_recommendations");

    food_list(layout, "Foods to Eat:", dietary.get("foods_to_eat"));

    let avoid = dietary.get("foods_to_avoid");
    let avoid = if avoid.exists() { avoid } else { dietary.get("foods_to avoid") };
    food_list(layout, "Foods to Avoid:", avoid);
}

fn food_list(layout: &mut Layout, label: &str, foods: Field<'_>) {
    if foods.is_empty() {
        return;
    }
    layout.set_font(FontStyle::Bold, 11.0);
    layout.cell(FULL_W, ROW_H, label);
    layout.ln(ROW_H);
    layout.set_font(FontStyle::Regular, 11.0);
    for food in foods.items() {
        layout.cell(10.0, ROW_H, BULLET);
        layout.multi_cell(180.0, ROW_H, &food.display());
    }
    layout.ln(4.0);
}

fn additional_information(layout: &mut Layout, parsed: &ParsedAnalysis) {
    section_heading(layout, "Additional Information", 8.0);
    field_row(layout, "Manufacturer:", &parsed.field("manufacturer").display());
    field_row(layout, "Lot Number:", &parsed.field("lot_number").display());
    field_row(layout, "Expiration Date:", &parsed.field("expiration_date").display());
}

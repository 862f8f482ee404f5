//! Emits a [`Layout`] as PDF bytes with the built-in Helvetica family.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    Rgb as PdfRgb,
};

use super::layout::{FontStyle, Layout, Rgb, PT_TO_MM};
use super::ReportError;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ReportError> {
        let load = |font| {
            doc.add_builtin_font(font)
                .map_err(|e| ReportError::Pdf(format!("font error: {e}")))
        };
        Ok(Self {
            regular: load(BuiltinFont::Helvetica)?,
            bold: load(BuiltinFont::HelveticaBold)?,
            italic: load(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn for_style(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn pdf_color(color: Rgb) -> Color {
    Color::Rgb(PdfRgb::new(
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0,
        None,
    ))
}

/// Render every page of `layout`. Cell coordinates are top-left based;
/// PDF text is placed on a baseline measured from the bottom edge.
pub fn write_pdf(layout: &Layout, title: &str) -> Result<Vec<u8>, ReportError> {
    let geometry = *layout.geometry();
    let (page_w, page_h) = (Mm(geometry.width), Mm(geometry.height));

    let (doc, first_page, first_layer) = PdfDocument::new(title, page_w, page_h, "Layer 1");
    let fonts = Fonts::load(&doc)?;

    for (index, page) in layout.pages().iter().enumerate() {
        let (page_idx, layer_idx) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(page_w, page_h, "Layer 1")
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        for run in &page.runs {
            let baseline = geometry.height - (run.y + run.height / 2.0 + 0.3 * run.size * PT_TO_MM);
            layer.set_fill_color(pdf_color(run.color));
            layer.use_text(
                run.text.as_str(),
                run.size,
                Mm(run.x),
                Mm(baseline),
                fonts.for_style(run.style),
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
}

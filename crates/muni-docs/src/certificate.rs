//! # Certificate Renderer
//!
//! Produces the human-readable artifact for an issued document: a single A4
//! PDF page with a header block, the document details, a QR code carrying
//! the verification reference, the same reference as plain text, and a
//! disclaimer footer.
//!
//! The PDF is built directly with `lopdf` using the standard Helvetica
//! Type1 fonts, so no font files are embedded. The QR code is drawn as
//! vector rectangles, one per dark module, inside a fixed 150 pt square
//! that includes a four-module quiet zone.
//!
//! Two renders of the same document under the same prefix embed identical
//! text and an identical verification payload. The container bytes are not
//! guaranteed to match.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, ObjectId, Stream};
use qrcode::types::{Color, EcLevel, QrError, Version};
use qrcode::QrCode;
use thiserror::Error;

use muni_core::VerificationPrefix;
use muni_state::Citizen;

use crate::document::Document;
use crate::reference::{ReferenceError, VerificationReference};

// ─── Layout constants ────────────────────────────────────────────────

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const QR_SIZE: f32 = 150.0;
const QR_QUIET_ZONE: usize = 4;
/// Densest symbol that still gives legible modules inside `QR_SIZE`.
const MAX_QR_VERSION: i16 = 10;

const HEADER: &str = "SMART MUNICIPAL SERVICES";
const SUB_HEADER: &str = "Official Document Certificate";
const DETAILS_HEADING: &str = "Document Details:";
const VERIFICATION_HEADING: &str = "Document Verification";
const VERIFICATION_INSTRUCTIONS: &str =
    "Scan the QR code below to verify the authenticity of this document:";
const URL_LABEL: &str = "Verification URL:";
const FOOTER: &str = "This is an electronically generated document. \
Verify authenticity by scanning the QR code above or visiting the verification URL.";

/// Errors from rendering a certificate.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The document hash cannot be placed in a verification reference.
    #[error("cannot build verification reference: {0}")]
    Reference(#[from] ReferenceError),

    /// The verification URL does not fit a QR symbol at the fixed size.
    #[error("verification URL of {len} bytes does not fit the 150pt QR code (needs {needed})")]
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
        /// Required symbol version, or "more than version 40".
        needed: String,
    },

    /// QR encoding failed for another reason.
    #[error("QR encoding failed: {0}")]
    QrEncoding(String),

    /// The recipient passed in is not the document's recipient.
    #[error("recipient {recipient} does not match document recipient {expected}")]
    RecipientMismatch {
        /// Citizen supplied to the renderer.
        recipient: i64,
        /// `issued_to` on the document.
        expected: i64,
    },

    /// PDF assembly or serialization failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// A rendered certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The PDF file.
    pub bytes: Vec<u8>,
    /// The verification URL encoded in the QR code and printed below it.
    pub verification_url: String,
    /// Every text line on the page, top to bottom.
    pub lines: Vec<String>,
    /// QR symbol version used for the verification URL.
    pub qr_version: i16,
}

impl Certificate {
    /// MIME type of [`Certificate::bytes`].
    pub const CONTENT_TYPE: &'static str = "application/pdf";

    /// Attachment file name for a document, `Document-{id}.pdf`.
    pub fn file_name(document: &Document) -> String {
        format!("Document-{}.pdf", document.id)
    }
}

/// Renders certificates under a fixed verification prefix.
#[derive(Debug, Clone)]
pub struct CertificateRenderer {
    prefix: VerificationPrefix,
}

impl CertificateRenderer {
    pub fn new(prefix: VerificationPrefix) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &VerificationPrefix {
        &self.prefix
    }

    /// The verification URL for `document` under this renderer's prefix.
    pub fn verification_url(&self, document: &Document) -> Result<String, ReferenceError> {
        Ok(VerificationReference::new(document.id, &document.document_hash)?.encode(&self.prefix))
    }

    /// Check that the longest reference this prefix can produce, the
    /// largest document id with a full SHA-256 hex hash, still fits the QR
    /// symbol. Returns the symbol version it needs.
    pub fn ensure_capacity(&self) -> Result<i16, RenderError> {
        let longest = format!("{}/{}/{}", self.prefix.as_str(), i64::MAX, "f".repeat(64));
        let code = encode_qr(&longest)?;
        Ok(match code.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        })
    }

    /// Render `document` for `recipient`.
    ///
    /// `recipient` must be the citizen the document was issued to; it is
    /// fetched by the caller since documents only hold the id.
    pub fn render(&self, document: &Document, recipient: &Citizen) -> Result<Certificate, RenderError> {
        if recipient.id != document.issued_to {
            return Err(RenderError::RecipientMismatch {
                recipient: recipient.id.get(),
                expected: document.issued_to.get(),
            });
        }

        let verification_url = self.verification_url(document)?;
        let qr = encode_qr(&verification_url)?;
        let qr_version = match qr.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        };

        let mut page = PageBuilder::new();
        page.text(Font::Bold, 20.0, HEADER, Align::Center);
        page.text(Font::Bold, 14.0, SUB_HEADER, Align::Center);
        page.gap(12.0);
        page.rule();
        page.gap(12.0);

        page.text(Font::Bold, 14.0, DETAILS_HEADING, Align::Left);
        page.gap(6.0);
        let issued_at = document.issued_at.certificate_format();
        for line in [
            format!("Document Title: {}", document.title),
            format!("Document ID: {}", document.id),
            format!("Issued To: {}", recipient.full_name),
            format!("Email: {}", recipient.email),
            format!("Category: {}", document.category),
            format!("Issued At: {issued_at}"),
        ] {
            page.wrapped(Font::Regular, 12.0, &line, Align::Left);
        }
        page.gap(12.0);
        page.rule();
        page.gap(12.0);

        page.text(Font::Bold, 14.0, VERIFICATION_HEADING, Align::Left);
        page.text(Font::Regular, 12.0, VERIFICATION_INSTRUCTIONS, Align::Left);
        page.gap(8.0);
        page.qr(&qr);
        page.gap(8.0);
        page.text(Font::Oblique, 10.0, URL_LABEL, Align::Left);
        let url_size = fit_size(&verification_url, 10.0);
        page.text(Font::Oblique, url_size, &verification_url, Align::Center);
        page.gap(24.0);
        page.rule();
        page.gap(4.0);
        page.wrapped(Font::Oblique, 10.0, FOOTER, Align::Center);

        let lines = page.lines.clone();
        let bytes = page.finish()?;
        Ok(Certificate {
            bytes,
            verification_url,
            lines,
            qr_version,
        })
    }
}

fn encode_qr(payload: &str) -> Result<QrCode, RenderError> {
    let too_large = |needed: String| RenderError::PayloadTooLarge {
        len: payload.len(),
        needed,
    };
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M).map_err(|e| {
        match e {
            QrError::DataTooLong => too_large("more than version 40".to_string()),
            other => RenderError::QrEncoding(other.to_string()),
        }
    })?;
    match code.version() {
        Version::Normal(v) if v <= MAX_QR_VERSION => Ok(code),
        Version::Normal(v) | Version::Micro(v) => Err(too_large(format!("version {v}"))),
    }
}

/// Largest font size up to `max` at which `text` fits between the margins.
fn fit_size(text: &str, max: f32) -> f32 {
    let available = PAGE_WIDTH - 2.0 * MARGIN;
    let at_one_point = text_width(text, 1.0);
    if at_one_point <= 0.0 {
        return max;
    }
    (available / at_one_point).min(max)
}

/// Approximate Helvetica advance width. Exact metrics would need the AFM
/// tables; the average glyph is close enough for centring and wrapping.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.52
}

/// Split a word wider than `available` into pieces that each fit.
fn word_pieces(word: &str, size: f32, available: f32) -> Vec<String> {
    let per_line = ((available / text_width("m", size)) as usize).max(1);
    let chars: Vec<char> = word.chars().collect();
    chars.chunks(per_line).map(|piece| piece.iter().collect()).collect()
}

/// Map to WinAnsi-compatible single bytes. Characters outside Latin-1
/// become `?` since the standard Type1 fonts cannot draw them. The C1
/// controls U+0080..=U+009F do too: WinAnsi puts curly quotes and other
/// glyphs at those codes.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if !(0x80..=0x9f).contains(&b) => b,
            _ => b'?',
        })
        .collect()
}

// ─── Page builder ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Oblique => "F3",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

/// Top-down cursor over a single page of content-stream operations.
struct PageBuilder {
    operations: Vec<Operation>,
    lines: Vec<String>,
    cursor: f32,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            lines: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn gap(&mut self, points: f32) {
        self.cursor -= points;
    }

    fn text(&mut self, font: Font, size: f32, text: &str, align: Align) {
        self.cursor -= size * 1.2;
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(MARGIN),
        };
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), Object::Real(size)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(self.cursor)]),
            Operation::new("Tj", vec![Object::string_literal(latin1(text))]),
            Operation::new("ET", vec![]),
        ]);
        self.lines.push(text.to_string());
    }

    /// Greedy word wrap between the margins. Words too wide for a line on
    /// their own are broken across lines.
    fn wrapped(&mut self, font: Font, size: f32, text: &str, align: Align) {
        let available = PAGE_WIDTH - 2.0 * MARGIN;
        let mut line = String::new();
        for word in text.split_whitespace().flat_map(|w| word_pieces(w, size, available)) {
            let candidate = if line.is_empty() {
                word.clone()
            } else {
                format!("{line} {word}")
            };
            if !line.is_empty() && text_width(&candidate, size) > available {
                self.text(font, size, &line, align);
                line = word;
            } else {
                line = candidate;
            }
        }
        if !line.is_empty() {
            self.text(font, size, &line, align);
        }
    }

    fn rule(&mut self) {
        self.operations.extend([
            Operation::new("w", vec![Object::Real(0.75)]),
            Operation::new("m", vec![Object::Real(MARGIN), Object::Real(self.cursor)]),
            Operation::new("l", vec![Object::Real(PAGE_WIDTH - MARGIN), Object::Real(self.cursor)]),
            Operation::new("S", vec![]),
        ]);
    }

    /// Draw the symbol centred, top edge at the cursor.
    fn qr(&mut self, code: &QrCode) {
        let width = code.width();
        let modules = width + 2 * QR_QUIET_ZONE;
        let module = QR_SIZE / modules as f32;
        let left = (PAGE_WIDTH - QR_SIZE) / 2.0;
        let top = self.cursor;

        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
        for (i, color) in code.to_colors().into_iter().enumerate() {
            if color != Color::Dark {
                continue;
            }
            let (col, row) = (i % width, i / width);
            let x = left + (col + QR_QUIET_ZONE) as f32 * module;
            let y = top - (row + QR_QUIET_ZONE + 1) as f32 * module;
            self.operations.push(Operation::new(
                "re",
                vec![Object::Real(x), Object::Real(y), Object::Real(module), Object::Real(module)],
            ));
        }
        self.operations.push(Operation::new("f", vec![]));
        self.operations.push(Operation::new("Q", vec![]));
        self.cursor -= QR_SIZE;
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut pdf = PdfDocument::with_version("1.5");
        let pages_id = pdf.new_object_id();

        let regular = add_font(&mut pdf, "Helvetica");
        let bold = add_font(&mut pdf, "Helvetica-Bold");
        let oblique = add_font(&mut pdf, "Helvetica-Oblique");
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
                "F3" => oblique,
            },
        });

        let content = Content {
            operations: self.operations,
        };
        let encoded = content.encode().map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), Object::Real(PAGE_WIDTH), Object::Real(PAGE_HEIGHT)],
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = pdf.add_object(dictionary! {
            "Producer" => Object::string_literal("Smart Municipal Services"),
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        pdf.save_to(&mut bytes)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(bytes)
    }
}

fn add_font(pdf: &mut PdfDocument, base_font: &str) -> ObjectId {
    pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

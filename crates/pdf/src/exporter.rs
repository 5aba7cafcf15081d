//! PDF serialization of laid-out service sheets.

use crate::font::PdfFont;
use guiador_core::layout::{PAGE_HEIGHT, PAGE_WIDTH};
use guiador_core::{AssetPaths, DrawOp, Error, Layout, LayoutEngine, Result, ServiceDocument};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::path::{Path, PathBuf};

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Stroke width for the notes box.
const LINE_WIDTH_MM: f32 = 0.2;

/// Resource names inside page content streams.
const FONT_RESOURCE: &str = "F1";
const LOGO_RESOURCE: &str = "Im1";

fn pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

fn render_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::RenderError(format!("{}: {}", context, e))
}

/// Decoded logo image ready to embed.
struct Logo {
    stream: Stream,
    /// Height divided by width.
    aspect: f32,
}

/// Exporter producing the downloadable PDF.
#[derive(Debug, Clone)]
pub struct PdfExporter {
    font: PathBuf,
    logo: Option<PathBuf>,
}

impl PdfExporter {
    /// Create an exporter using the TrueType font at `font` and no logo.
    pub fn new(font: impl Into<PathBuf>) -> Self {
        Self {
            font: font.into(),
            logo: None,
        }
    }

    /// Set the logo image path. A missing or unreadable logo is skipped at
    /// export time.
    pub fn with_logo(mut self, logo: Option<PathBuf>) -> Self {
        self.logo = logo;
        self
    }

    /// Exporter configured from the asset locations. The logo is only used
    /// when its file exists.
    pub fn from_assets(paths: &AssetPaths) -> Self {
        Self::new(&paths.font).with_logo(paths.existing_logo().map(Path::to_path_buf))
    }

    /// Download name for a document, `GUIADOR_<yyyyMMdd>_<HHmmss>.pdf`.
    pub fn export_filename(document: &ServiceDocument) -> String {
        document.file_name("pdf")
    }

    /// Render the document to PDF bytes.
    ///
    /// A missing or invalid font is a `RenderError`; the logo is optional.
    pub fn serialize(&self, document: &ServiceDocument) -> Result<Vec<u8>> {
        let font_data = fs::read(&self.font).map_err(|e| {
            render_error(&format!("cannot read font '{}'", self.font.display()), e)
        })?;
        let mut font = PdfFont::parse(&font_data)?;
        let logo = self.load_logo();

        let layout = LayoutEngine::new(&font)
            .with_logo(logo.is_some())
            .layout(document);

        let title = format!("GUIADOR {}", document.generated_at.format("%Y-%m-%d"));
        let mut doc = build_document(&layout, &mut font, logo)?;
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal("guiador"),
            "CreationDate" => Object::string_literal(
                document.generated_at.format("D:%Y%m%d%H%M%S").to_string()
            ),
        });
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| render_error("cannot write PDF", e))?;

        log::debug!(
            "exported {} page(s), {} bytes",
            layout.pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Serialize and write to `dir` under the default export name.
    pub fn export_to_dir(&self, document: &ServiceDocument, dir: &Path) -> Result<PathBuf> {
        let bytes = self.serialize(document)?;
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::export_filename(document));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn load_logo(&self) -> Option<Logo> {
        let path = self.logo.as_ref()?;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Skipping logo {}: {}", path.display(), e);
                return None;
            }
        };
        let stream = match lopdf::xobject::image_from(bytes) {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("Skipping logo {}: {}", path.display(), e);
                return None;
            }
        };

        let dimension = |key: &[u8]| stream.dict.get(key).and_then(Object::as_i64).ok();
        match (dimension(b"Width"), dimension(b"Height")) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(Logo {
                aspect: h as f32 / w as f32,
                stream,
            }),
            _ => {
                log::warn!("Skipping logo {}: missing image size", path.display());
                None
            }
        }
    }
}

/// Build the PDF object graph for a layout.
fn build_document(
    layout: &Layout,
    font: &mut PdfFont<'_>,
    logo: Option<Logo>,
) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let logo_aspect = logo.as_ref().map(|l| l.aspect);
    let contents: Vec<Vec<u8>> = layout
        .pages
        .iter()
        .map(|page| {
            let operations: Vec<Operation> = page
                .ops
                .iter()
                .flat_map(|op| operations_for(op, font, logo_aspect))
                .collect();
            Content { operations }
                .encode()
                .map_err(|e| render_error("cannot encode page content", e))
        })
        .collect::<Result<_>>()?;

    let font_id = font.embed(&mut doc);
    let mut resources = dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    };
    if let Some(logo) = logo {
        let image_id = doc.add_object(logo.stream);
        resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
    }
    let resources_id = doc.add_object(resources);

    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        pt(PAGE_WIDTH).into(),
        pt(PAGE_HEIGHT).into(),
    ];
    let kids: Vec<Object> = contents
        .into_iter()
        .map(|content| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_id.into()
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// Content-stream operations for one drawing op. Converts top-left
/// millimetres into bottom-left points.
fn operations_for(op: &DrawOp, font: &mut PdfFont<'_>, logo_aspect: Option<f32>) -> Vec<Operation> {
    match op {
        DrawOp::Text { x, y, size, text } => vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_RESOURCE.into(), (*size).into()]),
            Operation::new("Td", vec![pt(*x).into(), pt(PAGE_HEIGHT - *y).into()]),
            Operation::new("Tj", vec![font.encode(text)]),
            Operation::new("ET", vec![]),
        ],
        DrawOp::Rect { x, y, width, height } => vec![
            Operation::new("w", vec![pt(LINE_WIDTH_MM).into()]),
            Operation::new(
                "re",
                vec![
                    pt(*x).into(),
                    pt(PAGE_HEIGHT - *y - *height).into(),
                    pt(*width).into(),
                    pt(*height).into(),
                ],
            ),
            Operation::new("S", vec![]),
        ],
        DrawOp::Logo { x, y, width } => {
            let Some(aspect) = logo_aspect else {
                return Vec::new();
            };
            let height = width * aspect;
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        pt(*width).into(),
                        0.into(),
                        0.into(),
                        pt(height).into(),
                        pt(*x).into(),
                        pt(PAGE_HEIGHT - *y - height).into(),
                    ],
                ),
                Operation::new("Do", vec![LOGO_RESOURCE.into()]),
                Operation::new("Q", vec![]),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guiador_core::{Cell, Catalog, LookupIndex, ReferenceTable, Slot, WizardConfig, WizardState};
    use chrono::NaiveDate;

    const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/usr/local/share/fonts/DejaVuSans.ttf",
    ];

    /// DejaVu Sans from `GUIADOR_TEST_FONT` or the usual system locations.
    fn system_font() -> PathBuf {
        std::env::var_os("GUIADOR_TEST_FONT")
            .map(PathBuf::from)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
            .find(|p| p.is_file())
            .expect("DejaVu Sans not found; install it or set GUIADOR_TEST_FONT")
    }

    /// Text of every page, in page order.
    fn pdf_text(bytes: &[u8]) -> String {
        let pdf = Document::load_mem(bytes).unwrap();
        let pages: Vec<u32> = pdf.get_pages().keys().copied().collect();
        pdf.extract_text(&pages).unwrap()
    }

    fn index(rows: &[(&str, &str)]) -> LookupIndex {
        let rows = rows
            .iter()
            .map(|(n, t)| vec![Cell::Text(n.to_string()), Cell::Text(t.to_string())])
            .collect();
        let table =
            ReferenceTable::new("test.xlsx", vec!["numero".into(), "titulo".into()], rows).unwrap();
        LookupIndex::new(table)
    }

    fn catalog() -> Catalog {
        Catalog::new(
            index(&[("101", "Amor de Dios"), ("205", "Gracia Sublime")]),
            index(&[("205", "Gracia Sublime"), ("7", "Cristo Viene")]),
        )
    }

    fn document(configure: impl FnOnce(&mut WizardState, &Catalog)) -> ServiceDocument {
        let catalog = catalog();
        let mut state = WizardState::new();
        configure(&mut state, &catalog);
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        state.assemble(at).unwrap()
    }

    fn simple_document() -> ServiceDocument {
        document(|s, c| {
            s.confirm(WizardConfig::new(2, 1).with_tithe_chorus(true)).unwrap();
            s.set_code(c, Slot::Hymn(0), "101").unwrap();
            s.set_code(c, Slot::Hymn(1), "999").unwrap();
            s.set_code(c, Slot::Chorus(0), "7").unwrap();
            s.set_code(c, Slot::TitheChorus, "205").unwrap();
            s.set_preacher("Hno. José").unwrap();
        })
    }

    #[test]
    fn test_from_assets_uses_existing_logo() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AssetPaths::in_dir(dir.path());
        assert_eq!(PdfExporter::from_assets(&paths).logo, None);

        fs::write(&paths.logo, b"png").unwrap();
        assert_eq!(PdfExporter::from_assets(&paths).logo, Some(paths.logo.clone()));
        assert_eq!(PdfExporter::from_assets(&paths).font, paths.font);
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            PdfExporter::export_filename(&simple_document()),
            "GUIADOR_20240301_183000.pdf"
        );
    }

    #[test]
    fn test_missing_font_is_render_error() {
        let exporter = PdfExporter::new("/nonexistent/DejaVuSans.ttf");
        let err = exporter.serialize(&simple_document()).unwrap_err();
        assert!(matches!(err, Error::RenderError(_)));
    }

    #[test]
    fn test_invalid_font_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("DejaVuSans.ttf");
        fs::write(&font, b"not a font").unwrap();

        let err = PdfExporter::new(&font)
            .serialize(&simple_document())
            .unwrap_err();
        assert!(matches!(err, Error::RenderError(_)));
    }

    #[test]
    #[ignore = "needs DejaVu Sans"]
    fn test_serialize_produces_pdf() {
        let font = system_font();
        let bytes = PdfExporter::new(font).serialize(&simple_document()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let text = pdf_text(&bytes);
        for expected in [
            "GUIADOR IDMJI",
            "Fecha: 2024-03-01 18:30:00",
            "HIMNOS:",
            "101  Amor de Dios",
            "COROS:",
            "7  Cristo Viene",
            "CORO DIEZMO:",
            "205  Gracia Sublime",
            "PREDICADOR:",
            "Hno. José",
            "NOTA:",
        ] {
            assert!(text.contains(expected), "missing {:?} in {:?}", expected, text);
        }
        assert!(!text.contains("999"));
        assert!(!text.contains("CORO FINAL:"));
    }

    #[test]
    #[ignore = "needs DejaVu Sans"]
    fn test_missing_logo_is_skipped() {
        let font = system_font();
        let exporter =
            PdfExporter::new(font).with_logo(Some(PathBuf::from("/nonexistent/logo.png")));
        assert!(exporter.serialize(&simple_document()).is_ok());
    }

    #[test]
    #[ignore = "needs DejaVu Sans"]
    fn test_undecodable_logo_is_skipped() {
        let font = system_font();
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        fs::write(&logo, b"not an image").unwrap();

        let exporter = PdfExporter::new(font).with_logo(Some(logo));
        assert!(exporter.serialize(&simple_document()).is_ok());
    }

    #[test]
    #[ignore = "needs DejaVu Sans"]
    fn test_blank_preacher_and_long_notes() {
        let font = system_font();
        let notes: String = "Santa cena y oracion por los enfermos. "
            .chars()
            .cycle()
            .take(500)
            .collect();
        let doc = document(|s, _| {
            s.confirm(WizardConfig::new(0, 0)).unwrap();
            s.set_preacher("").unwrap();
            s.set_notes(notes).unwrap();
        });

        let bytes = PdfExporter::new(font).serialize(&doc).unwrap();
        let text = pdf_text(&bytes);
        assert!(text.contains("PREDICADOR:"));
        assert!(text.contains("NOTA:"));
        assert!(text.contains("Santa cena y oracion"));
        assert!(!text.contains("HIMNOS:"));
    }

    #[test]
    #[ignore = "needs DejaVu Sans"]
    fn test_full_service_paginates() {
        let font = system_font();
        let doc = document(|s, c| {
            s.confirm(
                WizardConfig::new(10, 10)
                    .with_tithe_chorus(true)
                    .with_final_chorus(true),
            )
            .unwrap();
            for i in 0..10 {
                s.set_code(c, Slot::Hymn(i), "101").unwrap();
                s.set_code(c, Slot::Chorus(i), "205").unwrap();
            }
            s.set_code(c, Slot::TitheChorus, "205").unwrap();
            s.set_code(c, Slot::FinalChorus, "7").unwrap();
            s.set_notes("Anuncio\n".repeat(30)).unwrap();
        });

        let bytes = PdfExporter::new(font).serialize(&doc).unwrap();
        let pdf = Document::load_mem(&bytes).unwrap();
        assert!(pdf.get_pages().len() > 1);

        let text = pdf_text(&bytes);
        assert_eq!(text.matches("101  Amor de Dios").count(), 10);
        assert!(text.contains("CORO FINAL:"));
        assert!(text.contains("7  Cristo Viene"));
    }

    #[test]
    #[ignore = "needs DejaVu Sans"]
    fn test_export_to_dir() {
        let font = system_font();
        let dir = tempfile::tempdir().unwrap();
        let doc = simple_document();

        let path = PdfExporter::new(font).export_to_dir(&doc, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("GUIADOR_20240301_183000.pdf"));
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF"));
    }
}

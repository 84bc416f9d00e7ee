use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use docx_rs::{Docx, Paragraph, Run};
use manjaword_core::{Delta, DeltaOp};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::error::BackendError;
use crate::files::reject_control_chars;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 15.0;
const FIRST_LINE_MM: f32 = 280.0;
const LINE_STEP_MM: f32 = 8.0;
const BOTTOM_LIMIT_MM: f32 = 15.0;
const FONT_SIZE_PT: f32 = 12.0;

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Docx,
    Pdf,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Docx => "docx",
            ExportKind::Pdf => "pdf",
        }
    }
}

/// Non-blank text lines of a delta. Formatting and embeds are dropped.
pub fn delta_lines(delta: &Delta) -> Vec<String> {
    delta
        .ops
        .iter()
        .filter_map(|op| match op {
            DeltaOp::Insert {
                insert: Value::String(text),
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .flat_map(|text| text.split('\n'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Force the export extension onto `path`.
pub fn with_extension(mut path: PathBuf, kind: ExportKind) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) != Some(kind.extension()) {
        path.set_extension(kind.extension());
    }
    path
}

/// One paragraph per line.
pub fn render_docx(lines: &[String]) -> Result<Vec<u8>, BackendError> {
    let doc = lines.iter().fold(Docx::new(), |doc, line| {
        doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
    });

    let mut bytes = Vec::new();
    doc.build()
        .pack(Cursor::new(&mut bytes))
        .map_err(|e| BackendError::Docx(e.to_string()))?;
    Ok(bytes)
}

/// Single A4 page of Helvetica lines; lines that do not fit are cut off.
pub fn render_pdf(lines: &[String]) -> Result<Vec<u8>, BackendError> {
    let (doc, page, layer) = PdfDocument::new(
        "ManjaWord Export",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| BackendError::Pdf(e.to_string()))?;

    let mut y = FIRST_LINE_MM;
    for line in lines {
        if y < BOTTOM_LIMIT_MM {
            debug!("PDF page full, dropping remaining lines");
            break;
        }
        layer.use_text(line.as_str(), FONT_SIZE_PT, Mm(MARGIN_LEFT_MM), Mm(y), &font);
        y -= LINE_STEP_MM;
    }

    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(&mut bytes);
        doc.save(&mut writer)
            .map_err(|e| BackendError::Pdf(e.to_string()))?;
        writer.flush()?;
    }
    Ok(bytes)
}

/// Render `content` and write it to `path` (extension forced). Returns the written path.
pub async fn export(kind: ExportKind, path: PathBuf, content: &Delta) -> Result<PathBuf, BackendError> {
    let path = with_extension(path, kind);
    reject_control_chars(&path)?;

    let lines = delta_lines(content);
    let bytes = match kind {
        ExportKind::Docx => render_docx(&lines)?,
        ExportKind::Pdf => render_pdf(&lines)?,
    };

    write_bytes(&path, &bytes).await?;
    debug!("Exported {} lines to {}", lines.len(), path.display());
    Ok(path)
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    Ok(())
}

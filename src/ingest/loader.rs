//! Document loading: one string per page.

use std::path::Path;

use super::IngestError;

/// Loads `path` into a sequence of page texts.
///
/// The path is checked before any parsing work starts. PDF files go
/// through `pdf-extract`, one entry per page; any other file is read as
/// UTF-8 and split into pages on form-feed characters (a file without
/// form feeds is a single page).
pub fn load_pages(path: &Path) -> Result<Vec<String>, IngestError> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }

    if is_pdf(path) {
        return pdf_extract::extract_text_by_pages(path)
            .map_err(|e| IngestError::Load(e.to_string()));
    }

    let text = std::fs::read_to_string(path).map_err(|e| IngestError::Load(e.to_string()))?;
    Ok(text.split('\u{0C}').map(str::to_string).collect())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

//! Text extraction and chunking for uploaded files

use crate::{Error, Result};

/// Text stored for PDFs whose content cannot be read
pub const UNREADABLE_PDF_TEXT: &str = "Could not extract text from PDF.";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub file_type: String,
}

/// Extract text according to the file extension. Unsupported files yield
/// type `unknown` and no text.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<ExtractedText> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let (text, file_type) = match extension.as_str() {
        "pdf" => (extract_pdf(bytes), "pdf"),
        "txt" => (decode_utf8(file_name, bytes)?, "txt"),
        "csv" => (extract_csv(file_name, bytes)?, "csv"),
        "json" => (extract_json(file_name, bytes)?, "json"),
        _ => (String::new(), "unknown"),
    };

    Ok(ExtractedText {
        text,
        file_type: file_type.to_string(),
    })
}

fn extract_pdf(bytes: &[u8]) -> String {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!("[INGEST] pdf-extract failed: {}", e);
            UNREADABLE_PDF_TEXT.to_string()
        }
        Err(_) => {
            tracing::error!("[INGEST] pdf-extract panicked");
            UNREADABLE_PDF_TEXT.to_string()
        }
    }
}

fn decode_utf8(file_name: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::Extraction(format!("{file_name} is not valid UTF-8: {e}")))
}

/// Cells joined with commas, rows with newlines
fn extract_csv(file_name: &str, bytes: &[u8]) -> Result<String> {
    let decoded = decode_utf8(file_name, bytes)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(decoded.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Extraction(format!("{file_name}: {e}")))?;
        rows.push(record.iter().collect::<Vec<_>>().join(","));
    }
    Ok(rows.join("\n"))
}

fn extract_json(file_name: &str, bytes: &[u8]) -> Result<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::Extraction(format!("{file_name} is not valid JSON: {e}")))?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Split text into windows of `chunk_size` words; each window starts
/// `chunk_size - overlap` words after the previous one.
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    (0..words.len())
        .step_by(step)
        .map(|start| {
            let end = (start + chunk_size).min(words.len());
            words[start..end].join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_and_unknown() {
        let txt = extract_text("notes.txt", "héllo desk".as_bytes()).unwrap();
        assert_eq!(txt.file_type, "txt");
        assert_eq!(txt.text, "héllo desk");

        let other = extract_text("deck.pptx", b"PK\x03\x04").unwrap();
        assert_eq!(other.file_type, "unknown");
        assert!(other.text.is_empty());

        let no_ext = extract_text("README", b"text").unwrap();
        assert_eq!(no_ext.file_type, "unknown");
    }

    #[test]
    fn test_csv_rows_joined() {
        let csv = extract_text("prices.csv", b"date,close\n2024-01-02,101.5\n2024-01-03,99\n").unwrap();
        assert_eq!(csv.file_type, "csv");
        assert_eq!(csv.text, "date,close\n2024-01-02,101.5\n2024-01-03,99");
    }

    #[test]
    fn test_json_pretty_printed() {
        let json = extract_text("params.json", br#"{"lookback":20}"#).unwrap();
        assert_eq!(json.file_type, "json");
        assert_eq!(json.text, "{\n  \"lookback\": 20\n}");

        assert!(matches!(
            extract_text("broken.json", b"{oops"),
            Err(Error::Extraction(_))
        ));
    }

    #[test]
    fn test_unreadable_pdf() {
        let pdf = extract_text("report.pdf", b"not a pdf at all").unwrap();
        assert_eq!(pdf.file_type, "pdf");
        assert_eq!(pdf.text, UNREADABLE_PDF_TEXT);
    }

    #[test]
    fn test_invalid_utf8_txt() {
        assert!(extract_text("bin.txt", &[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_chunk_windows_overlap() {
        let text: String = (0..600).map(|i| format!("w{i} ")).collect();
        let chunks = chunk_words(&text, 300, 50);

        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("w0 "));
        assert!(chunks[0].ends_with("w299"));
        assert!(chunks[1].starts_with("w250 "));
        assert!(chunks[1].ends_with("w549"));
        assert!(chunks[2].starts_with("w500 "));
        assert!(chunks[2].ends_with("w599"));
    }

    #[test]
    fn test_chunk_short_and_empty() {
        assert_eq!(chunk_words("just a few words", 300, 50), vec!["just a few words"]);
        assert!(chunk_words("   \n ", 300, 50).is_empty());
    }
}

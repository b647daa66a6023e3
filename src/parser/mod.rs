//! Raw scrape-dump parsing with encoding and delimiter auto-detection.
//!
//! The scraping collaborator hands over one listing per file: a
//! two-column delimited dump (`label<delim>value`, one pair per line)
//! or a JSON array of pairs. Source sites serve several legacy
//! encodings, so bytes are sniffed before decoding. No source-specific
//! logic here. Labels pass through exactly as scraped (the registry
//! emits one with a trailing tab, and the rename maps expect it).

use std::path::Path;

use crate::table::RawPair;

/// Dump parsing error with context
#[derive(Debug, Clone)]
pub struct DumpError {
    pub line: usize,
    pub label: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for DumpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.label, &self.value) {
            (Some(label), Some(value)) => {
                write!(
                    f,
                    "Line {}, label '{}' (value '{}'): {}",
                    self.line, label, value, self.message
                )
            }
            (Some(label), None) => {
                write!(f, "Line {}, label '{}': {}", self.line, label, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for DumpError {}

impl DumpError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            label: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Result of parsing a dump, with detection metadata
#[derive(Debug, Clone)]
pub struct RawDump {
    /// Scraped pairs in listing order
    pub pairs: Vec<RawPair>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<String, DumpError> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .or_else(|_| Ok(String::from_utf8_lossy(bytes).to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        _ => {
            // Fallback: try UTF-8 with lossy conversion
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
    .map_err(|e: std::string::FromUtf8Error| DumpError::new(0, format!("Encoding error: {}", e)))
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse dump text into raw pairs with an explicit delimiter.
///
/// An empty second column means the site listed the attribute without a
/// value. A leading `label/value`-style header line is skipped.
pub fn parse_pairs(content: &str, delimiter: char) -> Result<Vec<RawPair>, DumpError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut pairs = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        let line_num = idx + 1;
        let record =
            record.map_err(|e| DumpError::new(line_num, format!("Cannot read line: {}", e)))?;

        let label = record.get(0).unwrap_or("");
        let value = record.get(1).unwrap_or("");

        if label.is_empty() && value.is_empty() {
            continue;
        }
        if idx == 0 && is_header(label, value) {
            continue;
        }

        let value = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        pairs.push((label.to_string(), value));
    }

    Ok(pairs)
}

fn is_header(label: &str, value: &str) -> bool {
    matches!(label.trim().to_lowercase().as_str(), "key" | "label")
        && value.trim().eq_ignore_ascii_case("value")
}

/// Parse a dump file with auto-detection of encoding and delimiter.
pub fn parse_dump_file<P: AsRef<Path>>(path: P) -> Result<RawDump, DumpError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| DumpError::new(0, format!("Cannot read file: {}", e)))?;

    parse_dump_bytes(&bytes)
}

/// Parse dump bytes with auto-detection of encoding and delimiter.
pub fn parse_dump_bytes(bytes: &[u8]) -> Result<RawDump, DumpError> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let pairs = parse_pairs(&content, delimiter)?;

    Ok(RawDump {
        pairs,
        encoding,
        delimiter,
    })
}

/// Parse a JSON array of `[label, value]` pairs (`value` may be null).
pub fn pairs_from_json(json: &str) -> Result<Vec<RawPair>, DumpError> {
    serde_json::from_str(json).map_err(|e| DumpError::new(0, format!("Invalid pair JSON: {}", e)))
}

//! Inline previews for the object details page.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::storage::constants::{PREVIEW_MAX_CHARS, PREVIEW_MAX_ROWS};

/// How an object can be shown inline, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Text,
    Csv,
    Json,
    Image(&'static str),
}

impl PreviewKind {
    pub fn for_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1.to_lowercase();
        match ext.as_str() {
            "txt" | "log" | "md" => Some(Self::Text),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "png" => Some(Self::Image("image/png")),
            "jpg" | "jpeg" => Some(Self::Image("image/jpeg")),
            "gif" => Some(Self::Image("image/gif")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Preview {
    Text { content: String, truncated: bool },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        truncated: bool,
    },
    Json { content: String },
    InvalidJson,
    Image { data_url: String },
    TooLarge { size: u64 },
    Unsupported,
}

impl Preview {
    pub fn render(kind: PreviewKind, data: &[u8]) -> Self {
        match kind {
            PreviewKind::Text => Self::text(data),
            // Malformed CSV is still worth showing as text.
            PreviewKind::Csv => Self::table(data).unwrap_or_else(|_| Self::text(data)),
            PreviewKind::Json => match serde_json::from_slice::<serde_json::Value>(data) {
                Ok(value) => match serde_json::to_string_pretty(&value) {
                    Ok(content) => Self::Json { content },
                    Err(_) => Self::InvalidJson,
                },
                Err(_) => Self::InvalidJson,
            },
            PreviewKind::Image(mime) => Self::Image {
                data_url: format!("data:{mime};base64,{}", STANDARD.encode(data)),
            },
        }
    }

    fn text(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let mut chars = text.chars();
        let head: String = chars.by_ref().take(PREVIEW_MAX_CHARS).collect();
        let truncated = chars.next().is_some();
        let content = if truncated { format!("{head}...") } else { head };
        Self::Text { content, truncated }
    }

    /// Header row plus the first rows of a CSV document.
    fn table(data: &[u8]) -> csv::Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut records = reader.records();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in records.by_ref().take(PREVIEW_MAX_ROWS) {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        let truncated = records.next().is_some();
        Ok(Self::Table {
            headers,
            rows,
            truncated,
        })
    }
}

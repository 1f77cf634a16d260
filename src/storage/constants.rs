// Preview related constants
// Objects above this size are never fetched for an inline preview
pub const PREVIEW_MAX_BYTES: u64 = 10 * 1024 * 1024;
// Number of characters shown for text previews
pub const PREVIEW_MAX_CHARS: usize = 1000;
// Number of data rows shown for CSV previews
pub const PREVIEW_MAX_ROWS: usize = 1000;

// Upload related constants
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

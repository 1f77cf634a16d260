//! Server-side HTML pages.

use std::fmt::Write;

use crate::browser::{Browser, Details, Listing, Notice, NoticeLevel};
use crate::config::BrowserConfig;
use crate::preview::Preview;
use crate::storage::DirectoryEntry;
use crate::storage::utils::path::parent_prefix;
use crate::storage::utils::size::format_size;

const STYLE: &str = "body{font-family:sans-serif;margin:2em auto;max-width:64em}\
table{border-collapse:collapse;width:100%}\
td,th{padding:.3em .6em;text-align:left;border-bottom:1px solid #ddd}\
.notice{padding:.5em;margin:.3em 0;border-radius:4px}\
.success{background:#e6f4ea}.info{background:#e8f0fe}.error{background:#fce8e6}\
pre{background:#f6f8fa;padding:1em;overflow:auto}\
form.inline{display:inline}";

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `/?path=<prefix>` link target, or `/` at the container root.
pub fn listing_href(prefix: &str) -> String {
    if prefix.is_empty() {
        "/".to_string()
    } else {
        format!("/?path={}", urlencoding::encode(prefix))
    }
}

fn href(route: &str, path: &str) -> String {
    format!("{route}?path={}", urlencoding::encode(path))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

fn notices_html(notices: &[Notice]) -> String {
    let mut out = String::new();
    for notice in notices {
        let class = match notice.level {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        let _ = write!(
            out,
            "<div class=\"notice {class}\">{}</div>",
            escape(&notice.message)
        );
    }
    out
}

fn session_header(browser: &Browser) -> String {
    let Some(credentials) = browser.session().credentials() else {
        return String::new();
    };
    format!(
        "<p>Account <b>{}</b> &middot; container <b>{}</b> &middot; token <code>{}</code> \
         <form class=\"inline\" method=\"post\" action=\"/disconnect\">\
         <button type=\"submit\">Disconnect</button></form></p>",
        escape(credentials.account()),
        escape(credentials.container()),
        escape(&credentials.token().masked()),
    )
}

/// Connect form shown while the session is disconnected.
pub fn connect_page(config: &BrowserConfig, notices: &[Notice]) -> String {
    let account = config.default_account.as_deref().unwrap_or_default();
    let container = config.default_container.as_deref().unwrap_or_default();
    let body = format!(
        "<h1>Connect to a container</h1>{}\
         <form method=\"post\" action=\"/connect\">\
         <p><label>Account name or URL <input name=\"account\" value=\"{}\" required></label></p>\
         <p><label>Container <input name=\"container\" value=\"{}\" required></label></p>\
         <p><label>SAS token <input name=\"token\" type=\"password\" autocomplete=\"off\" required></label></p>\
         <p><button type=\"submit\">Connect</button></p></form>",
        notices_html(notices),
        escape(account),
        escape(container),
    );
    layout("Connect", &body)
}

fn entry_row(config: &BrowserConfig, entry: &DirectoryEntry) -> String {
    let mut row = String::from("<tr>");
    if entry.is_directory {
        let _ = write!(
            row,
            "<td>&#128193; <a href=\"{}\">{}/</a></td>",
            escape(&listing_href(&entry.path)),
            escape(&entry.name)
        );
    } else {
        let _ = write!(
            row,
            "<td>&#128196; <a href=\"{}\">{}</a></td>",
            escape(&href("/view", &entry.path)),
            escape(&entry.name)
        );
    }

    if config.show_file_details {
        let size = entry.size.map(format_size).unwrap_or_default();
        let modified = entry
            .last_modified
            .map(|ts| config.format_time(ts))
            .unwrap_or_default();
        let _ = write!(row, "<td>{size}</td><td>{}</td>", escape(&modified));
    }

    row.push_str("<td>");
    if !entry.is_directory {
        let _ = write!(
            row,
            "<a href=\"{}\">Download</a> ",
            escape(&href("/download", &entry.path))
        );
    }
    let _ = write!(
        row,
        "<a href=\"{}\">Delete</a></td></tr>",
        escape(&href("/delete", &entry.path))
    );
    row
}

/// Directory listing with breadcrumbs, search and upload forms.
///
/// `listing` is `None` when listing failed; the error is among `notices`.
pub fn browser_page(browser: &Browser, listing: Option<&Listing>, notices: &[Notice]) -> String {
    let config = browser.config();
    let cursor = browser.cursor();
    let prefix = cursor.prefix();
    let mut body = String::from("<h1>Storage browser</h1>");
    body.push_str(&session_header(browser));
    body.push_str(&notices_html(notices));

    body.push_str("<nav>");
    let crumbs = cursor.breadcrumbs();
    for (idx, crumb) in crumbs.iter().enumerate() {
        if idx > 0 {
            body.push_str(" / ");
        }
        let _ = write!(
            body,
            "<a href=\"{}\">{}</a>",
            escape(&listing_href(&crumb.path)),
            escape(&crumb.label)
        );
    }
    if !cursor.is_at_root() {
        let _ = write!(
            body,
            " &middot; <a href=\"{}\">Up</a>",
            escape(&listing_href(&parent_prefix(&prefix)))
        );
    }
    body.push_str("</nav>");

    let query = listing.and_then(|l| l.query.as_deref()).unwrap_or_default();
    let _ = write!(
        body,
        "<form method=\"get\" action=\"/\"><input type=\"hidden\" name=\"path\" value=\"{}\">\
         <input name=\"q\" placeholder=\"Search this folder\" value=\"{}\">\
         <button type=\"submit\">Search</button></form>",
        escape(&prefix),
        escape(query)
    );

    let accept = if config.allowed_extensions.is_empty() {
        String::new()
    } else {
        format!(" accept=\"{}\"", escape(&config.allowed_extensions.join(",")))
    };
    let _ = write!(
        body,
        "<form method=\"post\" action=\"{}\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"files\" multiple{accept}>\
         <button type=\"submit\">Upload</button></form>",
        escape(&href("/upload", &prefix))
    );

    if let Some(listing) = listing {
        if listing.entries.is_empty() {
            body.push_str("<p>This folder is empty.</p>");
        } else {
            body.push_str("<table><tr><th>Name</th>");
            if config.show_file_details {
                body.push_str("<th>Size</th><th>Modified</th>");
            }
            body.push_str("<th></th></tr>");
            for entry in &listing.entries {
                body.push_str(&entry_row(config, entry));
            }
            body.push_str("</table>");
        }
    }

    layout("Storage browser", &body)
}

/// Ask before anything is deleted.
pub fn confirm_delete_page(browser: &Browser, path: &str, notices: &[Notice]) -> String {
    let what = if path.ends_with('/') {
        "the folder and every object below it"
    } else {
        "the file"
    };
    let body = format!(
        "<h1>Delete</h1>{}{}<p>Permanently delete {what} <code>{}</code>? This cannot be undone.</p>\
         <form method=\"post\" action=\"/delete\">\
         <input type=\"hidden\" name=\"path\" value=\"{}\">\
         <input type=\"hidden\" name=\"confirm\" value=\"yes\">\
         <button type=\"submit\">Delete</button> <a href=\"{}\">Cancel</a></form>",
        session_header(browser),
        notices_html(notices),
        escape(path),
        escape(path),
        escape(&listing_href(&browser.cursor().prefix())),
    );
    layout("Delete", &body)
}

fn preview_html(preview: &Preview) -> String {
    match preview {
        Preview::Text { content, .. } | Preview::Json { content } => {
            format!("<pre>{}</pre>", escape(content))
        }
        Preview::Table {
            headers,
            rows,
            truncated,
        } => {
            let mut out = String::from("<table><tr>");
            for header in headers {
                let _ = write!(out, "<th>{}</th>", escape(header));
            }
            out.push_str("</tr>");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    let _ = write!(out, "<td>{}</td>", escape(cell));
                }
                out.push_str("</tr>");
            }
            out.push_str("</table>");
            if *truncated {
                let _ = write!(out, "<p>Showing the first {} rows.</p>", rows.len());
            }
            out
        }
        Preview::InvalidJson => "<p>Invalid JSON file</p>".to_string(),
        Preview::Image { data_url } => {
            format!("<img src=\"{}\" alt=\"preview\">", escape(data_url))
        }
        Preview::TooLarge { size } => {
            format!("<p>File too large to preview ({})</p>", format_size(*size))
        }
        Preview::Unsupported => "<p>No preview available for this file type.</p>".to_string(),
    }
}

/// Metadata table and preview of one object.
pub fn details_page(browser: &Browser, details: &Details, notices: &[Notice]) -> String {
    let config = browser.config();
    let meta = &details.meta;
    let mut body = format!(
        "<h1>{}</h1>{}{}<table>",
        escape(&meta.path),
        session_header(browser),
        notices_html(notices)
    );
    let _ = write!(body, "<tr><th>Size</th><td>{}</td></tr>", format_size(meta.size));
    if let Some(ts) = meta.last_modified {
        let _ = write!(
            body,
            "<tr><th>Modified</th><td>{}</td></tr>",
            escape(&config.format_time(ts))
        );
    }
    if let Some(content_type) = &meta.content_type {
        let _ = write!(body, "<tr><th>Content type</th><td>{}</td></tr>", escape(content_type));
    }
    if let Some(etag) = &meta.etag {
        let _ = write!(body, "<tr><th>ETag</th><td>{}</td></tr>", escape(etag));
    }
    let _ = write!(
        body,
        "</table><p><a href=\"{}\">Download</a> &middot; <a href=\"{}\">Back</a></p>{}",
        escape(&href("/download", &meta.path)),
        escape(&listing_href(&parent_prefix(&meta.path))),
        preview_html(&details.preview)
    );
    layout(&meta.path, &body)
}

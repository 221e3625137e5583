//! HTML views for the file listing and detail pages.
//!
//! Handlers only see the [`PageRenderer`] trait so tests and alternative
//! front ends can swap the markup without touching request handling.

use crate::services::file_store::FileRecord;
use crate::utils::pagination::Page;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt::Write;
use thiserror::Error;

/// Template-related errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Render error.
    #[error("Render error: {0}")]
    Render(String),
}

impl From<std::fmt::Error> for TemplateError {
    fn from(e: std::fmt::Error) -> Self {
        TemplateError::Render(e.to_string())
    }
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

pub trait PageRenderer: Send + Sync {
    fn render_index(&self, page: &Page<FileRecord>) -> Result<String>;
    fn render_detail(&self, record: &FileRecord) -> Result<String>;
}

/// Characters escaped inside a single URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Public URL of a stored blob, served by the media handler.
pub fn media_url(key: &str) -> String {
    let mut url = String::from("/media");
    for segment in key.split('/') {
        url.push('/');
        url.push_str(&utf8_percent_encode(segment, SEGMENT).to_string());
    }
    url
}

pub fn detail_url(id: i32) -> String {
    format!("/{}/", id)
}

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_timestamp(record: &FileRecord) -> String {
    record.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Human readable size, always keeping the exact byte count.
pub fn format_size(size: i64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    let bytes = if size == 1 { "1 byte".to_string() } else { format!("{} bytes", size) };

    if size < 1024 {
        return bytes;
    }
    let mut value = size as f64;
    let mut unit = "";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{:.1} {} ({})", value, unit, bytes)
}

pub struct HtmlRenderer {
    title: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new("Files")
    }
}

impl HtmlRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn layout(&self, heading: &str, content: &str) -> Result<String> {
        let mut html = String::new();
        writeln!(html, "<!DOCTYPE html>")?;
        writeln!(html, "<html lang=\"en\">")?;
        writeln!(html, "<head>")?;
        writeln!(html, "<meta charset=\"utf-8\">")?;
        writeln!(
            html,
            "<title>{} - {}</title>",
            escape_html(heading),
            escape_html(&self.title)
        )?;
        writeln!(html, "</head>")?;
        writeln!(html, "<body>")?;
        writeln!(html, "<h1>{}</h1>", escape_html(heading))?;
        html.push_str(content);
        writeln!(html, "</body>")?;
        writeln!(html, "</html>")?;
        Ok(html)
    }
}

impl PageRenderer for HtmlRenderer {
    fn render_index(&self, page: &Page<FileRecord>) -> Result<String> {
        let mut content = String::new();

        writeln!(
            content,
            "<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">"
        )?;
        writeln!(content, "<input type=\"file\" name=\"file\" required>")?;
        writeln!(content, "<button type=\"submit\">Upload</button>")?;
        writeln!(content, "</form>")?;

        if page.is_empty() {
            writeln!(content, "<p>No files have been uploaded yet.</p>")?;
        } else {
            writeln!(content, "<ul class=\"files\">")?;
            for record in &page.items {
                writeln!(
                    content,
                    "<li><a href=\"{}\">{}</a> <span class=\"size\">{}</span> <time>{}</time></li>",
                    detail_url(record.id),
                    escape_html(record.name()),
                    format_size(record.size),
                    format_timestamp(record)
                )?;
            }
            writeln!(content, "</ul>")?;
        }

        writeln!(content, "<nav class=\"pagination\">")?;
        if let Some(previous) = page.previous_page_number() {
            writeln!(content, "<a href=\"?page=1\">&laquo; first</a>")?;
            writeln!(content, "<a href=\"?page={}\">previous</a>", previous)?;
        }
        writeln!(
            content,
            "<span class=\"current\">Page {} of {}.</span>",
            page.number, page.num_pages
        )?;
        if let Some(next) = page.next_page_number() {
            writeln!(content, "<a href=\"?page={}\">next</a>", next)?;
            writeln!(
                content,
                "<a href=\"?page={}\">last &raquo;</a>",
                page.num_pages
            )?;
        }
        writeln!(content, "</nav>")?;

        self.layout(&self.title, &content)
    }

    fn render_detail(&self, record: &FileRecord) -> Result<String> {
        let mut content = String::new();

        writeln!(content, "<dl>")?;
        writeln!(
            content,
            "<dt>Name</dt><dd>{}</dd>",
            escape_html(record.name())
        )?;
        writeln!(content, "<dt>Size</dt><dd>{}</dd>", format_size(record.size))?;
        writeln!(
            content,
            "<dt>Uploaded</dt><dd><time>{}</time></dd>",
            format_timestamp(record)
        )?;
        writeln!(content, "</dl>")?;
        writeln!(
            content,
            "<p><a href=\"{}\">Download</a></p>",
            escape_html(&media_url(&record.file))
        )?;
        writeln!(content, "<p><a href=\"/\">Back to all files</a></p>")?;

        self.layout(record.name(), &content)
    }
}

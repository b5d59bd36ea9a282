//! Structured rich text as delivered by the content repository
//!
//! A rich-text field is an ordered list of blocks. Text blocks carry inline
//! spans addressed by UTF-16 offsets into the block text.

use serde::{Deserialize, Serialize};

/// An ordered sequence of rich-text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

/// A single rich-text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub enum Block {
    Text {
        kind: TextKind,
        text: String,
        spans: Vec<Span>,
    },
    Image {
        url: String,
        alt: Option<String>,
    },
    Embed {
        html: String,
    },
}

/// The kind of a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Paragraph,
    Heading(u8),
    Preformatted,
    ListItem,
    OrderedListItem,
}

impl TextKind {
    fn from_type(kind: &str) -> Self {
        match kind {
            "heading1" => TextKind::Heading(1),
            "heading2" => TextKind::Heading(2),
            "heading3" => TextKind::Heading(3),
            "heading4" => TextKind::Heading(4),
            "heading5" => TextKind::Heading(5),
            "heading6" => TextKind::Heading(6),
            "preformatted" => TextKind::Preformatted,
            "list-item" => TextKind::ListItem,
            "o-list-item" => TextKind::OrderedListItem,
            _ => TextKind::Paragraph,
        }
    }

    fn type_name(self) -> String {
        match self {
            TextKind::Paragraph => "paragraph".to_string(),
            TextKind::Heading(level) => format!("heading{}", level),
            TextKind::Preformatted => "preformatted".to_string(),
            TextKind::ListItem => "list-item".to_string(),
            TextKind::OrderedListItem => "o-list-item".to_string(),
        }
    }
}

/// An inline span over `start..end` (UTF-16 offsets)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSpan", into = "RawSpan")]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { url: String, target: Option<String> },
    Label { label: String },
    Other(String),
}

/// Wire shape of a block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    oembed: Option<RawOembed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawOembed {
    #[serde(default)]
    html: Option<String>,
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        match raw.kind.as_str() {
            "image" => Block::Image {
                url: raw.url.unwrap_or_default(),
                alt: raw.alt,
            },
            "embed" => Block::Embed {
                html: raw.oembed.and_then(|o| o.html).unwrap_or_default(),
            },
            other => Block::Text {
                kind: TextKind::from_type(other),
                text: raw.text.unwrap_or_default(),
                spans: raw.spans,
            },
        }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        match block {
            Block::Text { kind, text, spans } => RawBlock {
                kind: kind.type_name(),
                text: Some(text),
                spans,
                ..Default::default()
            },
            Block::Image { url, alt } => RawBlock {
                kind: "image".to_string(),
                url: Some(url),
                alt,
                ..Default::default()
            },
            Block::Embed { html } => RawBlock {
                kind: "embed".to_string(),
                oembed: Some(RawOembed { html: Some(html) }),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl From<RawSpan> for Span {
    fn from(raw: RawSpan) -> Self {
        let data_str = |key: &str| {
            raw.data
                .as_ref()
                .and_then(|d| d.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let kind = match raw.kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => SpanKind::Hyperlink {
                url: data_str("url").unwrap_or_default(),
                target: data_str("target"),
            },
            "label" => SpanKind::Label {
                label: data_str("label").unwrap_or_default(),
            },
            _ => SpanKind::Other(raw.kind.clone()),
        };

        Span {
            start: raw.start,
            end: raw.end,
            kind,
        }
    }
}

impl From<Span> for RawSpan {
    fn from(span: Span) -> Self {
        let (kind, data) = match span.kind {
            SpanKind::Strong => ("strong".to_string(), None),
            SpanKind::Em => ("em".to_string(), None),
            SpanKind::Hyperlink { url, target } => {
                let mut data = serde_json::Map::new();
                data.insert("link_type".into(), "Web".into());
                data.insert("url".into(), url.into());
                if let Some(target) = target {
                    data.insert("target".into(), target.into());
                }
                ("hyperlink".to_string(), Some(serde_json::Value::Object(data)))
            }
            SpanKind::Label { label } => (
                "label".to_string(),
                Some(serde_json::json!({ "label": label })),
            ),
            SpanKind::Other(kind) => (kind, None),
        };

        RawSpan {
            start: span.start,
            end: span.end,
            kind,
            data,
        }
    }
}

impl RichText {
    pub fn blocks(&self) -> &[Block] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Plain text of all text blocks joined by a single space
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|block| match block {
                Block::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render the blocks as HTML, grouping consecutive list items
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<TextKind> = None;

        for block in &self.0 {
            let list_kind = match block {
                Block::Text {
                    kind: kind @ (TextKind::ListItem | TextKind::OrderedListItem),
                    ..
                } => Some(*kind),
                _ => None,
            };

            if open_list != list_kind {
                if let Some(kind) = open_list {
                    html.push_str(list_close_tag(kind));
                }
                if let Some(kind) = list_kind {
                    html.push_str(list_open_tag(kind));
                }
                open_list = list_kind;
            }

            render_block(block, &mut html);
        }

        if let Some(kind) = open_list {
            html.push_str(list_close_tag(kind));
        }

        html
    }
}

fn list_open_tag(kind: TextKind) -> &'static str {
    if kind == TextKind::OrderedListItem {
        "<ol>"
    } else {
        "<ul>"
    }
}

fn list_close_tag(kind: TextKind) -> &'static str {
    if kind == TextKind::OrderedListItem {
        "</ol>"
    } else {
        "</ul>"
    }
}

fn render_block(block: &Block, html: &mut String) {
    match block {
        Block::Text { kind, text, spans } => {
            let tag = match kind {
                TextKind::Paragraph => "p".to_string(),
                TextKind::Heading(level) => format!("h{}", level),
                TextKind::Preformatted => "pre".to_string(),
                TextKind::ListItem | TextKind::OrderedListItem => "li".to_string(),
            };
            html.push('<');
            html.push_str(&tag);
            html.push('>');
            html.push_str(&render_spans(text, spans));
            html.push_str("</");
            html.push_str(&tag);
            html.push('>');
        }
        Block::Image { url, alt } => {
            html.push_str(&format!(
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                escape_html(url),
                escape_html(alt.as_deref().unwrap_or(""))
            ));
        }
        Block::Embed { html: embed } => {
            html.push_str(r#"<div class="block-embed">"#);
            html.push_str(embed);
            html.push_str("</div>");
        }
    }
}

/// Apply inline spans to `text`. Overlapping spans that do not nest are
/// closed and reopened so the output stays well-formed.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut ordered: Vec<&Span> = spans.iter().filter(|s| s.start < s.end).collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut pending = 0;
    let mut offset = 0;

    for c in text.chars() {
        advance(offset, &ordered, &mut pending, &mut open, &mut out);
        push_escaped(c, &mut out);
        offset += c.len_utf16();
    }
    advance(offset, &ordered, &mut pending, &mut open, &mut out);

    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
    }

    out
}

fn advance<'a>(
    offset: usize,
    ordered: &[&'a Span],
    pending: &mut usize,
    open: &mut Vec<&'a Span>,
    out: &mut String,
) {
    if let Some(first) = open.iter().position(|s| s.end <= offset) {
        let reopen: Vec<&Span> = open[first + 1..]
            .iter()
            .filter(|s| s.end > offset)
            .copied()
            .collect();
        while open.len() > first {
            if let Some(span) = open.pop() {
                out.push_str(close_tag(span));
            }
        }
        for span in reopen {
            out.push_str(&open_tag(span));
            open.push(span);
        }
    }

    while *pending < ordered.len() && ordered[*pending].start <= offset {
        let span = ordered[*pending];
        *pending += 1;
        if span.end > offset {
            out.push_str(&open_tag(span));
            open.push(span);
        }
    }
}

fn open_tag(span: &Span) -> String {
    match &span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink { url, target } => match target {
            Some(target) => format!(
                r#"<a href="{}" target="{}" rel="noopener">"#,
                escape_html(url),
                escape_html(target)
            ),
            None => format!(r#"<a href="{}">"#, escape_html(url)),
        },
        SpanKind::Label { label } => format!(r#"<span class="{}">"#, escape_html(label)),
        SpanKind::Other(_) => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink { .. } => "</a>",
        SpanKind::Label { .. } | SpanKind::Other(_) => "</span>",
    }
}

fn push_escaped(c: char, out: &mut String) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        '\n' => out.push_str("<br />"),
        _ => out.push(c),
    }
}

/// Escape text for use in HTML content or attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push('\n'),
            _ => push_escaped(c, &mut out),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RichText {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_as_text_joins_text_blocks() {
        let rt = parse(
            r#"[
                {"type": "paragraph", "text": "Hello world", "spans": []},
                {"type": "image", "url": "https://img/x.png", "alt": "x"},
                {"type": "heading2", "text": "Again", "spans": []}
            ]"#,
        );
        assert_eq!(rt.as_text(), "Hello world Again");
    }

    #[test]
    fn test_as_html_basic_blocks() {
        let rt = parse(
            r#"[
                {"type": "heading2", "text": "Title", "spans": []},
                {"type": "paragraph", "text": "a < b & c", "spans": []},
                {"type": "preformatted", "text": "line1\nline2", "spans": []}
            ]"#,
        );
        assert_eq!(
            rt.as_html(),
            "<h2>Title</h2><p>a &lt; b &amp; c</p><pre>line1<br />line2</pre>"
        );
    }

    #[test]
    fn test_as_html_groups_lists() {
        let rt = parse(
            r#"[
                {"type": "list-item", "text": "one", "spans": []},
                {"type": "list-item", "text": "two", "spans": []},
                {"type": "o-list-item", "text": "first", "spans": []},
                {"type": "paragraph", "text": "end", "spans": []}
            ]"#,
        );
        assert_eq!(
            rt.as_html(),
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>end</p>"
        );
    }

    #[test]
    fn test_spans_render_nested_and_links() {
        let rt = parse(
            r#"[{"type": "paragraph", "text": "Read the docs now", "spans": [
                {"start": 0, "end": 17, "type": "em"},
                {"start": 9, "end": 13, "type": "hyperlink", "data": {"link_type": "Web", "url": "https://docs.rs"}}
            ]}]"#,
        );
        assert_eq!(
            rt.as_html(),
            r#"<p><em>Read the <a href="https://docs.rs">docs</a> now</em></p>"#
        );
    }

    #[test]
    fn test_overlapping_spans_stay_well_formed() {
        let rt = parse(
            r#"[{"type": "paragraph", "text": "abcdef", "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 2, "end": 6, "type": "em"}
            ]}]"#,
        );
        assert_eq!(
            rt.as_html(),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_span_offsets_are_utf16() {
        // "é" is one UTF-16 unit, the emoji is two
        let rt = parse(
            r#"[{"type": "paragraph", "text": "é😀 ok", "spans": [
                {"start": 4, "end": 6, "type": "strong"}
            ]}]"#,
        );
        assert_eq!(rt.as_html(), "<p>é😀 <strong>ok</strong></p>");
    }

    #[test]
    fn test_unknown_block_is_kept_as_paragraph() {
        let rt = parse(r#"[{"type": "mystery", "text": "still here"}]"#);
        assert_eq!(rt.as_text(), "still here");
        assert_eq!(rt.as_html(), "<p>still here</p>");
    }

    #[test]
    fn test_serialize_keeps_wire_shape() {
        let rt = parse(
            r#"[{"type": "paragraph", "text": "x", "spans": [{"start": 0, "end": 1, "type": "strong"}]}]"#,
        );
        let value = serde_json::to_value(&rt).unwrap();
        assert_eq!(value[0]["type"], "paragraph");
        assert_eq!(value[0]["spans"][0]["type"], "strong");
    }
}

//! Rendering of dissection results.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use crossterm::style::Stylize;
use dissector_core::{DataItem, Dissection};
use dissector_schema::Tag;
use serde::Serialize;

/// JSON shape of one dissected bundle. Big numbers are decimal strings.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub tx_id: &'a str,
    pub data_root: &'a str,
    pub offset: String,
    pub start: String,
    pub size: String,
    pub item_count: String,
    pub items: Vec<ItemReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<DataItemReport>,
}

/// JSON shape of one index entry. `offset` is relative to the bundle start.
#[derive(Debug, Serialize)]
pub struct ItemReport {
    pub id: String,
    pub size: String,
    pub offset: String,
}

/// JSON shape of a decoded data-item header. Binary fields are base64url.
#[derive(Debug, Serialize)]
pub struct DataItemReport {
    pub id: String,
    pub offset: String,
    pub size: String,
    pub signature_type: String,
    pub owner: String,
    pub target: Option<String>,
    pub anchor: Option<String>,
    pub header_len: usize,
    pub tags: Vec<TagReport>,
}

/// A tag in plaintext, or still encoded when it is not valid UTF-8.
#[derive(Debug, Serialize)]
pub struct TagReport {
    pub name: String,
    pub value: String,
}

impl From<&Tag> for TagReport {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.decoded_name().unwrap_or_else(|| tag.name().to_string()),
            value: tag.decoded_value().unwrap_or_else(|| tag.value().to_string()),
        }
    }
}

impl From<&DataItem> for DataItemReport {
    fn from(item: &DataItem) -> Self {
        let h = &item.header;
        Self {
            id: item.range.id.to_string(),
            offset: item.range.offset.to_string(),
            size: item.range.size.to_string(),
            signature_type: h.signature_type.to_string(),
            owner: URL_SAFE_NO_PAD.encode(&h.owner),
            target: h.target.map(|t| URL_SAFE_NO_PAD.encode(t)),
            anchor: h.anchor.map(|a| URL_SAFE_NO_PAD.encode(a)),
            header_len: h.header_len,
            tags: h.tags.iter().map(TagReport::from).collect(),
        }
    }
}

impl<'a> Report<'a> {
    fn new(d: &'a Dissection, item: Option<&DataItem>) -> Self {
        Self {
            tx_id: &d.tx_id,
            data_root: &d.data_root,
            offset: d.range.offset().to_string(),
            start: d.range.start().to_string(),
            size: d.range.size().to_string(),
            item_count: d.header.item_count().to_string(),
            items: d
                .header
                .item_ranges()
                .into_iter()
                .map(|r| ItemReport {
                    id: r.id.to_string(),
                    size: r.size.to_string(),
                    offset: r.offset.to_string(),
                })
                .collect(),
            item: item.map(DataItemReport::from),
        }
    }
}

/// Render as a single-line JSON document.
pub fn json(d: &Dissection, item: Option<&DataItem>) -> serde_json::Result<String> {
    serde_json::to_string(&Report::new(d, item))
}

/// Render for a terminal. `verbose` adds the transaction's tags and each
/// item's bundle-relative offset.
pub fn text(d: &Dissection, item: Option<&DataItem>, verbose: bool) -> String {
    let lw = 11;
    let mut out = String::new();

    out.push_str(&format!("\n  {}\n", d.tx_id.as_str().white().bold()));
    out.push_str(&format!("  {:<lw$}{}\n", "data root", d.data_root));
    out.push_str(&format!(
        "  {:<lw$}{} bytes at {}..={}\n",
        "range",
        d.range.size(),
        d.range.start(),
        d.range.offset()
    ));

    if verbose {
        out.push_str(&format!("  {:<lw$}{}\n", "tags", d.tags.len()));
        push_tags(&mut out, &d.tags);
    }

    out.push_str(&format!("  {:<lw$}{}\n", "items", d.header.item_count()));
    for r in d.header.item_ranges() {
        if verbose {
            out.push_str(&format!(
                "    {}  {} bytes @ {}\n",
                r.id,
                r.size,
                r.offset.to_string().dark_grey()
            ));
        } else {
            out.push_str(&format!("    {}  {} bytes\n", r.id, r.size));
        }
    }

    if let Some(item) = item {
        let h = &item.header;
        let opt = |v: Option<[u8; 32]>| v.map_or_else(|| "-".to_string(), |b| URL_SAFE_NO_PAD.encode(b));

        out.push_str(&format!("\n  {}\n", item.range.id.to_string().white().bold()));
        out.push_str(&format!(
            "  {:<lw$}{} bytes @ {}\n",
            "range", item.range.size, item.range.offset
        ));
        out.push_str(&format!("  {:<lw$}{}\n", "signature", h.signature_type));
        out.push_str(&format!("  {:<lw$}{}\n", "owner", URL_SAFE_NO_PAD.encode(&h.owner)));
        out.push_str(&format!("  {:<lw$}{}\n", "target", opt(h.target)));
        out.push_str(&format!("  {:<lw$}{}\n", "anchor", opt(h.anchor)));
        out.push_str(&format!("  {:<lw$}{} bytes\n", "header", h.header_len));
        out.push_str(&format!("  {:<lw$}{}\n", "tags", h.tags.len()));
        push_tags(&mut out, &h.tags);
    }

    out
}

fn push_tags(out: &mut String, tags: &[Tag]) {
    for tag in tags {
        let t = TagReport::from(tag);
        out.push_str(&format!("    {} {}\n", format!("{}:", t.name).dark_grey(), t.value));
    }
}

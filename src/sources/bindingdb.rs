//! BindingDB summary-page scraping.
//!
//! BindingDB offers no JSON endpoint for name searches, so affinity tables
//! are pulled out of the HTML summary page. Rows are kept as raw text and
//! never parsed into numbers.

use super::http::HttpClient;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

static TABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table>").unwrap());
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<th\b[^>]*>(.*?)</th>").unwrap());
static ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").unwrap());
static CELL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const AFFINITY_HEADERS: [&str; 4] = ["ki", "kd", "ic50", "ec50"];
const MIN_CELLS: usize = 3;

/// One raw table row from a BindingDB summary page, cells joined by `" | "`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDbRow {
    pub raw: String,
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Visible text of an HTML fragment, tags replaced by `sep`.
fn fragment_text(html: &str, sep: &str) -> String {
    let stripped = TAG_RE.replace_all(html, sep);
    let decoded = decode_entities(&stripped);
    SPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

fn is_affinity_table(table: &str) -> bool {
    HEADER_RE
        .captures_iter(table)
        .map(|c| fragment_text(&c[1], "").to_lowercase())
        .any(|h| AFFINITY_HEADERS.iter().any(|p| h.starts_with(p)))
}

/// Extract the data rows of every affinity table on the page.
pub fn parse_rows(html: &str) -> Vec<BindingDbRow> {
    let mut rows = Vec::new();

    for table in TABLE_RE.captures_iter(html) {
        let body = &table[1];
        if !is_affinity_table(body) {
            continue;
        }

        for row in ROW_RE.captures_iter(body) {
            let cells: Vec<String> = CELL_RE
                .captures_iter(&row[1])
                .map(|c| fragment_text(&c[1], " "))
                .collect();

            if cells.len() >= MIN_CELLS {
                rows.push(BindingDbRow {
                    raw: cells.join(" | "),
                });
            }
        }
    }

    rows
}

/// BindingDB summary-page client.
pub struct BindingDbClient<'a> {
    http: &'a HttpClient,
    base_url: String,
}

impl<'a> BindingDbClient<'a> {
    pub fn new(http: &'a HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// Search by ligand name and target (UniProt accession or protein name).
    pub async fn fetch(&self, ligand: &str, target: &str) -> Vec<BindingDbRow> {
        let query = [
            ("LigandSearch", ligand.to_string()),
            ("target", target.to_string()),
        ];

        match self.http.get_text(&self.base_url, &query).await {
            Ok(html) => {
                let rows = parse_rows(&html);
                info!("BindingDB: {} raw rows", rows.len());
                rows
            }
            Err(e) => {
                warn!("BindingDB search failed: {}", e);
                Vec::new()
            }
        }
    }
}

//! A chart listing whose items link to detail pages.

use regex::Regex;
use serde_json::Value;
use std::fmt::Write;
use std::sync::OnceLock;

use super::StaticTransport;
use crate::collectors;
use crate::errors::CollectError;
use crate::schema::{ComputedSpec, FieldSpec, ItemSchema, Schema};

/// URL of the fixture listing.
pub const CHART_URL: &str = "https://x/chart";

fn title_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/title/([^/]+)/").expect("title id regex is valid"))
}

/// A listing with one row per id, in order.
#[must_use]
pub fn chart_listing(ids: &[&str]) -> String {
    let mut rows = String::new();
    for (rank, id) in ids.iter().enumerate() {
        let _ = write!(
            rows,
            "<tr><td class=\"posterColumn\"><span name=\"rk\" data-value=\"{}\"></span></td>\
             <td class=\"titleColumn\"><a href=\"https://x/title/{id}/\">Title {id}</a></td></tr>",
            rank + 1
        );
    }
    format!(
        "<html><body><table class=\"chart\"><tbody>{rows}</tbody></table></body></html>"
    )
}

/// A detail page carrying a summary.
#[must_use]
pub fn title_page(summary: &str) -> String {
    format!(
        "<html><body><h1>Detail</h1><div class=\"summary_text\">\n  {summary}\n</div></body></html>"
    )
}

/// A transport serving the listing plus one detail page per id at
/// `https://x/<id>`.
#[must_use]
pub fn chart_transport(ids: &[&str]) -> StaticTransport {
    ids.iter().fold(
        StaticTransport::new().with_page(CHART_URL, chart_listing(ids)),
        |transport, id| transport.with_page(format!("https://x/{id}"), title_page(&format!("Summary of {id}"))),
    )
}

/// Rows of the listing, with `link`, `title`, `id` (taken from the link)
/// and `description` (read from the item's detail page).
#[must_use]
pub fn chart_schema() -> Schema {
    Schema::new(
        CHART_URL,
        ItemSchema::new(".chart tbody tr")
            .resource("itemPage", "https://x/:id")
            .fields(|r| {
                Ok(vec![
                    FieldSpec::new("link", ".titleColumn a", collectors::attr("href")),
                    FieldSpec::new("title", ".titleColumn a", collectors::text_trimmed()),
                    FieldSpec::new("description", ".summary_text", collectors::text_trimmed())
                        .from_resource(r.resource("itemPage", ["$id"])?),
                ])
            })
            .computed(ComputedSpec::new("id", ["link"], |inputs| {
                let link = inputs.str("link")?;
                title_id_regex()
                    .captures(link)
                    .and_then(|caps| caps.get(1))
                    .map(|m| Value::String(m.as_str().to_string()))
                    .ok_or_else(|| CollectError::new(format!("no title id in {link}")))
            })),
    )
}

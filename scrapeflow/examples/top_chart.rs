//! Collects the top of the IMDb Top 250 chart with each title's plot
//! summary and prints the first record.
//!
//! ```sh
//! RUST_LOG=scrapeflow=debug cargo run --example top_chart
//! ```

use regex::Regex;
use scrapeflow::prelude::*;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

const CHART_URL: &str = "https://www.imdb.com/chart/top";

fn title_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/title/([^/]+)/").expect("title id regex is valid"))
}

fn extract_id(inputs: &ComputedInputs) -> Result<Value, CollectError> {
    let link = inputs.str("link")?;
    title_id_regex()
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| Value::String(m.as_str().to_string()))
        .ok_or_else(|| CollectError::new(format!("no title id in {link}")))
}

fn schema() -> Schema {
    let config = CollectionConfig::new(CHART_URL)
        .with_max_items(10)
        .with_fetch(
            FetchConfig::new()
                .with_timeout(20.0)
                .with_header("Accept-Language", "en-US,en;q=0.8"),
        );

    Schema::new(
        CHART_URL,
        ItemSchema::new(".chart tbody tr")
            .resource("itemPage", "https://www.imdb.com/title/:id/")
            .fields(|r| {
                Ok(vec![
                    FieldSpec::new("link", ".titleColumn a", collectors::attr("href")),
                    FieldSpec::new("title", ".titleColumn a", collectors::text_trimmed()),
                    FieldSpec::new("rating", ".imdbRating strong", collectors::text_trimmed()),
                    FieldSpec::new("description", ".summary_text", collectors::text_trimmed())
                        .from_resource(r.resource("itemPage", ["$id"])?),
                ])
            })
            .computed(ComputedSpec::new("id", ["link"], extract_id)),
    )
    .with_config(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::Plain)?;

    let schema = schema();
    let transport = HttpTransport::new(&schema.config.fetch)?;
    let collection = Collection::compile(schema)?;

    let runner = CollectionRunner::new(collection, Arc::new(transport))
        .with_event_sink(Arc::new(LoggingEventSink::default()));
    let result = runner.run().await?;

    for failure in result.failures() {
        if let Some(err) = failure.error() {
            eprintln!("item {} failed: {err}", failure.index);
        }
    }
    if let Some(first) = result.items().first() {
        println!("{}", serde_json::to_string_pretty(&first.to_json())?);
    }

    let progress = result.progress;
    println!(
        "{} of {} items collected in {}ms",
        progress.completed, progress.total, result.duration_ms
    );
    Ok(())
}

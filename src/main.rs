//! span-anchor
//!
//! Recovers annotation spans in an XHTML file and prints the resulting
//! records, the targets that could not be found, and the annotated markup.

use std::collections::BTreeSet;
use std::env;
use std::fs;

use anyhow::{bail, Context};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use span_anchor::{AnchorConfig, Annotation, AnnotationIndex, Document};

#[derive(Serialize)]
struct Report<'a> {
    annotations: &'a [Annotation],
    missing: BTreeSet<String>,
    markup: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "span_anchor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let config = AnchorConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        AnchorConfig::default()
    });

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: span-anchor <file.xhtml> <target>...");
    };
    let targets: Vec<String> = args.collect();
    if targets.is_empty() {
        bail!("usage: span-anchor <file.xhtml> <target>...");
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
    let mut doc =
        Document::from_xhtml(&content).with_context(|| format!("Failed to parse {}", path))?;

    tracing::info!(file = %path, targets = targets.len(), "Recovering annotations");

    let markup_config = config.markup.clone();
    let mut index = AnnotationIndex::new(config);
    let missing = index
        .recover(&mut doc, &targets)
        .context("Recovery failed")?
        .unwrap_or_default();
    doc.compact();

    let report = Report {
        annotations: index.annotations(),
        missing,
        markup: doc.to_markup(&markup_config),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

use anyhow::{bail, Result};
use imfscraper::{
    export, locate,
    map::{self, schema, Country},
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) locate country source files ──────────────────────────────
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let files = locate::find_country_files(&root)?;
    if files.is_empty() {
        bail!(
            "no country files found under {}; run the downloader first",
            root.display()
        );
    }
    info!(count = files.len(), "country files to process");

    // ─── 3) parse + aggregate ────────────────────────────────────────
    let summary = map::process_all(&files);
    for country in Country::ALL {
        match summary.outcomes.get(&country) {
            Some(outcome) => info!(country = %country, outcome = ?outcome, "processed"),
            None => warn!(country = %country, "no source file; omitted from output"),
        }
    }
    if summary.mapping.is_empty() {
        bail!("no column keys produced from any source file");
    }
    let Some(date_value) = summary.selected_date.clone() else {
        bail!("no reporting date could be extracted from any source filename");
    };
    info!(date = %date_value, keys = summary.mapping.len(), "aggregation done");

    // ─── 4) project onto the fixed schema + export ───────────────────
    let row = schema::project(&summary.mapping, &date_value);
    let out = PathBuf::from(export::output_filename(&date_value));
    export::write_workbook(&row, &out)?;
    info!(file = %out.display(), "done");

    Ok(())
}

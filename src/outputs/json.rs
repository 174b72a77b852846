//! JSON preview of the summarized digest.
//!
//! The preview maps each category to its summarized articles, the same shape
//! any dashboard or other presentation layer renders:
//!
//! ```text
//! {"technology": [{"title": "...", "summary": "...", ...}], "science": [...]}
//! ```
//!
//! Files are named by run date; a second run on the same day overwrites the
//! first.

use crate::models::CategoryDigest;
use crate::utils::ensure_writable_dir;
use chrono::NaiveDate;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Write `digest` to `{output_dir}/{date}.json` and return the path written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir, %date))]
pub async fn write_digest_preview(
    digest: &CategoryDigest,
    output_dir: &str,
    date: NaiveDate,
) -> Result<PathBuf, Box<dyn Error>> {
    ensure_writable_dir(output_dir).await?;

    let json = serde_json::to_string_pretty(digest)?;
    let path = PathBuf::from(output_dir).join(format!("{}.json", date.format("%Y-%m-%d")));

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote digest preview");
    Ok(path)
}

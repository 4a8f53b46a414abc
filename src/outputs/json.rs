//! JSON output of the drift series.
//!
//! The file holds the keyword/language pair and one point per window, which
//! is everything a chart of the three method series needs:
//!
//! ```json
//! {
//!   "keyword1": "africa", "language1": "en",
//!   "keyword2": "afrique", "language2": "fr",
//!   "points": [
//!     { "window": {"start": "2022-08-15", "end": "2022-08-16"}, "label": "Aug 15",
//!       "frequency": 3.2, "word2vec": 5.1, "fasttext": 4.7 }
//!   ]
//! }
//! ```

use crate::models::DriftSeries;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`DriftSeries`] to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_series(series: &DriftSeries, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(series)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(points = series.points.len(), "Wrote drift series JSON");
    Ok(())
}

//! Page files and the concatenated per-campaign artifact

use crate::model::{CursorPage, Donation};
use crate::output::csv::rows_to_string;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Column order of every output file: id-like fields, then amount/value
/// fields, then provenance.
pub const COLUMNS: [&str; 8] = [
    "id",
    "name",
    "is_anonymous",
    "amount",
    "created_unix",
    "created_ts",
    "scraped_at",
    "campaign_id",
];

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes page files and concatenated artifacts under one data directory
///
/// Layout:
/// - `<data_dir>/pages/<campaign_id>/page_NNNN.csv` - one file per page
/// - `<data_dir>/donors_<campaign_id>.csv` - concatenated per campaign
#[derive(Debug, Clone)]
pub struct PageStore {
    data_dir: PathBuf,
}

impl PageStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn page_dir(&self, campaign_id: &str) -> PathBuf {
        self.data_dir.join("pages").join(campaign_id)
    }

    /// Path of one numbered page file (pages are numbered from 1)
    pub fn page_path(&self, campaign_id: &str, page_no: u32) -> PathBuf {
        self.page_dir(campaign_id)
            .join(format!("page_{:04}.csv", page_no))
    }

    /// Path of the campaign's concatenated artifact
    pub fn artifact_path(&self, campaign_id: &str) -> PathBuf {
        self.data_dir.join(format!("donors_{}.csv", campaign_id))
    }

    /// Writes one fetched page as a numbered CSV file
    ///
    /// The file is created or truncated, so re-writing the same page number
    /// after a crash-and-resume is an idempotent overwrite.
    pub fn write_page(&self, page: &CursorPage, page_no: u32) -> io::Result<PathBuf> {
        let path = self.page_path(&page.campaign_id, page_no);
        ensure_directory(path.parent().expect("page path has a parent"))?;

        let rows: Vec<Vec<String>> = page
            .records
            .iter()
            .map(|d| donation_row(d, &page.campaign_id, page.fetched_at))
            .collect();

        fs::write(&path, rows_to_string(&COLUMNS, &rows))?;
        Ok(path)
    }

    /// Rebuilds the concatenated artifact from the campaign's page files
    ///
    /// Walks page numbers upward from 1 until a file is missing, so the
    /// artifact always reflects exactly the persisted pages and a re-fetched
    /// page never duplicates rows.
    pub fn rebuild_artifact(&self, campaign_id: &str) -> io::Result<PathBuf> {
        let path = self.artifact_path(campaign_id);
        ensure_directory(&self.data_dir)?;

        let mut contents = String::new();
        contents.push_str(&COLUMNS.join(","));
        contents.push('\n');

        let mut page_no = 1u32;
        loop {
            let page_path = self.page_path(campaign_id, page_no);
            if !page_path.exists() {
                break;
            }
            let page_contents = fs::read_to_string(&page_path)?;
            // Everything after the header line; quoted newlines only ever
            // appear past the first row, so this split is safe.
            if let Some((_, body)) = page_contents.split_once('\n') {
                contents.push_str(body);
            }
            page_no += 1;
        }

        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Removes every page file for a campaign
    ///
    /// Used when a walk restarts from the stream head, so pages from an
    /// earlier partial capture cannot leak into the rebuilt artifact.
    pub fn remove_pages(&self, campaign_id: &str) -> io::Result<()> {
        let dir = self.page_dir(campaign_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Number of consecutive page files on disk for a campaign
    pub fn page_count(&self, campaign_id: &str) -> u32 {
        let mut count = 0;
        while self.page_path(campaign_id, count + 1).exists() {
            count += 1;
        }
        count
    }
}

fn ensure_directory(dir: &Path) -> io::Result<()> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Renders one donation in the spec'd column order
fn donation_row(
    donation: &Donation,
    campaign_id: &str,
    scraped_at: DateTime<Utc>,
) -> Vec<String> {
    vec![
        donation.id.map(|v| v.to_string()).unwrap_or_default(),
        donation.donor_name().unwrap_or_default().to_string(),
        donation
            .is_anonymous
            .map(|v| v.to_string())
            .unwrap_or_default(),
        donation.amount.map(|v| v.to_string()).unwrap_or_default(),
        donation.created.map(|v| v.to_string()).unwrap_or_default(),
        donation
            .created_utc()
            .map(|ts| ts.format(TS_FORMAT).to_string())
            .unwrap_or_default(),
        scraped_at.format(TS_FORMAT).to_string(),
        campaign_id.to_string(),
    ]
}

//! Worklist reconciliation
//!
//! Consumes the external campaign selector's output (an ordered list of
//! campaign ids, each with the donation-percentage metric the selector used
//! upstream) and subtracts the campaigns already fully captured. Pure set
//! difference - no network, re-run on every scheduled invocation.

use crate::HarvestError;
use std::collections::HashSet;
use std::path::Path;

/// One row of the selector's output
///
/// The percentage is carried for reporting only; the filter it fed is never
/// recomputed here.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub campaign_id: String,
    pub donation_percentage: Option<f64>,
}

/// Computes the campaigns still to scrape
///
/// Exact string match, candidate order preserved, duplicates dropped.
pub fn reconcile(candidates: &[String], already_complete: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|id| !already_complete.contains(*id))
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}

/// Splits one CSV line, honoring double-quoted fields
///
/// The selector file carries free-text columns (category names) that can
/// contain commas, so a plain split would misalign the id column.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Loads the selector's candidate CSV
///
/// Expects a header row naming at least a `short_url` column; a
/// `donation_percentage` column is picked up when present.
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>, HarvestError> {
    let contents = std::fs::read_to_string(path)?;
    let mut lines = contents.lines();

    let header = lines
        .next()
        .ok_or_else(|| HarvestError::Worklist(format!("{}: empty candidate file", path.display())))?;
    let columns: Vec<String> = split_fields(header)
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();

    let id_col = columns
        .iter()
        .position(|c| c == "short_url")
        .ok_or_else(|| {
            HarvestError::Worklist(format!(
                "{}: candidate file has no short_url column",
                path.display()
            ))
        })?;
    let pct_col = columns.iter().position(|c| c == "donation_percentage");

    let mut candidates = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<String> = split_fields(line)
            .into_iter()
            .map(|f| f.trim().to_string())
            .collect();
        let Some(campaign_id) = fields.get(id_col).filter(|id| !id.is_empty()) else {
            tracing::warn!(line, "skipping candidate row without a campaign id");
            continue;
        };
        let donation_percentage = pct_col
            .and_then(|i| fields.get(i))
            .and_then(|v| v.parse::<f64>().ok());
        candidates.push(Candidate {
            campaign_id: campaign_id.clone(),
            donation_percentage,
        });
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn to_ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn subtracts_complete_campaigns_regardless_of_order() {
        let complete: HashSet<String> = ["b".to_string()].into_iter().collect();

        assert_eq!(
            reconcile(&to_ids(&["a", "b", "c"]), &complete),
            to_ids(&["a", "c"])
        );
        assert_eq!(
            reconcile(&to_ids(&["c", "b", "a"]), &complete),
            to_ids(&["c", "a"])
        );
    }

    #[test]
    fn empty_complete_set_keeps_everything() {
        let complete = HashSet::new();
        assert_eq!(
            reconcile(&to_ids(&["a", "b"]), &complete),
            to_ids(&["a", "b"])
        );
    }

    #[test]
    fn duplicate_candidates_are_dropped() {
        let complete = HashSet::new();
        assert_eq!(
            reconcile(&to_ids(&["a", "a", "b"]), &complete),
            to_ids(&["a", "b"])
        );
    }

    #[test]
    fn matching_is_exact_string_equality() {
        let complete: HashSet<String> = ["abc".to_string()].into_iter().collect();
        assert_eq!(
            reconcile(&to_ids(&["abc", "ABC", "abc "]), &complete),
            to_ids(&["ABC", "abc "])
        );
    }

    #[test]
    fn loads_candidates_with_percentage() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "short_url,donation_percentage,category.name").unwrap();
        writeln!(file, "sehatisyawal,0.62,Kesehatan").unwrap();
        writeln!(file, "bantubencana,0.55,Bencana").unwrap();

        let candidates = load_candidates(file.path()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].campaign_id, "sehatisyawal");
        assert_eq!(candidates[0].donation_percentage, Some(0.62));
        assert_eq!(candidates[1].campaign_id, "bantubencana");
    }

    #[test]
    fn quoted_comma_in_earlier_column_keeps_alignment() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "category.name,short_url,donation_percentage").unwrap();
        writeln!(file, "\"Bencana, Alam\",banjirbandang,0.71").unwrap();
        writeln!(file, "Kesehatan,sehatisyawal,0.62").unwrap();

        let candidates = load_candidates(file.path()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].campaign_id, "banjirbandang");
        assert_eq!(candidates[0].donation_percentage, Some(0.71));
        assert_eq!(candidates[1].campaign_id, "sehatisyawal");
    }

    #[test]
    fn rejects_file_without_short_url_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,donation_percentage").unwrap();
        writeln!(file, "x,0.5").unwrap();

        assert!(matches!(
            load_candidates(file.path()),
            Err(HarvestError::Worklist(_))
        ));
    }

    #[test]
    fn skips_blank_and_ragged_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "category.name,short_url").unwrap();
        writeln!(file, "Kesehatan,sehatisyawal").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "OnlyOneField").unwrap();

        let candidates = load_candidates(file.path()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].donation_percentage.is_none());
    }
}

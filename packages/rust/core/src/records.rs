//! CSV record table: the organization catalogue the crawler enriches.
//!
//! The table preserves every input column untouched; only certification
//! columns are written, each holding a `;`-joined sorted list of normalized
//! evidence URLs. Certification columns missing from the input are appended.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use certsweep_shared::{CertKind, CertsweepError, Result, SiteFindings};

/// Column holding each organization's seed website.
pub const WEBSITE_COLUMN: &str = "Company website";

/// Separator between evidence URLs within one cell.
const URL_SEPARATOR: char = ';';

/// An in-memory CSV table of organization records.
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    website_col: usize,
    cert_cols: BTreeMap<CertKind, usize>,
}

impl RecordTable {
    /// Load a table from a CSV file.
    ///
    /// Fails if the `Company website` column is absent. Certification
    /// columns are appended (empty) when the input lacks them.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| CertsweepError::Records(format!("{}: {e}", path.display())))?;

        let mut headers: Vec<String> = reader
            .headers()
            .map_err(|e| CertsweepError::Records(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let website_col = headers
            .iter()
            .position(|h| h == WEBSITE_COLUMN)
            .ok_or_else(|| {
                CertsweepError::Records(format!(
                    "{}: missing required column {WEBSITE_COLUMN:?}",
                    path.display()
                ))
            })?;

        let mut cert_cols = BTreeMap::new();
        for kind in CertKind::ALL {
            let col = match headers.iter().position(|h| h == kind.column()) {
                Some(col) => col,
                None => {
                    headers.push(kind.column().to_string());
                    headers.len() - 1
                }
            };
            cert_cols.insert(kind, col);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| CertsweepError::Records(e.to_string()))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            website_col,
            cert_cols,
        })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The website cell for one row, trimmed.
    pub fn website(&self, row: usize) -> &str {
        self.rows[row][self.website_col].trim()
    }

    /// Parse one row's existing evidence set for a kind (`;`-split).
    pub fn evidence(&self, row: usize, kind: CertKind) -> BTreeSet<String> {
        self.rows[row][self.cert_cols[&kind]]
            .split(URL_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Union crawl findings into one row's certification cells.
    ///
    /// Each touched cell is re-serialized as a sorted `;`-joined string, so
    /// merging the same findings twice is a no-op.
    pub fn merge_findings(&mut self, row: usize, findings: &SiteFindings) {
        for (kind, urls) in findings.iter() {
            if urls.is_empty() {
                continue;
            }
            let mut merged = self.evidence(row, kind);
            merged.extend(urls.iter().cloned());
            let cell = merged.into_iter().collect::<Vec<_>>().join(";");
            self.rows[row][self.cert_cols[&kind]] = cell;
        }
    }

    /// Write the table to a CSV file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| CertsweepError::Records(format!("{}: {e}", path.display())))?;

        writer
            .write_record(&self.headers)
            .map_err(|e| CertsweepError::Records(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| CertsweepError::Records(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| CertsweepError::io(path, e))?;

        Ok(())
    }
}

/// Resolve the output path for an enriched table.
///
/// Defaults to `<input-stem>_certs.csv` beside the input. When the chosen
/// path already exists, a timestamp is inserted before the extension so an
/// earlier run's output is never clobbered.
pub fn resolve_output_path(input: &Path, out: Option<&Path>) -> PathBuf {
    let base = match out {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("records");
            input.with_file_name(format!("{stem}_certs.csv"))
        }
    };

    if !base.exists() {
        return base;
    }

    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("records");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    base.with_file_name(format!("{stem}_{stamp}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use certsweep_shared::SiteFindings;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    const SAMPLE: &str = "\
Company name,Company website,ASC Cert,BAP Cert,FOS Cert,FIP Cert,MarinTrust Cert
Alpha Seafood,http://alpha.example,,,,,
Beta Fish,,http://beta.example/old,,,,
";

    #[test]
    fn load_resolves_columns() {
        let file = write_csv(SAMPLE);
        let table = RecordTable::load(file.path()).expect("load");

        assert_eq!(table.len(), 2);
        assert_eq!(table.website(0), "http://alpha.example");
        assert_eq!(table.website(1), "");
        assert_eq!(
            table.evidence(1, CertKind::Asc).into_iter().collect::<Vec<_>>(),
            ["http://beta.example/old"]
        );
    }

    #[test]
    fn missing_cert_columns_appended() {
        let file = write_csv("Company name,Company website\nAlpha,http://alpha.example\n");
        let table = RecordTable::load(file.path()).expect("load");

        assert!(table.evidence(0, CertKind::MarinTrust).is_empty());

        let out = tempfile::NamedTempFile::new().expect("temp out");
        table.save(out.path()).expect("save");
        let written = std::fs::read_to_string(out.path()).expect("read back");
        assert!(written.starts_with("Company name,Company website,ASC Cert,BAP Cert"));
    }

    #[test]
    fn missing_website_column_rejected() {
        let file = write_csv("Company name,City\nAlpha,Oslo\n");
        let err = RecordTable::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(WEBSITE_COLUMN));
    }

    #[test]
    fn merge_unions_and_sorts() {
        let file = write_csv(SAMPLE);
        let mut table = RecordTable::load(file.path()).expect("load");

        // existing ASC evidence on row 1
        let mut findings = SiteFindings::new();
        findings.insert(CertKind::Asc, "http://beta.example/new");
        table.merge_findings(1, &findings);

        assert_eq!(
            table.rows[1][2],
            "http://beta.example/new;http://beta.example/old"
        );
    }

    #[test]
    fn merge_is_idempotent_and_commutative() {
        let file = write_csv(SAMPLE);

        let mut findings_a = SiteFindings::new();
        findings_a.insert(CertKind::Bap, "http://x.com/a");
        let mut findings_b = SiteFindings::new();
        findings_b.insert(CertKind::Bap, "http://x.com/b");

        let mut ab = RecordTable::load(file.path()).expect("load");
        ab.merge_findings(0, &findings_a);
        ab.merge_findings(0, &findings_b);

        let mut ba = RecordTable::load(file.path()).expect("load");
        ba.merge_findings(0, &findings_b);
        ba.merge_findings(0, &findings_a);
        ba.merge_findings(0, &findings_a);

        assert_eq!(ab.rows[0], ba.rows[0]);
        assert_eq!(ab.rows[0][3], "http://x.com/a;http://x.com/b");
    }

    #[test]
    fn save_load_roundtrip() {
        let file = write_csv(SAMPLE);
        let mut table = RecordTable::load(file.path()).expect("load");

        let mut findings = SiteFindings::new();
        findings.insert(CertKind::Fos, "http://alpha.example/certs");
        table.merge_findings(0, &findings);

        let out = tempfile::NamedTempFile::new().expect("temp out");
        table.save(out.path()).expect("save");

        let reloaded = RecordTable::load(out.path()).expect("reload");
        assert_eq!(
            reloaded.evidence(0, CertKind::Fos).into_iter().collect::<Vec<_>>(),
            ["http://alpha.example/certs"]
        );
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn output_path_avoids_clobbering() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("plants.csv");
        std::fs::write(&input, SAMPLE).expect("write input");

        let fresh = resolve_output_path(&input, None);
        assert_eq!(fresh, dir.path().join("plants_certs.csv"));

        // once the default exists, a timestamped name is chosen
        std::fs::write(&fresh, "x").expect("write");
        let stamped = resolve_output_path(&input, None);
        assert_ne!(stamped, fresh);
        assert!(stamped.file_name().unwrap().to_str().unwrap().starts_with("plants_certs_"));

        // explicit --out not clobbered either
        let explicit = dir.path().join("out.csv");
        assert_eq!(resolve_output_path(&input, Some(&explicit)), explicit);
    }
}

//! Company roster loading.

use std::path::Path;

use jobsift_core::models::{Company, CompanyStatus};
use jobsift_core::AppError;
use serde::Deserialize;

/// A roster row. Only name and career URL are required; platform and
/// status columns may be blank or missing entirely.
#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    career_url: String,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    status: String,
}

/// Read the companies to scan from a CSV roster.
///
/// Rows with a blank name or URL are skipped with a warning rather than
/// failing the run; companies marked `removed` are filtered out.
pub fn read_companies(path: impl AsRef<Path>) -> Result<Vec<Company>, AppError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::ConfigError(format!("open roster {}: {e}", path.display())))?;

    let mut companies = Vec::new();
    for (index, row) in reader.deserialize::<RosterRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line = index + 2, error = %e, "Skipping unreadable roster row");
                continue;
            }
        };
        if row.name.trim().is_empty() || row.career_url.trim().is_empty() {
            tracing::warn!(line = index + 2, "Skipping roster row without name or URL");
            continue;
        }
        let status: CompanyStatus = row.status.parse().unwrap_or(CompanyStatus::Active);
        if status == CompanyStatus::Removed {
            tracing::debug!(company = %row.name, "Skipping removed company");
            continue;
        }

        let mut company = Company::new(row.name.trim(), row.career_url.trim());
        if !row.platform.trim().is_empty() {
            company = company.with_hint(row.platform.trim());
        }
        companies.push(company);
    }

    Ok(companies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn roster(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_full_rows() {
        let file = roster(
            "name,career_url,platform,last_scraped,status\n\
             Acme,https://boards.greenhouse.io/acme,greenhouse,2024-01-01,active\n\
             Globex,https://www.globex.com/careers,,,\n",
        );
        let companies = read_companies(file.path()).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].platform_hint.as_deref(), Some("greenhouse"));
        assert_eq!(companies[1].platform_hint, None);
    }

    #[test]
    fn skips_blank_and_removed_rows() {
        let file = roster(
            "name,career_url,platform,last_scraped,status\n\
             ,https://x.io/careers,,,\n\
             Gone Corp,https://gone.example/careers,,,removed\n\
             Acme,https://www.acme.com/careers,,,\n",
        );
        let companies = read_companies(file.path()).unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Acme");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = read_companies("/nonexistent/companies.csv").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}

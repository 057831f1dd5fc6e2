//! CSV-file ledger: one jobs table, one companies table.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use jobsift_core::models::{CompanyStatus, Job};
use jobsift_core::traits::LedgerStore;
use jobsift_core::AppError;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub const JOBS_FILE: &str = "jobs.csv";
pub const COMPANIES_FILE: &str = "companies.csv";

/// Ledger rooted at a directory holding `jobs.csv` and `companies.csv`.
///
/// Appends go straight to the end of the jobs file; updates rewrite the
/// affected file through a sibling temp file and rename. A shared lock
/// serializes writers across clones; readers outside this process see
/// either the old or the new file, never a partial one.
#[derive(Clone)]
pub struct CsvLedger {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

// -- Internal row types for csv serde --

#[derive(Debug, Serialize, Deserialize)]
struct JobRow {
    job_id: String,
    title: String,
    company: String,
    url: String,
    career_url: String,
    location: String,
    posted_date: String,
    date_added: String,
    last_seen: String,
    keywords: String,
    status: String,
}

impl JobRow {
    fn from_job(job: &Job, now: &str) -> Self {
        Self {
            job_id: job.id.clone(),
            title: job.title.clone(),
            company: job.company_name.clone(),
            url: job.url.clone(),
            career_url: job.company_career_url.clone(),
            location: job.location.clone(),
            posted_date: job.posted_date.clone(),
            date_added: now.to_string(),
            last_seen: now.to_string(),
            keywords: job.matched_keywords.join(", "),
            status: "active".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CompanyRow {
    name: String,
    career_url: String,
    platform: String,
    last_scraped: String,
    status: String,
}

impl CsvLedger {
    /// Open a ledger directory, creating it and an empty jobs table if
    /// they do not exist yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ledger_io_error("create ledger dir", &dir, &e))?;

        let ledger = Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        };
        let jobs_path = ledger.jobs_path();
        if !jobs_path.exists() {
            ledger.write_job_rows(&jobs_path, &[])?;
        }
        Ok(ledger)
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.dir.join(JOBS_FILE)
    }

    pub fn companies_path(&self) -> PathBuf {
        self.dir.join(COMPANIES_FILE)
    }

    fn read_job_rows(&self) -> Result<Vec<JobRow>, AppError> {
        let path = self.jobs_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| ledger_csv_error("read", &path, &e))?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row.map_err(|e| ledger_csv_error("parse", &path, &e))?);
        }
        Ok(rows)
    }

    /// Full rewrite through a temp file in the same directory.
    fn write_job_rows(&self, path: &Path, rows: &[JobRow]) -> Result<(), AppError> {
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)
                .map_err(|e| ledger_csv_error("write", &tmp, &e))?;
            if rows.is_empty() {
                // serde-driven headers only appear with at least one record
                writer
                    .write_record([
                        "job_id",
                        "title",
                        "company",
                        "url",
                        "career_url",
                        "location",
                        "posted_date",
                        "date_added",
                        "last_seen",
                        "keywords",
                        "status",
                    ])
                    .map_err(|e| ledger_csv_error("write", &tmp, &e))?;
            }
            for row in rows {
                writer
                    .serialize(row)
                    .map_err(|e| ledger_csv_error("write", &tmp, &e))?;
            }
            writer
                .flush()
                .map_err(|e| ledger_io_error("flush", &tmp, &e))?;
        }
        fs::rename(&tmp, path).map_err(|e| ledger_io_error("rename", path, &e))
    }

    fn read_company_rows(&self) -> Result<Vec<CompanyRow>, AppError> {
        let path = self.companies_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| ledger_csv_error("read", &path, &e))?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row.map_err(|e| ledger_csv_error("parse", &path, &e))?);
        }
        Ok(rows)
    }

    fn write_company_rows(&self, rows: &[CompanyRow]) -> Result<(), AppError> {
        let path = self.companies_path();
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)
                .map_err(|e| ledger_csv_error("write", &tmp, &e))?;
            for row in rows {
                writer
                    .serialize(row)
                    .map_err(|e| ledger_csv_error("write", &tmp, &e))?;
            }
            writer
                .flush()
                .map_err(|e| ledger_io_error("flush", &tmp, &e))?;
        }
        fs::rename(&tmp, &path).map_err(|e| ledger_io_error("rename", &path, &e))
    }
}

impl LedgerStore for CsvLedger {
    async fn get_existing_ids(&self) -> Result<HashSet<String>, AppError> {
        let rows = self.read_job_rows()?;
        Ok(rows.into_iter().map(|r| r.job_id).collect())
    }

    async fn append_jobs(&self, jobs: &[Job]) -> Result<usize, AppError> {
        if jobs.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;

        let path = self.jobs_path();
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ledger_io_error("open", &path, &e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let now = Utc::now().to_rfc3339();
        for job in jobs {
            writer
                .serialize(JobRow::from_job(job, &now))
                .map_err(|e| ledger_csv_error("append", &path, &e))?;
        }
        writer
            .flush()
            .map_err(|e| ledger_io_error("flush", &path, &e))?;

        tracing::debug!(count = jobs.len(), path = %path.display(), "Appended jobs");
        Ok(jobs.len())
    }

    async fn mark_last_seen(&self, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;

        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut rows = self.read_job_rows()?;
        let now = Utc::now().to_rfc3339();
        let mut touched = 0usize;
        for row in &mut rows {
            if targets.contains(row.job_id.as_str()) {
                row.last_seen = now.clone();
                touched += 1;
            }
        }
        self.write_job_rows(&self.jobs_path(), &rows)?;
        tracing::debug!(touched, "Refreshed last-seen markers");
        Ok(())
    }

    async fn set_company_status(&self, name: &str, status: CompanyStatus) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;

        let mut rows = self.read_company_rows()?;
        let now = Utc::now().to_rfc3339();
        match rows.iter_mut().find(|r| r.name == name) {
            Some(row) => {
                row.last_scraped = now;
                row.status = status.as_str().to_string();
            }
            None => rows.push(CompanyRow {
                name: name.to_string(),
                career_url: String::new(),
                platform: String::new(),
                last_scraped: now,
                status: status.as_str().to_string(),
            }),
        }
        self.write_company_rows(&rows)
    }
}

fn ledger_io_error(action: &str, path: &Path, error: &std::io::Error) -> AppError {
    AppError::LedgerError {
        message: format!("{action} {}: {error}", path.display()),
        retryable: false,
    }
}

fn ledger_csv_error(action: &str, path: &Path, error: &csv::Error) -> AppError {
    AppError::LedgerError {
        message: format!("{action} {}: {error}", path.display()),
        retryable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsift_core::models::Job;

    fn job(id: &str, title: &str) -> Job {
        Job {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://x.io/jobs/{id}"),
            company_name: "Acme".to_string(),
            company_career_url: "https://x.io/careers".to_string(),
            location: "Berlin".to_string(),
            posted_date: String::new(),
            matched_keywords: vec!["data".to_string()],
        }
    }

    #[tokio::test]
    async fn fresh_ledger_has_no_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvLedger::open(dir.path()).unwrap();
        assert!(ledger.get_existing_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appended_jobs_come_back_as_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvLedger::open(dir.path()).unwrap();

        let written = ledger
            .append_jobs(&[job("GH_1", "Data Engineer"), job("a1b2c3", "Data Analyst")])
            .await
            .unwrap();
        assert_eq!(written, 2);

        let ids = ledger.get_existing_ids().await.unwrap();
        assert!(ids.contains("GH_1"));
        assert!(ids.contains("a1b2c3"));
    }

    #[tokio::test]
    async fn appends_accumulate_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvLedger::open(dir.path()).unwrap();

        ledger.append_jobs(&[job("GH_1", "Data Engineer")]).await.unwrap();
        ledger.append_jobs(&[job("GH_2", "ML Engineer")]).await.unwrap();

        assert_eq!(ledger.get_existing_ids().await.unwrap().len(), 2);
        // one header row, two data rows
        let contents = fs::read_to_string(ledger.jobs_path()).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.lines().next().unwrap().starts_with("job_id,"));
    }

    #[tokio::test]
    async fn mark_last_seen_touches_only_targets() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvLedger::open(dir.path()).unwrap();
        ledger
            .append_jobs(&[job("GH_1", "Data Engineer"), job("GH_2", "ML Engineer")])
            .await
            .unwrap();

        let before = ledger.read_job_rows().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        ledger.mark_last_seen(&["GH_2".to_string()]).await.unwrap();

        let after = ledger.read_job_rows().unwrap();
        assert_eq!(after[0].last_seen, before[0].last_seen);
        assert_ne!(after[1].last_seen, before[1].last_seen);
        assert_eq!(after.len(), 2);
    }

    #[tokio::test]
    async fn company_status_upserts() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvLedger::open(dir.path()).unwrap();

        ledger
            .set_company_status("Acme", CompanyStatus::Active)
            .await
            .unwrap();
        ledger
            .set_company_status("Acme", CompanyStatus::Error)
            .await
            .unwrap();
        ledger
            .set_company_status("Globex", CompanyStatus::Active)
            .await
            .unwrap();

        let rows = ledger.read_company_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Acme");
        assert_eq!(rows[0].status, "error");
        assert_eq!(rows[1].status, "active");
    }

    #[tokio::test]
    async fn reopening_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        {
            let ledger = CsvLedger::open(dir.path()).unwrap();
            ledger.append_jobs(&[job("GH_1", "Data Engineer")]).await.unwrap();
        }
        let reopened = CsvLedger::open(dir.path()).unwrap();
        assert!(reopened.get_existing_ids().await.unwrap().contains("GH_1"));
    }
}

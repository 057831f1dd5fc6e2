//! The scan run loop: batches of companies against one ledger snapshot.

use tokio_util::sync::CancellationToken;

use crate::config::ScanConfig;
use crate::error::AppError;
use crate::models::{Company, CompanyStatus, ScanStats};
use crate::reconcile::LedgerSnapshot;
use crate::scan::ScanService;
use crate::traits::{LedgerStore, StrategyFactory};

/// Events emitted by the runner for monitoring/logging.
#[derive(Debug, Clone)]
pub enum ScanEvent<'a> {
    RunStarted {
        companies: usize,
        known_ids: usize,
    },
    BatchStarted {
        batch: usize,
        total_batches: usize,
    },
    CompanyStarted {
        name: &'a str,
        url: &'a str,
    },
    CompanyCompleted {
        name: &'a str,
        new_jobs: usize,
        refreshed: usize,
    },
    CompanyFailed {
        name: &'a str,
        error: &'a str,
    },
    RunCompleted {
        stats: ScanStats,
    },
}

/// Trait for receiving run events (decoupled logging).
pub trait ScanReporter: Send + Sync {
    fn report(&self, event: ScanEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ScanReporter for TracingReporter {
    fn report(&self, event: ScanEvent<'_>) {
        match event {
            ScanEvent::RunStarted {
                companies,
                known_ids,
            } => {
                tracing::info!(companies, known_ids, "Scan run started");
            }
            ScanEvent::BatchStarted {
                batch,
                total_batches,
            } => {
                tracing::info!(batch, total_batches, "Processing batch");
            }
            ScanEvent::CompanyStarted { name, url } => {
                tracing::info!(company = %name, %url, "Company scan started");
            }
            ScanEvent::CompanyCompleted {
                name,
                new_jobs,
                refreshed,
            } => {
                tracing::info!(company = %name, new_jobs, refreshed, "Company scan completed");
            }
            ScanEvent::CompanyFailed { name, error } => {
                tracing::warn!(company = %name, %error, "Company scan failed");
            }
            ScanEvent::RunCompleted { stats } => {
                tracing::info!(
                    processed = stats.companies_processed,
                    errors = stats.companies_with_errors,
                    found = stats.total_jobs_found,
                    new = stats.new_jobs_added,
                    refreshed = stats.existing_jobs_refreshed,
                    "Scan run completed"
                );
            }
        }
    }
}

/// Drives a full run: reads the ledger snapshot once, then walks company
/// batches sequentially with politeness delays. Per-company failures are
/// isolated — one company's error never aborts its siblings.
pub struct ScanRunner<SF: StrategyFactory, L: LedgerStore> {
    service: ScanService<SF>,
    ledger: L,
    config: ScanConfig,
    dry_run: bool,
}

impl<SF: StrategyFactory, L: LedgerStore> ScanRunner<SF, L> {
    pub fn new(factory: SF, ledger: L, config: ScanConfig) -> Self {
        Self {
            service: ScanService::new(factory, &config),
            ledger,
            config,
            dry_run: false,
        }
    }

    /// Classify, extract, and filter, but skip every ledger write.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Run to completion or cancellation. The only fatal error is failing
    /// to read the ledger snapshot before any scraping begins.
    pub async fn run<R: ScanReporter>(
        &self,
        companies: &[Company],
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<ScanStats, AppError> {
        let mut snapshot = if self.dry_run {
            LedgerSnapshot::default()
        } else {
            LedgerSnapshot::new(self.ledger.get_existing_ids().await?)
        };

        reporter.report(ScanEvent::RunStarted {
            companies: companies.len(),
            known_ids: snapshot.len(),
        });

        let mut stats = ScanStats::default();
        let batch_size = self.config.companies_per_batch.max(1);
        let total_batches = companies.len().div_ceil(batch_size);

        'run: for (batch_index, batch) in companies.chunks(batch_size).enumerate() {
            reporter.report(ScanEvent::BatchStarted {
                batch: batch_index + 1,
                total_batches,
            });

            for (company_index, company) in batch.iter().enumerate() {
                if cancel.is_cancelled() {
                    tracing::info!("Cancellation requested; stopping run");
                    break 'run;
                }

                self.process_company(company, &mut snapshot, &mut stats, reporter)
                    .await;

                let is_last_in_batch = company_index + 1 == batch.len();
                if !is_last_in_batch && !self.config.company_delay.is_zero() {
                    tokio::select! {
                        () = tokio::time::sleep(self.config.company_delay) => {}
                        () = cancel.cancelled() => break 'run,
                    }
                }
            }

            let is_last_batch = batch_index + 1 == total_batches;
            if !is_last_batch && !self.config.batch_delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(self.config.batch_delay) => {}
                    () = cancel.cancelled() => break 'run,
                }
            }
        }

        reporter.report(ScanEvent::RunCompleted { stats });
        Ok(stats)
    }

    async fn process_company<R: ScanReporter>(
        &self,
        company: &Company,
        snapshot: &mut LedgerSnapshot,
        stats: &mut ScanStats,
        reporter: &R,
    ) {
        reporter.report(ScanEvent::CompanyStarted {
            name: &company.name,
            url: &company.career_url,
        });

        let jobs = match self.service.collect_jobs(company).await {
            Ok(jobs) => jobs,
            Err(e) => {
                self.record_failure(company, &e.to_string(), stats, reporter)
                    .await;
                return;
            }
        };

        stats.total_jobs_found += jobs.len();
        let reconciled = snapshot.reconcile(jobs);

        if !self.dry_run {
            if let Err(e) = self.persist(company, &reconciled).await {
                self.record_failure(company, &e.to_string(), stats, reporter)
                    .await;
                return;
            }
        }

        stats.companies_processed += 1;
        stats.new_jobs_added += reconciled.new.len();
        stats.existing_jobs_refreshed += reconciled.refresh.len();
        reporter.report(ScanEvent::CompanyCompleted {
            name: &company.name,
            new_jobs: reconciled.new.len(),
            refreshed: reconciled.refresh.len(),
        });
    }

    async fn persist(
        &self,
        company: &Company,
        reconciled: &crate::reconcile::Reconciled,
    ) -> Result<(), AppError> {
        if !reconciled.new.is_empty() {
            let written = self.ledger.append_jobs(&reconciled.new).await?;
            tracing::debug!(company = %company.name, written, "Appended new jobs");
        }
        if !reconciled.refresh.is_empty() {
            self.ledger
                .mark_last_seen(&reconciled.refresh_ids())
                .await?;
        }
        self.ledger
            .set_company_status(&company.name, CompanyStatus::Active)
            .await
    }

    async fn record_failure<R: ScanReporter>(
        &self,
        company: &Company,
        error: &str,
        stats: &mut ScanStats,
        reporter: &R,
    ) {
        stats.companies_with_errors += 1;
        reporter.report(ScanEvent::CompanyFailed {
            name: &company.name,
            error,
        });
        if !self.dry_run {
            // Status write failure on an already-failed company is logged
            // and dropped; the run moves on either way.
            if let Err(e) = self
                .ledger
                .set_company_status(&company.name, CompanyStatus::Error)
                .await
            {
                tracing::warn!(company = %company.name, error = %e, "Failed to record error status");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::RawFragment;
    use crate::pagination::AdvanceOutcome;
    use crate::testutil::{MockFactory, MockLedger, MockStrategy};

    /// Reporter that drops everything.
    struct NullReporter;
    impl ScanReporter for NullReporter {}

    fn config() -> ScanConfig {
        ScanConfig::default().without_delays()
    }

    fn page(fragments: Vec<RawFragment>) -> MockStrategy {
        MockStrategy::scripted(vec![Ok(fragments)], vec![Ok(AdvanceOutcome::End)])
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        // Two fragments on page 1, repeated verbatim on page 2: the pass
        // after page 1 finds nothing new and the traversal exhausts.
        let fragments = vec![
            RawFragment::new("Data Analyst", "/jobs/1").with_location("NYC"),
            RawFragment::new("Office Manager", "/jobs/2"),
        ];
        let strategy = MockStrategy::scripted(
            vec![Ok(fragments.clone()), Ok(fragments)],
            vec![Ok(AdvanceOutcome::Advanced)],
        );
        let factory = MockFactory::new();
        factory.push_strategy(strategy);

        let ledger = MockLedger::empty();
        let runner = ScanRunner::new(factory, ledger.clone(), config());
        let companies = vec![
            Company::new("Acme", "https://boards.example.io/acme").with_hint("generic"),
        ];

        let stats = runner
            .run(&companies, &CancellationToken::new(), &NullReporter)
            .await
            .unwrap();

        assert_eq!(stats.companies_processed, 1);
        assert_eq!(stats.total_jobs_found, 1);
        assert_eq!(stats.new_jobs_added, 1);
        assert_eq!(stats.existing_jobs_refreshed, 0);

        let appended = ledger.appended();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].title, "Data Analyst");
        assert_eq!(appended[0].location, "NYC");
        assert_eq!(appended[0].id.len(), 16);
        assert_eq!(ledger.append_calls(), 1);
        assert_eq!(
            ledger.statuses(),
            vec![("Acme".to_string(), CompanyStatus::Active)]
        );
    }

    #[tokio::test]
    async fn known_job_is_refreshed_not_reappended() {
        let factory = MockFactory::new();
        factory.push_strategy(page(vec![
            RawFragment::new("Data Analyst", "/jobs/1").with_vendor_id("GH_1"),
        ]));

        let ledger = MockLedger::with_ids(["GH_1".to_string()]);
        let runner = ScanRunner::new(factory, ledger.clone(), config());
        let companies = vec![Company::new("Acme", "https://boards.greenhouse.io/acme")];

        let stats = runner
            .run(&companies, &CancellationToken::new(), &NullReporter)
            .await
            .unwrap();

        assert_eq!(stats.new_jobs_added, 0);
        assert_eq!(stats.existing_jobs_refreshed, 1);
        assert_eq!(ledger.append_calls(), 0);
        assert_eq!(ledger.marked_last_seen(), vec!["GH_1".to_string()]);
    }

    #[tokio::test]
    async fn company_failure_is_isolated() {
        let factory = MockFactory::new();
        factory.push_strategy(MockStrategy::failing_prepare(AppError::HttpStatus {
            status: 403,
            url: "https://www.acme.com/careers".into(),
        }));
        factory.push_strategy(page(vec![RawFragment::new("Data Engineer", "/jobs/9")]));

        let ledger = MockLedger::empty();
        let runner = ScanRunner::new(factory, ledger.clone(), config());
        let companies = vec![
            Company::new("Acme", "https://www.acme.com/careers"),
            Company::new("Globex", "https://www.globex.com/careers"),
        ];

        let stats = runner
            .run(&companies, &CancellationToken::new(), &NullReporter)
            .await
            .unwrap();

        assert_eq!(stats.companies_processed, 1);
        assert_eq!(stats.companies_with_errors, 1);
        assert_eq!(stats.new_jobs_added, 1);
        assert_eq!(
            ledger.statuses(),
            vec![
                ("Acme".to_string(), CompanyStatus::Error),
                ("Globex".to_string(), CompanyStatus::Active),
            ]
        );
    }

    #[tokio::test]
    async fn same_job_across_two_companies_written_once() {
        // Same posting surfacing twice in one run: second sight is a
        // refresh, never a second insert.
        let factory = MockFactory::new();
        factory.push_strategy(page(vec![
            RawFragment::new("Data Analyst", "https://x.io/jobs/1").with_vendor_id("GH_7"),
        ]));
        factory.push_strategy(page(vec![
            RawFragment::new("Data Analyst", "https://x.io/jobs/1").with_vendor_id("GH_7"),
        ]));

        let ledger = MockLedger::empty();
        let runner = ScanRunner::new(factory, ledger.clone(), config());
        let companies = vec![
            Company::new("Acme", "https://boards.greenhouse.io/acme"),
            Company::new("Acme EU", "https://boards.greenhouse.io/acme-eu"),
        ];

        let stats = runner
            .run(&companies, &CancellationToken::new(), &NullReporter)
            .await
            .unwrap();

        assert_eq!(stats.new_jobs_added, 1);
        assert_eq!(stats.existing_jobs_refreshed, 1);
        assert_eq!(ledger.appended().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_skips_all_writes() {
        let factory = MockFactory::new();
        factory.push_strategy(page(vec![RawFragment::new("Data Analyst", "/jobs/1")]));

        let ledger = MockLedger::empty();
        let runner = ScanRunner::new(factory, ledger.clone(), config()).dry_run();
        let companies = vec![Company::new("Acme", "https://boards.example.io/acme")];

        let stats = runner
            .run(&companies, &CancellationToken::new(), &NullReporter)
            .await
            .unwrap();

        assert_eq!(stats.new_jobs_added, 1);
        assert_eq!(ledger.append_calls(), 0);
        assert!(ledger.statuses().is_empty());
    }

    #[tokio::test]
    async fn unreadable_snapshot_fails_fast() {
        let factory = MockFactory::new();
        let ledger = MockLedger::empty();
        ledger.push_ids_error(AppError::ConfigError("ledger id not set".into()));

        let runner = ScanRunner::new(factory.clone(), ledger, config());
        let companies = vec![Company::new("Acme", "https://boards.example.io/acme")];

        let err = runner
            .run(&companies, &CancellationToken::new(), &NullReporter)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(factory.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_between_companies() {
        let factory = MockFactory::new();
        let ledger = MockLedger::empty();
        let runner = ScanRunner::new(factory, ledger, config());
        let companies = vec![
            Company::new("Acme", "https://www.acme.com/careers"),
            Company::new("Globex", "https://www.globex.com/careers"),
        ];

        let cancel = CancellationToken::new();
        cancel.cancel();
        let stats = runner
            .run(&companies, &cancel, &NullReporter)
            .await
            .unwrap();

        assert_eq!(stats.companies_processed, 0);
    }

    #[tokio::test]
    async fn append_failure_marks_company_error_and_continues() {
        let factory = MockFactory::new();
        factory.push_strategy(page(vec![RawFragment::new("Data Analyst", "/jobs/1")]));
        factory.push_strategy(page(vec![RawFragment::new("Data Engineer", "/jobs/2")]));

        let ledger = MockLedger::empty();
        ledger.push_append_error(AppError::LedgerError {
            message: "quota exceeded".into(),
            retryable: false,
        });

        let runner = ScanRunner::new(factory, ledger.clone(), config());
        let companies = vec![
            Company::new("Acme", "https://www.acme.com/careers"),
            Company::new("Globex", "https://www.globex.com/careers"),
        ];

        let stats = runner
            .run(&companies, &CancellationToken::new(), &NullReporter)
            .await
            .unwrap();

        assert_eq!(stats.companies_with_errors, 1);
        assert_eq!(stats.companies_processed, 1);
        assert_eq!(
            ledger.statuses(),
            vec![
                ("Acme".to_string(), CompanyStatus::Error),
                ("Globex".to_string(), CompanyStatus::Active),
            ]
        );
    }
}

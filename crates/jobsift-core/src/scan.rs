//! Per-company scan pipeline: classify → traverse → canonicalize → filter.

use crate::builder::{JobRecordBuilder, normalize_whitespace};
use crate::classify::classify;
use crate::config::ScanConfig;
use crate::error::AppError;
use crate::keyword::KeywordMatcher;
use crate::models::{Company, Job};
use crate::pagination::{PaginationController, TraversalOutcome};
use crate::traits::StrategyFactory;

/// Runs the extraction pipeline for one company at a time. Does not touch
/// the ledger; reconciliation and persistence belong to the run loop.
pub struct ScanService<SF: StrategyFactory> {
    factory: SF,
    matcher: KeywordMatcher,
    controller: PaginationController,
    builder: JobRecordBuilder,
}

impl<SF: StrategyFactory> ScanService<SF> {
    pub fn new(factory: SF, config: &ScanConfig) -> Self {
        Self {
            factory,
            matcher: KeywordMatcher::new(config.keywords.clone()),
            controller: PaginationController::new(config.max_pages, config.page_delay),
            builder: JobRecordBuilder::new(),
        }
    }

    /// Extract, canonicalize, and keyword-filter jobs for one company.
    ///
    /// A vendor API that rejects the request with a 4xx is not retried;
    /// the scan falls back to the generic rendered-DOM strategy instead.
    pub async fn collect_jobs(&self, company: &Company) -> Result<Vec<Job>, AppError> {
        let platform = classify(&company.career_url, company.platform_hint.as_deref());
        tracing::info!(
            company = %company.name,
            url = %company.career_url,
            %platform,
            "Scanning career page"
        );

        let outcome = self.traverse(company, platform).await?;
        if outcome.stuck {
            tracing::debug!(company = %company.name, "Traversal ended stuck (no advance control worked)");
        }

        let total = outcome.fragments.len();
        let mut jobs = Vec::new();
        for fragment in &outcome.fragments {
            let matched = self.matcher.matches(&normalize_whitespace(&fragment.title));
            if matched.is_empty() {
                continue;
            }
            match self.builder.build(fragment, company, matched) {
                Some(job) => jobs.push(job),
                None => {
                    tracing::debug!(url = %fragment.url, "Dropping unusable fragment");
                }
            }
        }

        tracing::info!(
            company = %company.name,
            pages = outcome.pages_visited,
            extracted = total,
            matched = jobs.len(),
            "Scan complete"
        );
        Ok(jobs)
    }

    async fn traverse(
        &self,
        company: &Company,
        platform: crate::classify::Platform,
    ) -> Result<TraversalOutcome, AppError> {
        let mut strategy = self.factory.create(company, platform).await?;
        match self.controller.run(&mut strategy).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_permanent_http() && platform.is_api_backed() => {
                tracing::warn!(
                    company = %company.name,
                    %platform,
                    error = %e,
                    "Vendor API rejected the request; falling back to rendered DOM"
                );
                let mut fallback = self.factory.create_fallback(company).await?;
                self.controller.run(&mut fallback).await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Platform;
    use crate::models::RawFragment;
    use crate::pagination::AdvanceOutcome;
    use crate::testutil::{MockFactory, MockStrategy};

    fn service(factory: MockFactory) -> ScanService<MockFactory> {
        ScanService::new(factory, &ScanConfig::default().without_delays())
    }

    #[tokio::test]
    async fn keyword_gate_drops_irrelevant_titles() {
        let factory = MockFactory::new();
        factory.push_strategy(MockStrategy::scripted(
            vec![Ok(vec![
                RawFragment::new("Data Analyst", "/jobs/1").with_location("NYC"),
                RawFragment::new("Office Manager", "/jobs/2"),
            ])],
            vec![Ok(AdvanceOutcome::End)],
        ));

        let company = Company::new("Acme", "https://boards.example.io/acme");
        let jobs = service(factory).collect_jobs(&company).await.unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Data Analyst");
        assert_eq!(jobs[0].location, "NYC");
        assert_eq!(
            jobs[0].matched_keywords,
            vec!["data".to_string(), "analyst".to_string(), "data analyst".to_string()]
        );
        assert_eq!(jobs[0].url, "https://boards.example.io/jobs/1");
    }

    #[tokio::test]
    async fn hint_selects_platform() {
        let factory = MockFactory::new();
        let company =
            Company::new("Acme", "https://boards.example.io/acme").with_hint("generic");
        service(factory.clone())
            .collect_jobs(&company)
            .await
            .unwrap();
        assert_eq!(
            factory.requested.lock().unwrap().as_slice(),
            &[Platform::Generic]
        );
    }

    #[tokio::test]
    async fn permanent_api_failure_falls_back_to_dom() {
        let factory = MockFactory::new();
        factory.push_strategy(MockStrategy::scripted(
            vec![Err(AppError::HttpStatus {
                status: 404,
                url: "https://boards-api.greenhouse.io/v1/boards/acme/jobs".into(),
            })],
            vec![],
        ));
        let fallback = MockStrategy::scripted(
            vec![Ok(vec![RawFragment::new("Data Engineer", "/jobs/7")])],
            vec![Ok(AdvanceOutcome::End)],
        );
        factory.push_fallback(fallback.clone());

        let company = Company::new("Acme", "https://boards.greenhouse.io/acme");
        let jobs = service(factory.clone())
            .collect_jobs(&company)
            .await
            .unwrap();

        assert_eq!(factory.fallback_calls(), 1);
        assert_eq!(fallback.prepare_calls(), 1);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Data Engineer");
    }

    #[tokio::test]
    async fn permanent_failure_on_dom_platform_propagates() {
        let factory = MockFactory::new();
        factory.push_strategy(MockStrategy::failing_prepare(AppError::HttpStatus {
            status: 403,
            url: "https://www.acme.com/careers".into(),
        }));

        let company = Company::new("Acme", "https://www.acme.com/careers");
        let err = service(factory.clone())
            .collect_jobs(&company)
            .await
            .unwrap_err();

        assert!(err.is_permanent_http());
        assert_eq!(factory.fallback_calls(), 0);
    }
}

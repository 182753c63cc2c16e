use std::sync::Arc;

use chrono::{Local, Months, NaiveDate};
use log::debug;

use crate::error::DiscoveryError;
use crate::repository::PatentRepository;
use crate::types::{DatabaseStats, PatentDetail, PatentSummary};

/// Largest number of patents returned by a listing
pub const LIST_LIMIT: usize = 100;
pub const TOP_ASSIGNEES: usize = 10;

/// Read side of the stored patents
pub struct PatentService {
    repository: Arc<dyn PatentRepository>,
}

impl PatentService {
    pub fn new(repository: Arc<dyn PatentRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_patents(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<PatentSummary>, DiscoveryError> {
        self.repository
            .list_patents(search.unwrap_or_default(), LIST_LIMIT)
            .await
    }

    /// # Errors
    /// `DiscoveryError::PatentNotFound` when no such patent is stored
    pub async fn patent_detail(&self, patent_number: &str) -> Result<PatentDetail, DiscoveryError> {
        self.repository
            .find_patent(patent_number)
            .await?
            .ok_or_else(|| DiscoveryError::PatentNotFound(patent_number.to_string()))
    }

    pub async fn database_stats(&self) -> Result<DatabaseStats, DiscoveryError> {
        self.database_stats_as_of(Local::now().date_naive()).await
    }

    /// Statistics with "recent" meaning granted during the year before `today`
    pub async fn database_stats_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<DatabaseStats, DiscoveryError> {
        let counts = self.repository.record_counts().await?;
        let one_year_ago = today.checked_sub_months(Months::new(12)).unwrap_or(today);
        debug!("Counting patents granted since {one_year_ago}");
        let recent = self.repository.count_granted_since(one_year_ago).await?;
        let top_assignees = self.repository.top_assignees(TOP_ASSIGNEES).await?;

        Ok(DatabaseStats {
            total_patents: counts.total_patents,
            total_claims: counts.total_claims,
            total_citations: counts.total_citations,
            recent_patents_1year: recent,
            average_claims_per_patent: average_claims(counts.total_claims, counts.total_patents),
            top_assignees,
        })
    }
}

/// Rounded to one decimal, zero for an empty database
#[allow(clippy::cast_precision_loss)]
pub(crate) fn average_claims(total_claims: i64, total_patents: i64) -> f64 {
    if total_patents <= 0 {
        return 0.0;
    }
    (total_claims as f64 / total_patents as f64 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepo;
    use crate::types::{AssigneeCount, RecordCounts};
    use mockall::predicate::eq;

    #[test]
    fn average_is_rounded_to_one_decimal() {
        assert!((average_claims(20, 3) - 6.7).abs() < f64::EPSILON);
        assert!((average_claims(10, 0)).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn stats_use_the_year_before_today() {
        let mut repo = MockRepo::new();
        repo.expect_record_counts().returning(|| {
            Ok(RecordCounts {
                total_patents: 4,
                total_claims: 10,
                total_citations: 7,
            })
        });
        repo.expect_count_granted_since()
            .with(eq(NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()))
            .returning(|_| Ok(2));
        repo.expect_top_assignees()
            .with(eq(TOP_ASSIGNEES))
            .returning(|_| {
                Ok(vec![AssigneeCount {
                    assignee_name: "Acme".into(),
                    patent_count: 3,
                }])
            });

        let service = PatentService::new(Arc::new(repo));
        let stats = service
            .database_stats_as_of(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
            .await
            .unwrap();

        assert_eq!(stats.recent_patents_1year, 2);
        assert!((stats.average_claims_per_patent - 2.5).abs() < f64::EPSILON);
        assert_eq!(stats.top_assignees.len(), 1);
    }

    #[tokio::test]
    async fn missing_patent_is_not_found() {
        let mut repo = MockRepo::new();
        repo.expect_find_patent().returning(|_| Ok(None));

        let service = PatentService::new(Arc::new(repo));
        let err = service.patent_detail("123").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::PatentNotFound(n) if n == "123"));
    }

    #[tokio::test]
    async fn database_failures_propagate() {
        let mut repo = MockRepo::new();
        repo.expect_list_patents()
            .returning(|_, _| Err(DiscoveryError::Sql("connection reset".into())));

        let service = PatentService::new(Arc::new(repo));
        assert!(matches!(
            service.list_patents(None).await,
            Err(DiscoveryError::Sql(_))
        ));
    }
}

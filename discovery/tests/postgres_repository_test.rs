//! Runs against the database described by the `DB_*` environment variables, read the
//! same way the binaries read them.
//!
//! Start one with `patents db start`, then `cargo test -- --ignored`.
use chrono::NaiveDate;
use discovery::config;
use discovery::error::DiscoveryError;
use discovery::repository::{PatentRepository, PostgresPatentRepository};
use discovery::types::{CitationType, ParsedCitation, ParsedClaim, ParsedPatent};
use serde_json::json;

fn patent(number: &str) -> ParsedPatent {
    ParsedPatent {
        patent_number: number.to_string(),
        title: format!("Integration test patent {number}"),
        abstract_text: Some("Stored by the integration tests".to_string()),
        filing_date: NaiveDate::from_ymd_opt(2018, 6, 20),
        grant_date: NaiveDate::from_ymd_opt(2020, 1, 15),
        assignee_name: Some("Integration Corp".to_string()),
        inventor_names: Some("John Doe".to_string()),
        raw_data: json!({"patent_number": number}),
    }
}

#[tokio::test]
#[ignore = "needs a running PostgreSQL"]
async fn upsert_replace_and_find() -> Result<(), DiscoveryError> {
    let _ = env_logger::builder().is_test(true).try_init();

    let repo = PostgresPatentRepository::connect(&config::from_env()?.database).await?;
    repo.initialize_schema().await?;
    // Twice, the DDL must be idempotent
    repo.initialize_schema().await?;

    let number = "T0000001";
    repo.upsert_patents(&[patent(number)]).await?;
    repo.upsert_patents(&[patent(number)]).await?;

    let claims = vec![
        ParsedClaim {
            patent_number: number.to_string(),
            claim_number: 1,
            claim_text: "A test.".to_string(),
        },
        ParsedClaim {
            patent_number: "T-unknown".to_string(),
            claim_number: 1,
            claim_text: "Orphan".to_string(),
        },
    ];
    assert_eq!(repo.replace_claims(&claims).await?, 1);

    let citation = ParsedCitation {
        citing_patent: number.to_string(),
        cited_patent: "T0000000".to_string(),
        citation_type: CitationType::Backward,
    };
    repo.insert_citations(&[citation.clone()]).await?;
    assert_eq!(repo.insert_citations(&[citation]).await?, 0);

    let detail = repo
        .find_patent(number)
        .await?
        .expect("patent was just stored");
    assert_eq!(detail.claims.len(), 1);
    assert_eq!(detail.cited_patents, vec!["T0000000"]);
    assert_eq!(detail.grant_date, NaiveDate::from_ymd_opt(2020, 1, 15));

    let listed = repo.list_patents("integration test patent", 100).await?;
    assert!(listed.iter().any(|p| p.patent_number == number));
    // LIKE wildcards in the term match themselves
    assert!(repo.list_patents("integration_test", 100).await?.is_empty());
    assert!(repo.list_patents("test%patent", 100).await?.is_empty());
    Ok(())
}

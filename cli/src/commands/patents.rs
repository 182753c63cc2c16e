use discovery::error::DiscoveryError;
use discovery::types::{DatabaseStats, PatentDetail, PatentSummary};
use discovery::{ApplicationRuntime, Operation, OperationResult};

pub async fn search(runtime: &ApplicationRuntime, term: Option<String>) -> Result<(), DiscoveryError> {
    match runtime
        .execute(Operation::ListPatents { search: term })
        .await?
    {
        OperationResult::Patents(patents) => print_patents(&patents),
        other => unreachable!("ListPatents answered with {other:?}"),
    }
    Ok(())
}

fn print_patents(patents: &[PatentSummary]) {
    if patents.is_empty() {
        eprintln!("No patents found. Use 'patents ingest' to fetch some");
        return;
    }
    println!("{:<12} {:<10} {:<30} Title", "Patent", "Granted", "Assignee");
    for patent in patents {
        println!(
            "{:<12} {:<10} {:<30} {}",
            patent.patent_number,
            patent
                .grant_date
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            truncate(patent.assignee_name.as_deref().unwrap_or("-"), 30),
            patent.title
        );
    }
    eprintln!("{} patents", patents.len());
}

pub async fn show(runtime: &ApplicationRuntime, patent_number: String) -> Result<(), DiscoveryError> {
    match runtime
        .execute(Operation::PatentDetail(patent_number))
        .await?
    {
        OperationResult::Patent(patent) => print_patent(&patent),
        other => unreachable!("PatentDetail answered with {other:?}"),
    }
    Ok(())
}

fn print_patent(patent: &PatentDetail) {
    println!("{} {}", patent.patent_number, patent.title);
    println!(
        "Filed: {}  Granted: {}",
        patent
            .filing_date
            .map_or_else(|| "-".to_string(), |d| d.to_string()),
        patent
            .grant_date
            .map_or_else(|| "-".to_string(), |d| d.to_string())
    );
    println!("Assignee: {}", patent.assignee_name.as_deref().unwrap_or("-"));
    println!("Inventors: {}", patent.inventor_names.as_deref().unwrap_or("-"));
    if let Some(abstract_text) = &patent.abstract_text {
        println!("\n{abstract_text}");
    }

    println!("\nClaims ({}):", patent.claims.len());
    for claim in &patent.claims {
        println!("{:>3}. {}", claim.claim_number, claim.claim_text);
    }
    println!("\nCites ({}): {}", patent.cited_patents.len(), patent.cited_patents.join(", "));
    println!(
        "Cited by ({}): {}",
        patent.citing_patents.len(),
        patent.citing_patents.join(", ")
    );
}

pub async fn stats(runtime: &ApplicationRuntime) -> Result<(), DiscoveryError> {
    match runtime.execute(Operation::Stats).await? {
        OperationResult::Stats(stats) => print_stats(&stats),
        other => unreachable!("Stats answered with {other:?}"),
    }
    Ok(())
}

fn print_stats(stats: &DatabaseStats) {
    println!("Patents:                   {}", stats.total_patents);
    println!("Claims:                    {}", stats.total_claims);
    println!("Citations:                 {}", stats.total_citations);
    println!("Granted the last year:     {}", stats.recent_patents_1year);
    println!("Average claims per patent: {:.1}", stats.average_claims_per_patent);
    if !stats.top_assignees.is_empty() {
        println!("\nTop assignees:");
        for assignee in &stats.top_assignees {
            println!("{:>6}  {}", assignee.patent_count, assignee.assignee_name);
        }
    }
}

pub async fn keywords(
    runtime: &ApplicationRuntime,
    user_idea: String,
    max_keywords: usize,
) -> Result<(), DiscoveryError> {
    match runtime
        .execute(Operation::Keywords {
            user_idea,
            max_keywords,
        })
        .await?
    {
        OperationResult::Keywords(keywords) if keywords.is_empty() => {
            eprintln!("No keywords found, nothing would be searched");
        }
        OperationResult::Keywords(keywords) => {
            for (i, keyword) in keywords.split_whitespace().enumerate() {
                println!("{}. {keyword}", i + 1);
            }
            println!("\nSearch query: {keywords}");
        }
        other => unreachable!("Keywords answered with {other:?}"),
    }
    Ok(())
}

/// Cuts `text` to at most `max` characters
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

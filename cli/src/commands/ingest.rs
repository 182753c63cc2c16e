use discovery::error::DiscoveryError;
use discovery::service::ingestion::{Ingest, IngestReport, IngestSource};
use discovery::{ApplicationRuntime, Operation, OperationResult};

use crate::cli::{self, IngestCommand};

impl From<IngestCommand> for IngestSource {
    fn from(cmd: IngestCommand) -> Self {
        match cmd {
            IngestCommand::Idea { idea } => IngestSource::Idea(idea),
            IngestCommand::Assignee { name, since } => IngestSource::Assignee {
                name,
                start_year: since,
            },
            IngestCommand::Ipc { code, year } => IngestSource::TechnologyArea { ipc: code, year },
            IngestCommand::Numbers { numbers } => IngestSource::PatentNumbers(numbers),
        }
    }
}

impl From<cli::Ingest> for Ingest {
    fn from(val: cli::Ingest) -> Self {
        Ingest::new(val.source.into())
            .max_results(val.max_results)
            .store(!val.dry_run)
    }
}

pub async fn execute(runtime: &ApplicationRuntime, ingest: cli::Ingest) -> Result<(), DiscoveryError> {
    let request: Ingest = ingest.into();
    eprintln!("Fetching patents for {}", request.source);

    match runtime.execute(Operation::Ingest(request)).await? {
        OperationResult::Ingested(report) => print_report(&report),
        other => unreachable!("Ingest answered with {other:?}"),
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!("Fetched {} patents from PatentsView", report.raw.len());
    println!(
        "Parsed {} patents, {} claims, {} citations",
        report.batch.patents.len(),
        report.batch.claims.len(),
        report.batch.citations.len()
    );
    match report.stored {
        Some(loaded) => println!(
            "Stored {} patents, {} claims, {} citations",
            loaded.patents, loaded.claims, loaded.citations
        ),
        None => println!("Dry run, nothing stored"),
    }

    for patent in &report.batch.patents {
        println!(
            "{:<12} {:<10} {}",
            patent.patent_number,
            patent
                .grant_date
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            patent.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_does_not_store() {
        let ingest: Ingest = cli::Ingest {
            source: IngestCommand::Ipc {
                code: "H01M".into(),
                year: 2021,
            },
            max_results: 7,
            dry_run: true,
        }
        .into();
        assert_eq!(
            ingest,
            Ingest::new(IngestSource::TechnologyArea {
                ipc: "H01M".into(),
                year: 2021
            })
            .max_results(7)
            .store(false)
        );
    }
}

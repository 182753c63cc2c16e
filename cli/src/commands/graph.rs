use std::fs;

use discovery::error::DiscoveryError;
use discovery::{ApplicationRuntime, Operation, OperationResult};
use log::info;

use crate::cli::GraphCommand;

pub async fn execute(runtime: &ApplicationRuntime, cmd: GraphCommand) -> Result<(), DiscoveryError> {
    match cmd {
        GraphCommand::Rank { limit } => {
            match runtime.execute(Operation::PageRank { limit }).await? {
                OperationResult::Ranked(ranked) => {
                    for (i, patent) in ranked.iter().enumerate() {
                        println!("{:>3}. {:<12} {:.6}", i + 1, patent.patent_number, patent.score);
                    }
                }
                other => unreachable!("PageRank answered with {other:?}"),
            }
        }
        GraphCommand::Communities { min_size } => {
            match runtime.execute(Operation::Communities { min_size }).await? {
                OperationResult::Communities(communities) => {
                    for community in &communities {
                        println!(
                            "Community {} ({} patents): {}",
                            community.id,
                            community.size,
                            community.members.join(", ")
                        );
                    }
                    if communities.is_empty() {
                        eprintln!("No communities with at least {min_size} patents");
                    }
                }
                other => unreachable!("Communities answered with {other:?}"),
            }
        }
        GraphCommand::Path { from, to } => {
            match runtime
                .execute(Operation::CitationPath {
                    from: from.clone(),
                    to: to.clone(),
                })
                .await?
            {
                OperationResult::Path(Some(path)) => println!("{}", path.join(" -> ")),
                OperationResult::Path(None) => {
                    eprintln!("No citation path between {from} and {to}");
                }
                other => unreachable!("CitationPath answered with {other:?}"),
            }
        }
        GraphCommand::Export { output } => match runtime.execute(Operation::ExportCypher).await? {
            OperationResult::Cypher(cypher) => match output {
                Some(path) => {
                    fs::write(&path, cypher)?;
                    info!("Cypher written to {}", path.to_string_lossy());
                    println!("Citation graph written to {}", path.to_string_lossy());
                }
                None => print!("{cypher}"),
            },
            other => unreachable!("ExportCypher answered with {other:?}"),
        },
    }
    Ok(())
}

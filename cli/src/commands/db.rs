//! Database container lifecycle, delegated to `docker compose`.
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{Local, NaiveDateTime};
use discovery::config::AppConfiguration;
use discovery::error::DiscoveryError;
use log::{debug, info};
use tempfile::NamedTempFile;

use crate::cli::DbCommand;

const DOCKER: &str = "docker";

/// One `docker` invocation, with optional redirections
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DockerInvocation {
    pub args: Vec<String>,
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
}

impl DockerInvocation {
    fn compose(config: &AppConfiguration, args: &[&str]) -> Self {
        let mut all = vec![
            "compose".to_string(),
            "-f".to_string(),
            config.docker.compose_file.clone(),
        ];
        all.extend(args.iter().map(ToString::to_string));
        DockerInvocation {
            args: all,
            stdin: None,
            stdout: None,
        }
    }
}

/// `<backup_dir>/patent_discovery_<YYYYmmdd_HHMMSS>.sql`
pub(crate) fn backup_file(config: &AppConfiguration, now: NaiveDateTime) -> PathBuf {
    Path::new(&config.docker.backup_dir).join(format!(
        "patent_discovery_{}.sql",
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// The docker invocations carrying out `cmd`, in order
pub(crate) fn plan(
    cmd: &DbCommand,
    config: &AppConfiguration,
    now: NaiveDateTime,
) -> Vec<DockerInvocation> {
    let postgres = config.docker.postgres_service.as_str();
    let user = config.database.user.as_str();
    let name = config.database.name.as_str();

    match cmd {
        DbCommand::Start => vec![DockerInvocation::compose(config, &["up", "-d"])],
        DbCommand::Stop => vec![DockerInvocation::compose(config, &["stop"])],
        DbCommand::Restart => vec![DockerInvocation::compose(config, &["restart"])],
        DbCommand::Status => vec![DockerInvocation::compose(config, &["ps"])],
        DbCommand::Logs { follow, service } => {
            let mut args = vec!["logs"];
            if *follow {
                args.push("-f");
            }
            if let Some(service) = service {
                args.push(service.as_str());
            }
            vec![DockerInvocation::compose(config, &args)]
        }
        DbCommand::Backup { file } => {
            let target = file.clone().unwrap_or_else(|| backup_file(config, now));
            let mut dump = DockerInvocation::compose(
                config,
                &["exec", "-T", postgres, "pg_dump", "-U", user, "-d", name],
            );
            dump.stdout = Some(target);
            vec![dump]
        }
        DbCommand::Restore { file } => {
            let mut restore = DockerInvocation::compose(
                config,
                &["exec", "-T", postgres, "psql", "-U", user, "-d", name],
            );
            restore.stdin = Some(file.clone());
            vec![restore]
        }
        DbCommand::Reset => vec![
            DockerInvocation::compose(config, &["down", "-v"]),
            DockerInvocation::compose(config, &["up", "-d"]),
        ],
    }
}

/// Runs `program` with the invocation's arguments.
///
/// Standard output goes to a temporary file next to the target, which replaces the target
/// only when the command succeeds.
fn run(program: &str, invocation: &DockerInvocation) -> Result<(), DiscoveryError> {
    let command_line = format!("{program} {}", invocation.args.join(" "));
    debug!("Running {command_line}");

    let mut command = Command::new(program);
    command.args(&invocation.args);
    if let Some(input) = &invocation.stdin {
        command.stdin(Stdio::from(File::open(input)?));
    }
    let dump = match &invocation.stdout {
        Some(output) => {
            let dir = match output.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(dir) => {
                    fs::create_dir_all(dir)?;
                    dir.to_path_buf()
                }
                None => PathBuf::from("."),
            };
            let dump = NamedTempFile::new_in(dir)?;
            command.stdout(Stdio::from(dump.reopen()?));
            Some((dump, output))
        }
        None => None,
    };

    let status = command.status().map_err(|e| DiscoveryError::Command {
        command: command_line.clone(),
        reason: e.to_string(),
    })?;
    if !status.success() {
        return Err(DiscoveryError::Command {
            command: command_line,
            reason: format!("exited with {status}"),
        });
    }
    if let Some((dump, output)) = dump {
        dump.persist(output).map_err(|e| e.error)?;
    }
    Ok(())
}

pub fn execute(cmd: &DbCommand, config: &AppConfiguration) -> Result<(), DiscoveryError> {
    if let DbCommand::Restore { file } = cmd {
        if !file.is_file() {
            return Err(DiscoveryError::BadInput(format!(
                "Backup file {} does not exist",
                file.to_string_lossy()
            )));
        }
    }

    for invocation in plan(cmd, config, Local::now().naive_local()) {
        run(DOCKER, &invocation)?;
        if let Some(output) = &invocation.stdout {
            info!("Database written to {}", output.to_string_lossy());
            println!("Backup written to {}", output.to_string_lossy());
        }
    }
    match cmd {
        DbCommand::Start => println!("Database containers started"),
        DbCommand::Stop => println!("Database containers stopped"),
        DbCommand::Restore { file } => {
            println!("Database restored from {}", file.to_string_lossy());
        }
        DbCommand::Reset => println!("Database containers reset, all data removed"),
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 59)
            .unwrap()
    }

    fn args(invocation: &DockerInvocation) -> Vec<&str> {
        invocation.args.iter().map(String::as_str).collect()
    }

    #[test]
    fn start_uses_the_compose_file() {
        let plan = plan(&DbCommand::Start, &AppConfiguration::default(), now());
        assert_eq!(plan.len(), 1);
        assert_eq!(
            args(&plan[0]),
            vec!["compose", "-f", "docker-compose.yml", "up", "-d"]
        );
    }

    #[test]
    fn logs_follow_one_service() {
        let cmd = DbCommand::Logs {
            follow: true,
            service: Some("neo4j".into()),
        };
        let plan = plan(&cmd, &AppConfiguration::default(), now());
        assert_eq!(&args(&plan[0])[3..], ["logs", "-f", "neo4j"]);
    }

    #[test]
    fn backup_is_time_stamped() {
        let config = AppConfiguration::default();
        let plan = plan(&DbCommand::Backup { file: None }, &config, now());
        let dump = &plan[0];
        assert_eq!(
            dump.stdout,
            Some(PathBuf::from("backups/patent_discovery_20240309_140559.sql"))
        );
        assert_eq!(
            &args(dump)[3..],
            [
                "exec",
                "-T",
                "postgres",
                "pg_dump",
                "-U",
                config.database.user.as_str(),
                "-d",
                config.database.name.as_str()
            ]
        );
    }

    #[test]
    fn restore_pipes_the_file() {
        let plan = plan(
            &DbCommand::Restore {
                file: PathBuf::from("dump.sql"),
            },
            &AppConfiguration::default(),
            now(),
        );
        assert_eq!(plan[0].stdin, Some(PathBuf::from("dump.sql")));
        assert!(args(&plan[0]).contains(&"psql"));
    }

    #[test]
    fn reset_removes_volumes_then_starts() {
        let plan = plan(&DbCommand::Reset, &AppConfiguration::default(), now());
        assert_eq!(plan.len(), 2);
        assert_eq!(&args(&plan[0])[3..], ["down", "-v"]);
        assert_eq!(&args(&plan[1])[3..], ["up", "-d"]);
    }

    #[test]
    fn restore_of_a_missing_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = DbCommand::Restore {
            file: dir.path().join("missing.sql"),
        };
        let result = execute(&cmd, &AppConfiguration::default());
        assert!(matches!(result, Err(DiscoveryError::BadInput(_))));
    }

    fn backup_to(target: &Path) -> DockerInvocation {
        let cmd = DbCommand::Backup {
            file: Some(target.to_path_buf()),
        };
        plan(&cmd, &AppConfiguration::default(), now()).remove(0)
    }

    #[cfg(unix)]
    #[test]
    fn failed_backup_keeps_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("backup.sql");
        fs::write(&target, "-- previous dump").unwrap();

        let result = run("false", &backup_to(&target));

        assert!(matches!(result, Err(DiscoveryError::Command { .. })));
        assert_eq!(fs::read_to_string(&target).unwrap(), "-- previous dump");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn failed_backup_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("backup.sql");

        assert!(run("false", &backup_to(&target)).is_err());
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn successful_backup_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("backup.sql");

        run("echo", &backup_to(&target)).unwrap();

        let dump = fs::read_to_string(&target).unwrap();
        assert!(dump.contains("pg_dump"));
    }
}

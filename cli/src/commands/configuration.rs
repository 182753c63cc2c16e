use discovery::config::{self, AppConfiguration};
use discovery::error::DiscoveryError;

use crate::cli::{ConfigCommand, UpdateConfiguration};

fn list() {
    println!(
        "Configuration file {}:\n",
        config::configuration_file().to_string_lossy()
    );

    match config::load().map(|cfg| config::application_config_to_string(&cfg)) {
        Ok(Ok(toml_as_string)) => println!("{toml_as_string}"),
        Ok(Err(e)) => println!("Unable to render the configuration: {e}"),
        Err(e) => println!("Unable to load the configuration: {e}"),
    }
}

pub(crate) fn apply(update: UpdateConfiguration, app_config: &mut AppConfiguration) {
    if let Some(api_key) = update.api_key {
        app_config.patentsview.api_key = Some(api_key);
    }
    if let Some(url) = update.url {
        app_config.patentsview.url = url;
    }
    if let Some(host) = update.db_host {
        app_config.database.host = host;
    }
    if let Some(port) = update.db_port {
        app_config.database.port = port;
    }
    if let Some(name) = update.db_name {
        app_config.database.name = name;
    }
    if let Some(user) = update.db_user {
        app_config.database.user = user;
    }
    if let Some(password) = update.db_password {
        app_config.database.password = password;
    }
    if let Some(address) = update.server_address {
        app_config.server.address = address;
    }
    if let Some(address) = update.mcp_address {
        app_config.mcp.address = address;
    }
    if let Some(compose_file) = update.compose_file {
        app_config.docker.compose_file = compose_file;
    }
}

pub fn execute(cmd: ConfigCommand) -> Result<(), DiscoveryError> {
    match cmd {
        ConfigCommand::List => list(),
        ConfigCommand::Update(update) => {
            let mut app_config = config::load()?;
            apply(update, &mut app_config);
            config::save(&app_config)?;
            println!(
                "Configuration saved to {}",
                config::configuration_file().to_string_lossy()
            );
        }
        ConfigCommand::Remove => match config::remove() {
            Ok(()) => {
                println!(
                    "Configuration file {} removed",
                    config::configuration_file().to_string_lossy()
                );
            }
            Err(e) => {
                println!(
                    "ERROR:Unable to remove configuration file {} : {}",
                    config::configuration_file().to_string_lossy(),
                    e
                );
            }
        },
    }
    Ok(())
}

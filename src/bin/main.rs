use std::{io::IsTerminal, process::ExitCode};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hostctl::{
    cli::{Cli, Commands, ConfigCommands, HostCommands, parse_args},
    config::{Settings, load_settings},
    error::ManageError,
    host::{HostManager, HostRecord},
    index::HostIndexFile,
    restart::ServiceRestarter,
    template,
};

fn main() -> ExitCode {
    let args = parse_args();
    init_logging(&args);
    template::init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn run(args: Cli) -> Result<(), ManageError> {
    let settings = load_settings(args.config.as_deref())?;

    match args.command {
        Commands::Host { command } => run_host(&settings, command),
        Commands::Restart { services } => {
            let restarter = ServiceRestarter::new(&settings.supervisor_ctl);
            let report = restarter.restart_many(&services);
            if !report.all_succeeded() {
                warn!(
                    "{} of {} service(s) failed to restart: {}",
                    report.failed.len(),
                    services.len(),
                    report.failed.join(", ")
                );
            }
            Ok(())
        }
    }
}

fn run_host(settings: &Settings, command: HostCommands) -> Result<(), ManageError> {
    let manager = HostManager::from_settings(settings);

    match command {
        HostCommands::Add(add) => {
            let record = HostRecord::new(add.domain, add.container, add.port)?;
            manager.add(&record)
        }
        HostCommands::Del { domain } => manager.del(&domain),
        HostCommands::Ls { long } => {
            let index = if long {
                manager.index().load().unwrap_or_else(|err| {
                    warn!("Could not read host index: {err}");
                    HostIndexFile::default()
                })
            } else {
                HostIndexFile::default()
            };

            for domain in manager.list()? {
                if !long {
                    println!("{domain}");
                    continue;
                }
                match index.get(&domain) {
                    Some(binding) => println!(
                        "{domain}\t{}:{}",
                        binding.container_name, binding.container_port
                    ),
                    None => println!("{domain}\t-"),
                }
            }
            Ok(())
        }
        HostCommands::Config {
            command: ConfigCommands::Recreate { all, domains },
        } => {
            let report = if all {
                manager.recreate_all_configs()?
            } else {
                manager.recreate_configs(&domains)
            };
            info!(
                "Recreated {} config(s), {} failed",
                report.recreated.len(),
                report.failed.len()
            );
            Ok(())
        }
    }
}

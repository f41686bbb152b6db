use std::env;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use snowledger::admin::{Console, NAME, VERSION};
use snowledger::command::read_commands;
use snowledger::{Config, Currency, Economy};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .expect("usage: snowledger <commands.csv> [data-dir]");

    let mut config = Config::from_env();
    if let Some(data_dir) = args.next() {
        config = config.with_data_dir(data_dir);
    }

    if !path.ends_with(".csv") {
        warn!(path, "command script seems to not be a csv file");
    }

    info!(data_dir = %config.data_dir.display(), "loading {NAME} v{VERSION}");
    let economy = Economy::from_config(&config);
    if let Err(e) = economy.register_currency(Currency::snowballs()) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let commands = match read_commands(path) {
        Ok(commands) => commands,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    Console::new(Arc::new(economy))
        .run(ReceiverStream::new(command_receiver), io::stdout())
        .await;

    ExitCode::SUCCESS
}

//! native-form - cloud inventory with an encrypted credential vault.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use native_form::cli::output;
use native_form::cli::{execute, Cli, LogFormat};
use native_form::core::constants::{AWS_CLI_ENV, AZ_CLI_ENV, KEY_ENV, LOG_ENV};
use native_form::error::{CipherError, ConfigError, Error, ExecError};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries exports and JSON output.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("native_form=debug")
        } else {
            EnvFilter::new("native_form=warn")
        }
    });

    match cli.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::Config(ConfigError::MissingKey(_)) => {
                Some(format!("run: native-form keygen, then export {}", KEY_ENV))
            }
            Error::Cipher(CipherError::InvalidKey(_)) => {
                Some(format!("{} must hold a key from native-form keygen", KEY_ENV))
            }
            Error::Exec(ExecError::CommandNotFound(_)) => {
                Some(format!("set {} or {}", AWS_CLI_ENV, AZ_CLI_ENV))
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}

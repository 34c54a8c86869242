//! Subcommand handlers. Results go to stdout, logs to stderr.

use std::io::Write;
use std::process::ExitCode;

use super::{properties, Command, PropertyArgs};
use crate::config::AppConfig;
use crate::{create_services, Collaborators, ConnectorServices};

/// Wire the services against AWS and run `command`
pub async fn run(command: Command, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let services = create_services(config, Collaborators::aws_in_memory())?;
    let mut out = std::io::stdout();

    execute(command, &services, &mut out).await
}

/// Run `command` against already wired services, writing results to `out`
pub async fn execute(
    command: Command,
    services: &ConnectorServices,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    match command {
        Command::Validate(args) => validate(&args, services, out),
        Command::Describe(args) => describe(&args, services, out),
        Command::Test(args) => test(&args, services, out).await,
        Command::Defaults => defaults(services, out),
    }
}

fn validate(
    args: &PropertyArgs,
    services: &ConnectorServices,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let properties = properties::load(args)?;
    let invalid = services.factory.get_invalid_properties(&properties);

    if invalid.is_empty() {
        writeln!(out, "Properties are valid")?;
        return Ok(ExitCode::SUCCESS);
    }

    for property in &invalid {
        writeln!(out, "{property}")?;
    }

    Ok(ExitCode::FAILURE)
}

fn describe(
    args: &PropertyArgs,
    services: &ConnectorServices,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let properties = properties::load(args)?;
    writeln!(out, "{}", services.factory.describe_connection(&properties))?;

    Ok(ExitCode::SUCCESS)
}

async fn test(
    args: &PropertyArgs,
    services: &ConnectorServices,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let properties = properties::load(args)?;

    let invalid = services.tester.get_invalid_properties(&properties);
    if !invalid.is_empty() {
        for property in &invalid {
            writeln!(out, "{property}")?;
        }
        return Ok(ExitCode::FAILURE);
    }

    match services.tester.test_connection(&properties).await {
        Ok(result) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            writeln!(out, "Connection test failed: {err}")?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn defaults(services: &ConnectorServices, out: &mut impl Write) -> anyhow::Result<ExitCode> {
    let defaults = services.factory.default_properties();
    writeln!(out, "{}", serde_json::to_string_pretty(&defaults)?)?;

    Ok(ExitCode::SUCCESS)
}

//! CLI module for the AWS connector
//!
//! Subcommands work on a single set of connection properties:
//! - `validate`: report invalid properties
//! - `describe`: one-line description of the resolved credentials
//! - `test`: resolve credentials and ask STS who they belong to
//! - `defaults`: print the default properties

pub mod commands;
pub mod properties;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// AWS Connector - resolve, test and describe AWS connection credentials
#[derive(Parser)]
#[command(name = "aws-connector")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Report every invalid property
    Validate(PropertyArgs),

    /// Describe the credentials the properties resolve to
    Describe(PropertyArgs),

    /// Resolve credentials and check them against STS
    Test(PropertyArgs),

    /// Print the default connection properties as JSON
    Defaults,
}

/// Where connection properties come from
#[derive(Args, Debug, Clone, Default)]
pub struct PropertyArgs {
    /// Connection property as key=value, repeatable; overrides the file
    #[arg(short = 'p', long = "property", value_parser = properties::parse_property)]
    pub properties: Vec<(String, String)>,

    /// TOML or JSON file holding a flat map of properties
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommand_with_properties() {
        let cli = Cli::try_parse_from([
            "aws-connector",
            "validate",
            "-p",
            "credentialsType=static",
            "--property",
            "region=eu-west-1",
            "--file",
            "conn.toml",
        ])
        .unwrap();

        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(
            args.properties,
            vec![
                ("credentialsType".to_string(), "static".to_string()),
                ("region".to_string(), "eu-west-1".to_string()),
            ]
        );
        assert_eq!(args.file, Some(PathBuf::from("conn.toml")));
    }

    #[test]
    fn test_malformed_property_is_rejected() {
        assert!(Cli::try_parse_from(["aws-connector", "test", "-p", "region"]).is_err());
    }

    #[test]
    fn test_defaults_takes_no_properties() {
        let cli = Cli::try_parse_from(["aws-connector", "defaults"]).unwrap();
        assert!(matches!(cli.command, Command::Defaults));
    }
}

//! Loading connection properties from files and `key=value` arguments

use std::path::Path;

use anyhow::{bail, Context};

use super::PropertyArgs;
use crate::domain::ConnectionProperties;

/// Parse one `key=value` argument. The value may itself contain `=`.
pub fn parse_property(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing property name in '{raw}'"));
    }

    Ok((key.to_string(), value.to_string()))
}

/// File properties first, then `-p` pairs on top
pub fn load(args: &PropertyArgs) -> anyhow::Result<ConnectionProperties> {
    let mut properties = match &args.file {
        Some(path) => read_file(path)?,
        None => ConnectionProperties::new(),
    };

    for (key, value) in &args.properties {
        properties = properties.rewritten(key.clone(), value.clone());
    }

    Ok(properties)
}

fn read_file(path: &Path) -> anyhow::Result<ConnectionProperties> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read properties file {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_json(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
    } else {
        parse_toml(&content).with_context(|| format!("Invalid TOML in {}", path.display()))
    }
}

fn parse_json(content: &str) -> anyhow::Result<ConnectionProperties> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;

    let mut properties = ConnectionProperties::new();
    for (key, value) in map {
        let value = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => continue,
            _ => bail!("property '{key}' must be a string, number or boolean"),
        };
        properties = properties.with(key, value);
    }

    Ok(properties)
}

fn parse_toml(content: &str) -> anyhow::Result<ConnectionProperties> {
    let table: toml::Table = toml::from_str(content)?;

    let mut properties = ConnectionProperties::new();
    for (key, value) in table {
        let value = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            _ => bail!("property '{key}' must be a string, integer or boolean"),
        };
        properties = properties.with(key, value);
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::keys;

    #[test]
    fn test_parse_property_keeps_equals_in_value() {
        assert_eq!(
            parse_property("secretAccessKey=abc=def").unwrap(),
            ("secretAccessKey".to_string(), "abc=def".to_string())
        );
        assert!(parse_property("=value").is_err());
        assert!(parse_property("novalue").is_err());
    }

    #[test]
    fn test_parse_toml_scalars() {
        let props = parse_toml(
            r#"
            credentialsType = "session"
            sessionDurationSeconds = 3600
            "#,
        )
        .unwrap();

        assert_eq!(props.credentials_type(), Some("session"));
        assert_eq!(props.get(keys::SESSION_DURATION_SECONDS), Some("3600"));
    }

    #[test]
    fn test_parse_toml_rejects_tables() {
        assert!(parse_toml("[nested]\nkey = \"v\"").is_err());
    }

    #[test]
    fn test_parse_json_skips_nulls() {
        let props =
            parse_json(r#"{"credentialsType": "static", "sessionToken": null, "x": 1}"#).unwrap();

        assert_eq!(props.len(), 2);
        assert!(!props.contains(keys::SESSION_TOKEN));
        assert_eq!(props.get("x"), Some("1"));
    }

    #[test]
    fn test_arguments_override_file() {
        let path = std::env::temp_dir().join(format!(
            "aws-connector-props-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"region": "us-east-1", "accessKeyId": "AKIA"}"#).unwrap();

        let args = PropertyArgs {
            properties: vec![("region".to_string(), "eu-west-1".to_string())],
            file: Some(path.clone()),
        };
        let props = load(&args).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(props.get(keys::REGION), Some("eu-west-1"));
        assert_eq!(props.get(keys::ACCESS_KEY_ID), Some("AKIA"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let args = PropertyArgs {
            properties: Vec::new(),
            file: Some("/nonexistent/aws-connector.toml".into()),
        };

        assert!(load(&args).is_err());
    }
}

/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reading override layers from files.

use crate::error::SourceError;
use layerfig_value::{ConfigMap, ConfigValue};
use std::path::Path;

/// File formats understood by [`load_file`], chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
    Ini,
}

impl Format {
    /// Pick the format from a file extension (`yaml`, `yml`, `json`, `toml`, `ini`).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            "ini" => Some(Format::Ini),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Load a configuration file into a tree.
///
/// The top level must be a mapping. An empty YAML file is an empty mapping.
/// INI files become one mapping per section, with string values; keys outside
/// any section are ignored.
pub fn load_file(path: impl AsRef<Path>) -> Result<ConfigMap, SourceError> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(SourceError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let format = Format::from_path(path).ok_or_else(|| SourceError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;

    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let map = parse(&text, format, path)?;
    tracing::debug!(path = %path.display(), ?format, keys = map.len(), "Loaded configuration file");
    Ok(map)
}

/// Parse configuration text in the given format.
///
/// `path` is only used for error messages.
pub fn parse(text: &str, format: Format, path: &Path) -> Result<ConfigMap, SourceError> {
    let value = match format {
        Format::Yaml => parse_yaml(text, path)?,
        Format::Json => {
            let json: serde_json::Value =
                serde_json::from_str(text).map_err(|source| SourceError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            ConfigValue::from(json)
        }
        Format::Toml => {
            let table: toml::Table = toml::from_str(text).map_err(|source| SourceError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
            ConfigValue::from(toml::Value::Table(table))
        }
        Format::Ini => return parse_ini(text, path),
    };

    let kind = value.type_name();
    value.into_mapping().ok_or_else(|| SourceError::NotAMapping {
        path: path.to_path_buf(),
        kind,
    })
}

fn parse_yaml(text: &str, path: &Path) -> Result<ConfigValue, SourceError> {
    if text.trim().is_empty() {
        return Ok(ConfigValue::mapping());
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|source| SourceError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    // a document holding only comments parses as null
    if yaml.is_null() {
        return Ok(ConfigValue::mapping());
    }

    ConfigValue::try_from(yaml).map_err(|source| SourceError::Value {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_ini(text: &str, path: &Path) -> Result<ConfigMap, SourceError> {
    let ini = ini::Ini::load_from_str(text).map_err(|source| SourceError::Ini {
        path: path.to_path_buf(),
        source,
    })?;

    let mut map = ConfigMap::new();
    for (section, properties) in ini.iter() {
        let Some(section) = section else {
            continue;
        };

        let entries: ConfigMap = properties
            .iter()
            .map(|(key, value)| (key.to_string(), ConfigValue::from(value)))
            .collect();
        map.insert(section.to_string(), ConfigValue::Mapping(entries));
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn expected_types() -> ConfigMap {
        ConfigValue::from(json!({
            "types": {
                "string": "Hello",
                "integer": 1,
                "float": 2.718,
                "boolean": true,
                "nothing": null,
                "array": [1, 2, {"obj": "mapping"}]
            }
        }))
        .into_mapping()
        .unwrap()
    }

    #[test]
    fn test_yaml_and_yml() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "\
types:
    string: Hello
    integer: 1
    float: 2.718
    boolean: true
    nothing: null
    array:
        - 1
        - 2
        - obj: mapping
";

        for name in ["test.yaml", "test.yml"] {
            let path = write(&dir, name, contents);
            assert_eq!(load_file(&path).unwrap(), expected_types());
        }
    }

    #[test]
    fn test_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "test.json",
            r#"{
                "types": {
                    "string": "Hello",
                    "integer": 1,
                    "float": 2.718,
                    "boolean": true,
                    "nothing": null,
                    "array": [ 1, 2, { "obj": "mapping" } ]
                }
            }"#,
        );

        assert_eq!(load_file(&path).unwrap(), expected_types());
    }

    #[test]
    fn test_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "test.toml",
            "[types]\nstring = \"Hello\"\ninteger = 1\nfloat = 2.718\nboolean = true\narray = [1, 2, 3]\n",
        );

        let expected = ConfigValue::from(json!({
            "types": {
                "string": "Hello",
                "integer": 1,
                "float": 2.718,
                "boolean": true,
                "array": [1, 2, 3]
            }
        }));
        assert_eq!(ConfigValue::Mapping(load_file(&path).unwrap()), expected);
    }

    #[test]
    fn test_ini_sections_hold_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "test.ini",
            "top = ignored\n\n[types]\nstring = Hello\ninteger = 1\nboolean = true\n",
        );

        let expected = ConfigValue::from(json!({
            "types": {"string": "Hello", "integer": "1", "boolean": "true"}
        }));
        assert_eq!(ConfigValue::Mapping(load_file(&path).unwrap()), expected);
    }

    #[test]
    fn test_yaml_integer_keys_become_index_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "o.yaml", "direct:\n  0: 100\n  -1: 5\n");

        let map = load_file(&path).unwrap();
        let direct = map["direct"].as_mapping().unwrap();
        assert_eq!(direct.keys().collect::<Vec<_>>(), vec!["0", "-1"]);
    }

    #[test]
    fn test_empty_yaml_is_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write(&dir, "empty.yaml", "");
        let comments = write(&dir, "comments.yaml", "# nothing here\n");

        assert!(load_file(&empty).unwrap().is_empty());
        assert!(load_file(&comments).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path()).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.xml", "<config/>");

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFormat { ref extension, .. } if extension == "xml"));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.json", "[1, 2]");

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, SourceError::NotAMapping { kind: "sequence", .. }));
    }

    #[test]
    fn test_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();

        let json = write(&dir, "bad.json", "{");
        assert!(matches!(load_file(&json).unwrap_err(), SourceError::Json { .. }));

        let toml = write(&dir, "bad.toml", "a = ");
        assert!(matches!(load_file(&toml).unwrap_err(), SourceError::Toml { .. }));

        let yaml = write(&dir, "bad.yaml", "a: [1, 2");
        assert!(matches!(load_file(&yaml).unwrap_err(), SourceError::Yaml { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_extension("YML"), Some(Format::Yaml));
        assert_eq!(Format::from_extension("ini"), Some(Format::Ini));
        assert_eq!(Format::from_extension("cfg"), None);
    }
}

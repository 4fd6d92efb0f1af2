/*
 * evaluators/cat.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::{Evaluator, EvaluatorError};
use encoding_rs::Encoding;
use layerfig_value::ConfigValue;
use std::path::{Path, PathBuf};

/// Substitutes the contents of a file.
///
/// Syntax: `${{cat.path/to/file}}`, optionally with an encoding label:
/// `${{cat./path/to/file:latin1}}`. The default encoding is UTF-8. Labels are
/// the WHATWG encoding labels, plus `ascii`/`us-ascii` which reject any byte
/// above 0x7F.
///
/// A suffix after the last `:` is only treated as an encoding when it contains
/// no path separator, so `C:\config\key.txt` is read as a plain path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatEvaluator;

impl CatEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for CatEvaluator {
    fn name(&self) -> &str {
        "cat"
    }

    fn evaluate(&self, argument: &str) -> Result<ConfigValue, EvaluatorError> {
        let (path, encoding) = split_encoding(argument);
        let path = Path::new(path);

        let bytes = std::fs::read(path).map_err(|source| EvaluatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::trace!(path = %path.display(), bytes = bytes.len(), "Read file for template");
        decode(bytes, encoding.unwrap_or("utf-8"), path).map(ConfigValue::String)
    }
}

fn split_encoding(argument: &str) -> (&str, Option<&str>) {
    match argument.rsplit_once(':') {
        Some((path, label))
            if !path.is_empty() && !label.is_empty() && !label.contains(['/', '\\']) =>
        {
            (path, Some(label))
        }
        _ => (argument, None),
    }
}

fn decode(bytes: Vec<u8>, label: &str, path: &Path) -> Result<String, EvaluatorError> {
    let decode_error = || EvaluatorError::Decode {
        path: PathBuf::from(path),
        encoding: label.to_string(),
    };

    let normalized = label.trim().to_ascii_lowercase();

    if matches!(normalized.as_str(), "ascii" | "us-ascii") {
        if !bytes.is_ascii() {
            return Err(decode_error());
        }
        return String::from_utf8(bytes).map_err(|_| decode_error());
    }

    let encoding =
        Encoding::for_label(normalized.as_bytes()).ok_or_else(|| EvaluatorError::UnknownEncoding {
            label: label.to_string(),
        })?;

    if encoding == encoding_rs::UTF_8 {
        return String::from_utf8(bytes).map_err(|_| decode_error());
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(|text| text.into_owned())
        .ok_or_else(decode_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("dne.txt");

        let err = CatEvaluator
            .evaluate(missing.to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::Io { .. }));
    }

    #[test]
    fn test_file_content_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "Hello, World!").unwrap();

        let result = CatEvaluator.evaluate(file.to_str().unwrap()).unwrap();
        assert_eq!(result, ConfigValue::from("Hello, World!"));
    }

    #[test]
    fn test_utf8_file_read_as_ascii_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "To the moon! 🚀").unwrap();

        let err = CatEvaluator
            .evaluate(&format!("{}:ascii", file.to_str().unwrap()))
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::Decode { ref encoding, .. } if encoding == "ascii"));
    }

    #[test]
    fn test_latin1_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("latin1.txt");
        std::fs::write(&file, [b'c', b'a', b'f', 0xE9]).unwrap();

        let result = CatEvaluator
            .evaluate(&format!("{}:latin1", file.to_str().unwrap()))
            .unwrap();
        assert_eq!(result, ConfigValue::from("café"));
    }

    #[test]
    fn test_invalid_utf8_fails_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bytes.bin");
        std::fs::write(&file, [0xFF, 0xFE, 0x00]).unwrap();

        let err = CatEvaluator.evaluate(file.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, EvaluatorError::Decode { .. }));
    }

    #[test]
    fn test_unknown_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let err = CatEvaluator
            .evaluate(&format!("{}:klingon", file.to_str().unwrap()))
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::UnknownEncoding { ref label } if label == "klingon"));
    }

    #[test]
    fn test_split_encoding() {
        assert_eq!(split_encoding("a.txt"), ("a.txt", None));
        assert_eq!(split_encoding("a.txt:utf-8"), ("a.txt", Some("utf-8")));
        assert_eq!(split_encoding(r"C:\dir\a.txt"), (r"C:\dir\a.txt", None));
        assert_eq!(split_encoding("C:/dir/a.txt"), ("C:/dir/a.txt", None));
        assert_eq!(split_encoding("a.txt:"), ("a.txt:", None));
    }
}

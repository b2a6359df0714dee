use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Per-file-system option bag.
///
/// Providers read their settings through typed accessors; the bag itself
/// is untyped so one file can configure several providers.
///
/// ```toml
/// url_charset = "UTF-8"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSystemOptions {
    values: BTreeMap<String, toml::Value>,
}

impl FileSystemOptions {
    /// Create an empty option bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Whether an option is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Read a string option.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::Options(format!(
                "{} must be a string, found {}",
                key,
                other.type_str()
            ))),
        }
    }

    /// Read a non-negative integer option.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(i)) if *i >= 0 => Ok(Some(*i as u64)),
            Some(other) => Err(Error::Options(format!(
                "{} must be a non-negative integer, found {}",
                key, other
            ))),
        }
    }

    /// Set a string option.
    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(key.to_string(), toml::Value::String(value.into()));
    }

    /// Set an integer option.
    pub fn set_u64(&mut self, key: &str, value: u64) {
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        self.values
            .insert(key.to_string(), toml::Value::Integer(value));
    }

    /// Remove an option.
    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_toml_str() {
        let options = FileSystemOptions::from_toml_str(
            r#"
url_charset = "ISO-8859-1"
timeout_secs = 12
"#,
        )
        .unwrap();

        assert_eq!(
            options.get_string("url_charset").unwrap().as_deref(),
            Some("ISO-8859-1")
        );
        assert_eq!(options.get_u64("timeout_secs").unwrap(), Some(12));
        assert_eq!(options.get_string("missing").unwrap(), None);
    }

    #[test]
    fn test_wrong_type() {
        let options = FileSystemOptions::from_toml_str("url_charset = 3\ntimeout_secs = -1").unwrap();
        assert!(matches!(options.get_string("url_charset"), Err(Error::Options(_))));
        assert!(matches!(options.get_u64("timeout_secs"), Err(Error::Options(_))));
    }

    #[test]
    fn test_set_and_remove() {
        let mut options = FileSystemOptions::new();
        options.set_string("user_agent", "agent/1");
        options.set_u64("timeout_secs", 5);
        assert!(options.contains("user_agent"));
        assert_eq!(options.get_u64("timeout_secs").unwrap(), Some(5));

        options.remove("user_agent");
        assert!(!options.contains("user_agent"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "url_charset = \"UTF-8\"").unwrap();

        let options = FileSystemOptions::load(file.path()).unwrap();
        assert_eq!(
            options.get_string("url_charset").unwrap().as_deref(),
            Some("UTF-8")
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            FileSystemOptions::from_toml_str("url_charset = "),
            Err(Error::Toml(_))
        ));
    }
}

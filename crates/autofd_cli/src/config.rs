//! Batch configuration, read from `autofd.toml`.
//!
//! ```toml
//! root = "src"
//! output = "derivatives.rs"
//!
//! [[function]]
//! path = "testfunc"
//! name = "T1.f"
//! derivative_name = "dx_t1"
//! order = "second"
//! ```

use crate::{CliError, Result};
use autofd_core::FunctionSpec;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "autofd.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Source tree root, relative to the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Destination of the generated source; stdout when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionSpec>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl BatchConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the config and makes `root` and `output` relative to its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text, path)?;
        if config.functions.is_empty() {
            return Err(CliError::EmptyBatch(path.to_path_buf()));
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.root = base.join(&config.root);
        config.output = config.output.map(|out| base.join(out));
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofd_core::DifferentiationOrder;

    #[test]
    fn parses_functions_with_defaults() {
        let text = r#"
            [[function]]
            path = "testfunc"
            name = "f1"

            [[function]]
            path = "testfunc"
            name = "T1.f"
            derivative_name = "dx_t1"
            order = "second"
        "#;
        let config = BatchConfig::parse(text, Path::new("autofd.toml")).expect("parse");
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.output, None);
        assert_eq!(config.functions.len(), 2);
        assert_eq!(config.functions[0], FunctionSpec::new("testfunc", "f1"));
        assert_eq!(
            config.functions[1],
            FunctionSpec::new("testfunc", "T1.f")
                .with_derivative_name("dx_t1")
                .with_order(DifferentiationOrder::Second)
        );
    }

    #[test]
    fn rejects_unknown_keys_and_orders() {
        let unknown = "roots = \"src\"";
        assert!(matches!(
            BatchConfig::parse(unknown, Path::new("a.toml")),
            Err(CliError::ConfigParse { .. })
        ));

        let bad_order = "[[function]]\npath = \"p\"\nname = \"f\"\norder = \"third\"";
        assert!(BatchConfig::parse(bad_order, Path::new("a.toml")).is_err());
    }

    #[test]
    fn load_resolves_paths_next_to_the_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("autofd.toml");
        fs::write(
            &path,
            "root = \"src\"\noutput = \"out.rs\"\n[[function]]\npath = \"p\"\nname = \"f\"\n",
        )
        .unwrap();

        let config = BatchConfig::load(&path).expect("load");
        assert_eq!(config.root, dir.path().join("src"));
        assert_eq!(config.output, Some(dir.path().join("out.rs")));
    }

    #[test]
    fn load_rejects_empty_batches() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("autofd.toml");
        fs::write(&path, "root = \"src\"\n").unwrap();
        assert!(matches!(BatchConfig::load(&path), Err(CliError::EmptyBatch(_))));
    }
}

// src/vars/file.rs

//! Scoped variable files.
//!
//! Large or sensitive variable sets are better passed as a file than as
//! dozens of `-var` flags. [`VarFile`] writes the map to a `.tfvars` file
//! next to the configuration and removes it again when dropped, so the file
//! disappears on every exit path, including early returns on error.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use super::{Value, to_literal};
use crate::errors::Result;

/// A `.tfvars` file that lives as long as this guard.
#[derive(Debug)]
pub struct VarFile {
    file: NamedTempFile,
}

impl VarFile {
    /// Render `vars` and write them into a fresh file inside `dir`.
    pub fn materialize(dir: &Path, vars: &HashMap<String, Value>) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("tfrunner-")
            .suffix(".tfvars")
            .tempfile_in(dir)?;

        file.write_all(render_tfvars(vars).as_bytes())?;
        file.flush()?;

        debug!(path = %file.path().display(), vars = vars.len(), "materialized variable file");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// One `name = literal` line per variable, sorted by name.
pub fn render_tfvars(vars: &HashMap<String, Value>) -> String {
    let mut keys: Vec<&String> = vars.keys().collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(&to_literal(&vars[key]));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_sorted_and_line_based() {
        let vars: HashMap<String, Value> = [
            ("region".to_string(), Value::from("eu-north1")),
            ("count".to_string(), Value::from(2)),
        ]
        .into_iter()
        .collect();

        assert_eq!(render_tfvars(&vars), "count = 2\nregion = \"eu-north1\"\n");
    }

    #[test]
    fn file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let vars: HashMap<String, Value> =
            [("name".to_string(), Value::from("x"))].into_iter().collect();

        let path = {
            let file = VarFile::materialize(dir.path(), &vars).unwrap();
            let contents = std::fs::read_to_string(file.path()).unwrap();
            assert_eq!(contents, "name = \"x\"\n");
            assert!(file.path().extension().is_some_and(|e| e == "tfvars"));
            file.path().to_path_buf()
        };

        assert!(!path.exists());
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::ParsingConfig;
use crate::error::{FanscopeError, Result};

/// One loaded FANSY-SCRIPT source unit. The core parser only ever sees
/// `content`; everything else is context the engine resolves from the
/// file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    /// File path the unit was read from
    pub path: PathBuf,

    /// Owning module, taken from the parent directory name (script
    /// exports are organized one directory per module)
    pub module: String,

    /// Function identity to fall back on when the unit has no header
    pub fallback_name: String,

    /// Content hash for change detection between analysis runs
    pub content_hash: String,

    /// Raw source text
    pub content: String,
}

/// Reads script sources off disk for the engine. The analysis core
/// itself never touches the filesystem.
pub struct SourceLoader {
    config: ParsingConfig,
}

impl SourceLoader {
    pub fn new(config: &ParsingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Load every script file under a directory, in path order
    pub fn load_directory<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<SourceUnit>> {
        let mut units = Vec::new();

        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| FanscopeError::FileSystem(e.to_string()))?;
            let path = entry.path();

            if path.is_file() && self.should_load(path) {
                if let Ok(unit) = self.load_file(path) {
                    units.push(unit);
                }
            }
        }

        // Walk order is platform-dependent; path order keeps graph
        // discovery order reproducible across runs
        units.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(units)
    }

    /// Load a single script file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<SourceUnit> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        if content.len() > self.config.max_file_size {
            return Err(FanscopeError::FileSystem(format!(
                "File {} exceeds maximum size limit",
                path.display()
            )));
        }

        Ok(SourceUnit {
            path: path.to_path_buf(),
            module: parent_dir_name(path),
            fallback_name: path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            content_hash: calculate_hash(&content),
            content,
        })
    }

    fn should_load(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.config.file_extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}

fn parent_dir_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn loader() -> SourceLoader {
        SourceLoader::new(&ParsingConfig {
            file_extensions: vec!["txt".to_string()],
            max_file_size: 1024,
        })
    }

    #[test]
    fn test_load_directory_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let module_dir = dir.path().join("_F_BUX");
        fs::create_dir(&module_dir).unwrap();
        fs::write(module_dir.join("Get_Rate.txt"), "// Get_Rate(%d) //== x").unwrap();
        fs::write(module_dir.join("Get_Cross.txt"), "uses _F_DOC;").unwrap();
        fs::write(module_dir.join("notes.md"), "not a script").unwrap();

        let units = loader().load_directory(dir.path()).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].fallback_name, "Get_Cross");
        assert_eq!(units[1].fallback_name, "Get_Rate");
        assert_eq!(units[0].module, "_F_BUX");
        assert!(!units[0].content_hash.is_empty());
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "x".repeat(2048)).unwrap();

        assert!(loader().load_file(&path).is_err());
    }

    #[test]
    fn test_identical_content_hashes_match() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();

        let loader = loader();
        assert_eq!(
            loader.load_file(&a).unwrap().content_hash,
            loader.load_file(&b).unwrap().content_hash
        );
    }
}

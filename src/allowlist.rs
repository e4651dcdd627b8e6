use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Console path prefixes the user never wants touched.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    rules: Vec<String>,
}

impl Allowlist {
    pub fn new(rules: Vec<String>) -> Self {
        Self { rules }
    }

    /// Loads the allowlist from the default configuration path.
    /// Returns an empty allowlist if the file doesn't exist or errors.
    pub fn load() -> Self {
        dirs::config_dir()
            .map(|dir| Self::load_from(&dir.join("vitasweep/allowlist.txt")))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let mut rules = Vec::new();
        if path.exists()
            && let Ok(file) = fs::File::open(path)
        {
            let reader = BufReader::new(file);
            for line in reader.lines().map_while(Result::ok) {
                let trimmed = line.trim();
                // Skip empty lines and comments
                if !trimmed.is_empty() && !trimmed.starts_with('#') {
                    rules.push(trimmed.to_string());
                }
            }
        }
        Self { rules }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Whether `path` is a rule or lies below one.
    pub fn is_allowed(&self, path: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| path == rule || path.starts_with(rule.as_str()))
    }

    /// Whether some rule lies strictly inside the directory `dir`, so that
    /// deleting `dir` as a whole would take protected content with it.
    pub fn shields(&self, dir: &str) -> bool {
        dir.ends_with('/')
            && self
                .rules
                .iter()
                .any(|rule| rule.len() > dir.len() && rule.starts_with(dir))
    }

    /// Whether removing `path` (a file, or a directory as a whole) would
    /// touch protected content.
    pub fn protects(&self, path: &str) -> bool {
        self.is_allowed(path) || self.shields(path)
    }
}

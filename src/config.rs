use std::path::{Path, PathBuf};

/// Key under which the employee snapshot is stored.
pub const DEFAULT_STORAGE_KEY: &str = "hrSystemData";

/// Data files probed at startup, in priority order.
pub const CANDIDATE_FILES: [&str; 4] = ["DB.xlsx", "DB.json", "DB.yml", "DB.csv"];

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Directory holding the pre-packaged `DB.*` data files.
    pub data_dir: PathBuf,
    /// Directory backing the key-value store.
    pub store_dir: PathBuf,
    pub storage_key: String,
    /// Charset of text data files.
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("db"),
            store_dir: PathBuf::from(".hrdb"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl IngestConfig {
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_store_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.store_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the text charset by WHATWG label (`utf-8`, `windows-1256`, ...).
    /// Returns `None` for an unknown label.
    pub fn with_charset_label(mut self, label: &str) -> Option<Self> {
        self.charset = encoding_rs::Encoding::for_label(label.as_bytes())?;
        Some(self)
    }

    /// Candidate data files under `data_dir`, highest priority first.
    pub fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        CANDIDATE_FILES.iter().map(|name| self.data_dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_in_priority_order() {
        let cfg = IngestConfig::default().with_data_dir("/srv/hr");
        let names: Vec<_> = cfg.candidates().collect();
        assert_eq!(names[0], Path::new("/srv/hr/DB.xlsx"));
        assert_eq!(names[3], Path::new("/srv/hr/DB.csv"));
    }

    #[test]
    fn charset_labels() {
        let cfg = IngestConfig::default().with_charset_label("windows-1256").unwrap();
        assert_eq!(cfg.charset, encoding_rs::WINDOWS_1256);
        assert!(IngestConfig::default().with_charset_label("klingon").is_none());
    }
}

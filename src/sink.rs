use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::models::CrawlItem;

/// Destination for the collected records. Called once per run.
pub trait RecordSink {
    fn write(&mut self, items: &[CrawlItem]) -> Result<(), SinkError>;
}

/// Writes the records as a pretty-printed JSON array
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonFileSink {
    fn write(&mut self, items: &[CrawlItem]) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, json)?;
        log::info!("Saved {} items to {}", items.len(), self.path.display());
        Ok(())
    }
}

/// Keeps every write in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub writes: Vec<Vec<CrawlItem>>,
}

impl RecordSink for MemorySink {
    fn write(&mut self, items: &[CrawlItem]) -> Result<(), SinkError> {
        self.writes.push(items.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingStub;

    fn item(slug: &str) -> CrawlItem {
        CrawlItem::from_stub(ListingStub {
            title: Some(slug.to_uppercase()),
            detail_url: Some(format!("https://example.com/games/{}.html", slug)),
            icon_url: None,
            type_hint: None,
        })
        .unwrap()
    }

    #[test]
    fn test_json_sink_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("apps.json");
        let mut sink = JsonFileSink::new(&path);

        sink.write(&[item("alpha"), item("beta")]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: Vec<CrawlItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].slug, "alpha");
        assert!(raw.contains("\"detailUrl\""));
        assert!(raw.contains('\n'));
    }

    #[test]
    fn test_json_sink_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        JsonFileSink::new(&path).write(&[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_json_sink_reports_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten as a file
        let mut sink = JsonFileSink::new(dir.path());
        assert!(matches!(sink.write(&[item("alpha")]), Err(SinkError::Io(_))));
    }
}

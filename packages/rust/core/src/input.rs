//! JSON-lines input: one crawled page record per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, instrument, warn};

use shopgraph_shared::{RawPageRecord, Result, ShopGraphError};

/// Records read from one input file.
#[derive(Debug, Clone, Default)]
pub struct PageBatch {
    /// Parsed records, in file order.
    pub pages: Vec<RawPageRecord>,
    /// Lines that were not valid page records and were skipped.
    pub malformed: usize,
}

impl From<Vec<RawPageRecord>> for PageBatch {
    fn from(pages: Vec<RawPageRecord>) -> Self {
        Self {
            pages,
            malformed: 0,
        }
    }
}

/// Read a JSON-lines file of crawled pages.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_pages(path: &Path) -> Result<PageBatch> {
    let file = File::open(path).map_err(|e| ShopGraphError::io(path, e))?;
    let batch = parse_pages(BufReader::new(file))
        .map_err(|e| ShopGraphError::io(path, e))?;

    info!(
        pages = batch.pages.len(),
        malformed = batch.malformed,
        "input loaded"
    );
    Ok(batch)
}

/// Parse JSON lines from any reader.
///
/// Blank lines are ignored. Lines that are not valid records are logged and
/// counted; only I/O failures are errors.
pub fn parse_pages(reader: impl BufRead) -> std::io::Result<PageBatch> {
    let mut batch = PageBatch::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<RawPageRecord>(trimmed) {
            Ok(record) => batch.pages.push(record),
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping malformed input line");
                batch.malformed += 1;
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopgraph_shared::FieldValue;

    #[test]
    fn parses_records_and_counts_bad_lines() {
        let input = r#"{"url":"https://shop.example/product/a/","title":"A"}

not json at all
{"title":"missing url"}
{"url":"https://shop.example/product-category/bags/","h1":["Category: Bags"]}
"#;
        let batch = parse_pages(input.as_bytes()).expect("parse");
        assert_eq!(batch.pages.len(), 2);
        assert_eq!(batch.malformed, 2);
        assert_eq!(batch.pages[0].title.as_deref(), Some("A"));
        assert_eq!(
            batch.pages[1].h1,
            Some(FieldValue::List(vec!["Category: Bags".into()]))
        );
    }

    #[test]
    fn fixture_file_loads() {
        let batch = read_pages(Path::new("../../../fixtures/jsonl/pages.fixture.jsonl"))
            .expect("read fixture");
        assert_eq!(batch.pages.len(), 6);
        assert_eq!(batch.malformed, 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_pages(Path::new("/nonexistent/shopgraph/pages.jsonl")).unwrap_err();
        assert!(matches!(err, ShopGraphError::Io { .. }));
    }
}

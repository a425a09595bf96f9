//! Cursor-driven assembly of a page's full record map.

use super::{ChunkRequest, PageSource, RecordMap};
use crate::error::Result;
use crate::model::PageId;

/// Default number of records requested per chunk.
pub const DEFAULT_CHUNK_LIMIT: usize = 100;

/// Default number of members requested from a database view.
pub const DEFAULT_COLLECTION_LIMIT: usize = 999;

/// Upper bound on chunks per page, in case the cursor never settles.
pub const MAX_CHUNKS: usize = 1000;

/// Pages through `loadPageChunk` until the record map is complete.
#[derive(Debug, Clone)]
pub struct RecordMapAssembler {
    chunk_limit: usize,
    collection_limit: usize,
    max_chunks: usize,
}

impl RecordMapAssembler {
    /// Create an assembler with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-chunk record limit.
    pub fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = limit.max(1);
        self
    }

    /// Set the database member limit.
    pub fn with_collection_limit(mut self, limit: usize) -> Self {
        self.collection_limit = limit.max(1);
        self
    }

    /// Set the chunk cap.
    pub fn with_max_chunks(mut self, max: usize) -> Self {
        self.max_chunks = max.max(1);
        self
    }

    /// Fetch every chunk of `page_id` and merge them.
    ///
    /// Stops when a chunk has no blocks, the cursor stops changing, or the
    /// cursor's stack is empty. Identifiers seen in an earlier chunk are
    /// never replaced by a later one.
    pub fn fetch(&self, source: &dyn PageSource, page_id: &PageId) -> Result<RecordMap> {
        let mut map = RecordMap::new();
        let mut request = ChunkRequest::first(page_id, self.chunk_limit);

        loop {
            let response = source.load_page_chunk(&request)?;
            let blocks = match response.blocks() {
                Some(blocks) if !blocks.is_empty() => blocks,
                _ => break,
            };
            let added = map.merge_chunk(blocks);
            log::debug!(
                "Chunk {} of {}: {} records, {} new",
                request.chunk_number,
                page_id,
                blocks.len(),
                added
            );

            let Some(cursor) = response.cursor else {
                break;
            };
            if cursor == request.cursor || cursor.stack.is_empty() {
                break;
            }
            if request.chunk_number + 1 >= self.max_chunks {
                log::warn!(
                    "Stopping after {} chunks for {}; cursor never settled",
                    self.max_chunks,
                    page_id
                );
                break;
            }
            request.cursor = cursor;
            request.chunk_number += 1;
        }

        Ok(map)
    }

    /// Ordered member pages of a database view.
    ///
    /// Failures are logged and yield an empty list.
    pub fn collection_members(
        &self,
        source: &dyn PageSource,
        collection_id: &str,
        view_id: &str,
    ) -> Vec<PageId> {
        match source.query_collection(collection_id, view_id, self.collection_limit) {
            Ok(ids) => ids.iter().filter_map(|id| PageId::find(id)).collect(),
            Err(e) => {
                log::warn!("Could not query database {}: {}", collection_id, e);
                Vec::new()
            }
        }
    }
}

impl Default for RecordMapAssembler {
    fn default() -> Self {
        Self {
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            collection_limit: DEFAULT_COLLECTION_LIMIT,
            max_chunks: MAX_CHUNKS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::remote::{ChunkResponse, Cursor, SignRequest};
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;

    const PAGE: &str = "11111111222233334444555555555555";

    /// Serves a fixed list of chunks and records every request.
    struct Chunks {
        chunks: Vec<ChunkResponse>,
        requests: RefCell<Vec<(usize, Cursor, usize)>>,
        collection: Result<Vec<String>>,
    }

    impl Chunks {
        fn new(chunks: Vec<ChunkResponse>) -> Self {
            Self {
                chunks,
                requests: RefCell::new(Vec::new()),
                collection: Ok(Vec::new()),
            }
        }
    }

    impl PageSource for Chunks {
        fn load_page_chunk(&self, request: &ChunkRequest) -> Result<ChunkResponse> {
            self.requests.borrow_mut().push((
                request.chunk_number,
                request.cursor.clone(),
                request.limit,
            ));
            Ok(self
                .chunks
                .get(request.chunk_number)
                .cloned()
                .unwrap_or_default())
        }

        fn query_collection(&self, _: &str, _: &str, limit: usize) -> Result<Vec<String>> {
            assert_eq!(limit, DEFAULT_COLLECTION_LIMIT);
            match &self.collection {
                Ok(ids) => Ok(ids.clone()),
                Err(_) => Err(Error::api("queryCollection", 500, "boom")),
            }
        }

        fn sign_urls(&self, _: &[SignRequest]) -> Result<Vec<Option<String>>> {
            Ok(Vec::new())
        }

        fn download(&self, _: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        fn fetch_html(&self, _: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn chunk(ids: &[&str], cursor: Option<Value>) -> ChunkResponse {
        let blocks: HashMap<String, Value> = ids
            .iter()
            .map(|id| (id.to_string(), json!({"value": {"id": id, "type": "text"}})))
            .collect();
        let cursor = cursor.map(|stack| Cursor {
            stack: stack.as_array().cloned().unwrap_or_default(),
        });
        ChunkResponse::new(blocks, cursor)
    }

    #[test]
    fn test_merges_until_stack_empty() {
        let source = Chunks::new(vec![
            chunk(&["a", "b"], Some(json!([[{"id": "b"}]]))),
            chunk(&["b", "c"], Some(json!([[{"id": "c"}]]))),
            chunk(&["d"], Some(json!([]))),
        ]);
        let id = PageId::parse(PAGE).unwrap();
        let map = RecordMapAssembler::new().fetch(&source, &id).unwrap();

        assert_eq!(map.len(), 4);
        let requests = source.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].1, Cursor::default());
        assert_eq!(requests[1].0, 1);
        assert_eq!(requests[1].1.stack.len(), 1);
        assert!(requests.iter().all(|r| r.2 == DEFAULT_CHUNK_LIMIT));
    }

    #[test]
    fn test_stops_on_empty_chunk_and_repeated_cursor() {
        let source = Chunks::new(vec![chunk(&[], Some(json!([[1]])))]);
        let id = PageId::parse(PAGE).unwrap();
        assert!(RecordMapAssembler::new().fetch(&source, &id).unwrap().is_empty());
        assert_eq!(source.requests.borrow().len(), 1);

        let same = json!([[{"id": "x"}]]);
        let source = Chunks::new(vec![
            chunk(&["a"], Some(same.clone())),
            chunk(&["b"], Some(same.clone())),
            chunk(&["c"], Some(same)),
        ]);
        let map = RecordMapAssembler::new().fetch(&source, &id).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(source.requests.borrow().len(), 2);
    }

    #[test]
    fn test_chunk_cap() {
        let chunks = (0..10)
            .map(|i| chunk(&[format!("b{}", i).as_str()], Some(json!([[i]]))))
            .collect();
        let source = Chunks::new(chunks);
        let id = PageId::parse(PAGE).unwrap();
        let map = RecordMapAssembler::new()
            .with_max_chunks(3)
            .fetch(&source, &id)
            .unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(source.requests.borrow().len(), 3);
    }

    #[test]
    fn test_first_chunk_wins_on_id_collision() {
        let titled = |title: &str| {
            json!({"value": {"id": "a", "type": "text", "properties": {"title": [[title]]}}})
        };
        let first: HashMap<String, Value> = [("a".to_string(), titled("first"))].into();
        let second: HashMap<String, Value> = [
            ("a".to_string(), titled("second")),
            ("b".to_string(), json!({"value": {"id": "b", "type": "divider"}})),
        ]
        .into();
        let source = Chunks::new(vec![
            ChunkResponse::new(first, Some(Cursor { stack: vec![json!([{"id": "a"}])] })),
            ChunkResponse::new(second, None),
        ]);
        let id = PageId::parse(PAGE).unwrap();
        let map = RecordMapAssembler::new().fetch(&source, &id).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a").unwrap().title(), "first");
        assert_eq!(map.get("b").unwrap().kind, "divider");
    }

    #[test]
    fn test_collection_members() {
        let mut source = Chunks::new(Vec::new());
        source.collection = Ok(vec![PAGE.to_string(), "not-an-id".to_string()]);
        let members = RecordMapAssembler::new().collection_members(&source, "c", "v");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].simple(), PAGE);

        source.collection = Err(Error::Other("unused".to_string()));
        assert!(RecordMapAssembler::new()
            .collection_members(&source, "c", "v")
            .is_empty());
    }
}

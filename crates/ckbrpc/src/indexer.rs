use super::*;
use async_trait::async_trait;
use datatypes::traits::LiveCellSource;
use json_types::{BlockNumber, JsonBytes, Script};
use serde::Serialize;

const PAGE_SIZE: u64 = 100;

#[derive(Debug, Serialize)]
struct SearchKeyFilter {
    script: Script,
}

#[derive(Debug, Serialize)]
struct SearchKey {
    script: Script,
    script_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<SearchKeyFilter>,
    with_data: bool,
}

impl From<&CellFilter> for SearchKey {
    fn from(filter: &CellFilter) -> Self {
        SearchKey {
            script: filter.lock.clone().into(),
            script_type: "lock",
            filter: filter.type_script.clone().map(|script| SearchKeyFilter {
                script: script.into(),
            }),
            with_data: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexerCell {
    output: json_types::CellOutput,
    #[serde(default)]
    output_data: Option<JsonBytes>,
    out_point: json_types::OutPoint,
    block_number: BlockNumber,
}

impl From<IndexerCell> for Cell {
    fn from(cell: IndexerCell) -> Self {
        Cell {
            output: cell.output.into(),
            data: cell
                .output_data
                .map(JsonBytes::into_bytes)
                .unwrap_or_default(),
            out_point: Some(cell.out_point.into()),
            block_hash: None,
            block_number: Some(cell.block_number.value()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Pagination {
    objects: Vec<IndexerCell>,
    last_cursor: JsonBytes,
}

impl CkbRpcClient {
    /// Every live cell matching `filter`, oldest first.
    pub async fn cells(&self, filter: &CellFilter) -> Result<Vec<Cell>> {
        let search_key = SearchKey::from(filter);
        let mut cursor: Option<JsonBytes> = None;
        let mut cells = Vec::new();
        loop {
            let page: Pagination = self
                .call(
                    &self.indexer_url,
                    "get_cells",
                    json!([search_key, "asc", json_types::Uint32::from(PAGE_SIZE as u32), cursor]),
                )
                .await?
                .ok_or_else(|| anyhow!("indexer returned no page"))?;
            let count = page.objects.len();
            cells.extend(page.objects.into_iter().map(Cell::from));
            if (count as u64) < PAGE_SIZE {
                break;
            }
            cursor = Some(page.last_cursor);
        }
        debug!("indexer returned {} cells", cells.len());
        Ok(cells)
    }
}

#[async_trait]
impl LiveCellSource for CkbRpcClient {
    async fn list_cells(&self, filter: &CellFilter) -> Result<Vec<Cell>> {
        self.cells(filter).await
    }
}

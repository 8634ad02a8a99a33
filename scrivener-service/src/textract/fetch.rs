//! Result fetcher: drain a completed job's paginated block list.

use tracing::debug;

use super::ExtractionApi;
use super::client::ExtractionClient;
use super::model::Block;
use crate::error::ExtractionError;

/// Fetch every result page for a job, forwarding the continuation cursor
/// until the provider stops returning one. Blocks keep their cross-page
/// order; no page-count or page-size bound is assumed. Any page failure
/// propagates so the caller can leave the triggering message unacknowledged.
pub async fn fetch_all_blocks<C: ExtractionClient>(
    client: &C,
    api: ExtractionApi,
    job_id: &str,
) -> Result<Vec<Block>, ExtractionError> {
    let mut blocks = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = client.result_page(api, job_id, next_token.as_deref()).await?;
        pages += 1;
        blocks.extend(page.blocks);
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    debug!(job_id = %job_id, pages, blocks = blocks.len(), "Fetched job results");
    Ok(blocks)
}

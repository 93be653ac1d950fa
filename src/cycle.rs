//! Cycle controller: selects one group per run and publishes it in order

use log::{error, info, warn};
use rand::Rng;
use tokio::time::{Duration, sleep};

use crate::constants::INTER_POST_DELAY_SECS;
use crate::domain::groups::{GroupKey, group_unposted, sort_thread_rows};
use crate::domain::rows::Row;
use crate::services::sheets::SheetsError;
use crate::services::threads::ThreadsError;

/// Row source and completion sink, implemented by the sheet store.
#[allow(async_fn_in_trait)]
pub trait PostStore {
    async fn load_rows(&self) -> Result<Vec<Row>, SheetsError>;
    async fn mark_posted(&self, row_index: u32, post_id: &str) -> Result<(), SheetsError>;
    async fn reset_posted(&self, row_count: usize) -> Result<(), SheetsError>;
}

/// One remote publish: text plus optional media, optionally chained to a
/// parent post. Returns the new post id.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    async fn publish(
        &self,
        text: &str,
        media_path: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<String, ThreadsError>;
}

#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Courtesy delay between consecutive posts in one group
    pub post_delay: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            post_delay: Duration::from_secs(INTER_POST_DELAY_SECS),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The table holds no rows at all
    NothingToPost,
    /// One group was selected; `posted < total` means the group was
    /// aborted partway and its remaining rows stay eligible.
    Posted {
        group: String,
        posted: usize,
        total: usize,
    },
}

/// Errors that abort the whole run, as opposed to per-group failures.
#[derive(Debug)]
pub enum CycleError {
    Load(SheetsError),
    Reset(SheetsError),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::Load(e) => write!(f, "failed to load rows: {}", e),
            CycleError::Reset(e) => write!(f, "failed to reset posted flags: {}", e),
        }
    }
}

impl std::error::Error for CycleError {}

/// Run one posting cycle: load, group, select, publish in order.
///
/// Failure handling is group-scoped. A failed publish (or a failed
/// completion write) stops the remaining rows of the selected group and
/// the run still ends normally; rows already marked stay marked and the
/// rest are picked up by a later run.
pub async fn run_cycle<S, P, R>(
    store: &S,
    publisher: &P,
    rng: &mut R,
    config: &CycleConfig,
) -> Result<CycleOutcome, CycleError>
where
    S: PostStore,
    P: Publisher,
    R: Rng,
{
    let mut rows = store.load_rows().await.map_err(CycleError::Load)?;
    let mut groups = group_unposted(&rows);

    if groups.is_empty() {
        if rows.is_empty() {
            info!("table is empty, nothing to post");
            return Ok(CycleOutcome::NothingToPost);
        }

        // Full cycle complete: reopen every row in one bulk write and
        // regroup from the in-memory reset copy.
        info!("all rows posted, resetting for a new cycle");
        store
            .reset_posted(rows.len())
            .await
            .map_err(CycleError::Reset)?;
        for row in &mut rows {
            row.posted = false;
        }
        groups = group_unposted(&rows);
    }

    let mut keys: Vec<GroupKey> = groups.keys().cloned().collect();
    if keys.is_empty() {
        return Ok(CycleOutcome::NothingToPost);
    }

    // Sorted so a seeded rng selects reproducibly; still uniform.
    keys.sort();
    let key = keys[rng.random_range(0..keys.len())].clone();
    let mut selected = match groups.remove(&key) {
        Some(rows) => rows,
        None => return Ok(CycleOutcome::NothingToPost),
    };

    if key.is_thread() {
        sort_thread_rows(&mut selected);
        info!("selected thread {} ({} posts)", key, selected.len());
    } else {
        info!("selected single post (row {})", selected[0].row_index);
    }

    let total = selected.len();
    let mut posted = 0;
    let mut previous_post_id: Option<String> = None;

    for (idx, row) in selected.iter().enumerate() {
        if idx > 0 && previous_post_id.is_none() {
            warn!("no parent post id, skipping remaining rows");
            break;
        }
        let reply_to = if idx == 0 {
            None
        } else {
            previous_post_id.as_deref()
        };

        info!("posting {}/{} (row {})", idx + 1, total, row.row_index);

        let post_id = match publisher
            .publish(&row.text, row.media_path.as_deref(), reply_to)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!(
                    "publish failed for row {}: {}; aborting group",
                    row.row_index, e
                );
                break;
            }
        };

        posted += 1;

        if let Err(e) = store.mark_posted(row.row_index, &post_id).await {
            // The post is live but unrecorded; stop here rather than
            // extend a chain whose state the sheet no longer reflects.
            error!(
                "failed to record completion for row {}: {}; aborting group",
                row.row_index, e
            );
            break;
        }

        previous_post_id = Some(post_id);

        if idx + 1 < total && !config.post_delay.is_zero() {
            sleep(config.post_delay).await;
        }
    }

    Ok(CycleOutcome::Posted {
        group: key.to_string(),
        posted,
        total,
    })
}

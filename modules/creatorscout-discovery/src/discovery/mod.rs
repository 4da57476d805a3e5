//! Discovery orchestration.
//!
//! One run: pick the target store, snapshot it, search, fetch and filter,
//! annotate, reconcile against the snapshot, write. Everything is built fresh
//! per run except the injected cache.

pub mod aggregator;
pub mod annotator;
pub mod enricher;
pub mod reconciler;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, Instrument};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use ai_client::Mino;
use creatorscout_common::{Config, DiscoveryRequest, DiscoveryResponse};
use sheets_client::{spreadsheet_url, SheetsClient};
use youtube_client::YouTubeClient;

use crate::error::{DiscoveryError, Stage};
use crate::infra::{with_retry, RetryPolicy};
use crate::traits::{Cache, ChannelSearch, ChannelSource, Classifier, StoreInfo, TabularStore};

pub use aggregator::{collect_candidates, Candidates};
pub use annotator::Annotator;
pub use enricher::{fetch_and_filter, ChannelFilter};
pub use reconciler::{reconcile, ExistingRow, ReconcilePlan, RowIndex, SubscriberUpdate};

/// Shared collaborators for discovery runs.
#[derive(Clone, TypedBuilder)]
pub struct DiscoveryDeps {
    pub search: Arc<dyn ChannelSearch>,
    pub channels: Arc<dyn ChannelSource>,
    pub classifier: Arc<dyn Classifier>,
    pub store: Arc<dyn TabularStore>,
    pub cache: Arc<dyn Cache>,
    /// Channels annotated concurrently.
    #[builder(default = 3)]
    pub concurrency: usize,
    /// Upper bound on a single AI call.
    #[builder(default = Duration::from_secs(30))]
    pub call_timeout: Duration,
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl DiscoveryDeps {
    /// Production clients from config. Store access needs an access token.
    pub fn from_config(config: &Config, cache: Arc<dyn Cache>) -> Result<Self, DiscoveryError> {
        let token = config
            .google_access_token
            .clone()
            .ok_or_else(|| DiscoveryError::Config("GOOGLE_ACCESS_TOKEN is required".into()))?;

        let youtube = Arc::new(
            YouTubeClient::new(config.youtube_api_key.clone(), config.upstream_timeout)
                .map_err(|e| DiscoveryError::Config(e.to_string()))?,
        );
        let mino = Mino::new(config.mino_api_key.clone(), config.mino_model.clone())
            .with_endpoint(config.mino_api_url.clone())
            .with_timeout(config.upstream_timeout);
        let sheets = SheetsClient::new(token, config.upstream_timeout)
            .map_err(|e| DiscoveryError::Config(e.to_string()))?;

        Ok(Self::builder()
            .search(youtube.clone())
            .channels(youtube)
            .classifier(Arc::new(mino))
            .store(Arc::new(sheets))
            .cache(cache)
            .concurrency(config.annotation_concurrency)
            .call_timeout(config.upstream_timeout)
            .retry(RetryPolicy {
                attempts: config.retry_attempts,
                ..RetryPolicy::default()
            })
            .build())
    }
}

pub struct Discovery {
    deps: DiscoveryDeps,
    annotator: Annotator,
}

impl Discovery {
    pub fn new(deps: DiscoveryDeps) -> Self {
        let annotator = Annotator::new(
            deps.classifier.clone(),
            deps.cache.clone(),
            deps.call_timeout,
        );
        Self { deps, annotator }
    }

    /// Run the pipeline once. `store_override` beats `request.store_id`;
    /// with neither, a new store is created.
    pub async fn run(
        &self,
        request: &DiscoveryRequest,
        store_override: Option<&str>,
    ) -> Result<DiscoveryResponse, DiscoveryError> {
        request.validate()?;
        let run_id = Uuid::new_v4();
        self.run_inner(request, store_override)
            .instrument(info_span!("discovery", %run_id))
            .await
    }

    async fn run_inner(
        &self,
        request: &DiscoveryRequest,
        store_override: Option<&str>,
    ) -> Result<DiscoveryResponse, DiscoveryError> {
        let deps = &self.deps;
        let retry = deps.retry;

        // 1. Target store and its snapshot, before any search spend
        let store = self.select_store(request, store_override).await?;
        let snapshot = with_retry(retry, "read_rows", || deps.store.read_rows(&store.store_id))
            .await
            .map_err(DiscoveryError::upstream(Stage::StoreRead))?;
        let index = RowIndex::from_rows(&snapshot);
        info!(store_id = store.store_id.as_str(), existing = index.len(), "Store snapshot loaded");

        // 2. Candidates
        let query = request.composed_query();
        let candidates = collect_candidates(
            deps.search.as_ref(),
            &query,
            request.page_size,
            request.max_pages,
            retry,
        )
        .await?;

        // 3. Full records, filtered
        let channels = fetch_and_filter(
            deps.channels.as_ref(),
            deps.cache.as_ref(),
            &candidates.channel_ids,
            &ChannelFilter::from_request(request),
            retry,
        )
        .await?;

        // 4. Annotation
        let results = self
            .annotator
            .annotate_all(channels, deps.concurrency)
            .await;

        // 5. Reconcile and write: refreshes first, then appends
        let plan = reconcile(&results, &index);
        let cells = plan.cell_updates();
        if !cells.is_empty() {
            with_retry(retry, "update_cells", || {
                deps.store.update_cells(&store.store_id, &cells)
            })
            .await
            .map_err(DiscoveryError::upstream(Stage::StoreWrite))?;
        }
        if !plan.appends.is_empty() {
            deps.store
                .append_rows(&store.store_id, &plan.appends)
                .await
                .map_err(DiscoveryError::upstream(Stage::StoreWrite))?;
        }

        info!(
            query = query.as_str(),
            pages = candidates.pages_processed,
            candidates = candidates.channel_ids.len(),
            added = plan.added(),
            updated = plan.updated(),
            skipped = plan.skipped,
            "Discovery run complete"
        );

        Ok(DiscoveryResponse {
            store_id: store.store_id,
            store_url: store.store_url,
            added: plan.added(),
            updated: plan.updated(),
            skipped: plan.skipped,
            pages_processed: candidates.pages_processed,
            results,
            warnings: Vec::new(),
        })
    }

    async fn select_store(
        &self,
        request: &DiscoveryRequest,
        store_override: Option<&str>,
    ) -> Result<StoreInfo, DiscoveryError> {
        let supplied = store_override
            .or(request.store_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty());

        if let Some(id) = supplied {
            return Ok(StoreInfo {
                store_id: id.to_string(),
                store_url: spreadsheet_url(id),
            });
        }

        let mut created = self
            .deps
            .store
            .create_store()
            .await
            .map_err(DiscoveryError::upstream(Stage::StoreCreate))?;
        if created.store_url.is_empty() {
            created.store_url = spreadsheet_url(&created.store_id);
        }
        info!(store_id = created.store_id.as_str(), "Created new store");
        Ok(created)
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use artifex_crypto::ContentHasher;
use artifex_index::DedupIndex;
use artifex_overlay::{Composite, Compositor, OverlayResult, Rect};
use artifex_store::{probe, ImageStore};
use artifex_types::{ContentDigest, Dimensions, ImageId, ImageRecord};
use serde::{Deserialize, Serialize};

use crate::error::{EmptyCatalog, ServiceError, ServiceResult};
use crate::locks::KeyedLocks;
use crate::payload::decode_drawing_data;

/// An upload already written to local disk by the transport layer.
#[derive(Clone, Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Client-supplied file name, used only to derive the new identifier.
    pub original_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub record: ImageRecord,
    /// The content was already stored; `record` names the existing image.
    pub deduplicated: bool,
}

#[derive(Clone, Debug)]
pub struct Fetched {
    pub id: ImageId,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateRequest {
    pub image_id: String,
    pub text: String,
    pub x: i64,
    pub y: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRequest {
    pub image_id: String,
    /// Base64 or `data:` URL encoded raster layer.
    pub drawing_data: String,
    /// Top-left corner of the layer, `(0, 0)` when absent.
    pub offset: Option<(i64, i64)>,
}

/// Result of a committed annotate or draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Identifier plus the digest of the content now stored under it.
    pub record: ImageRecord,
    pub dimensions: Dimensions,
    pub region: Rect,
    /// Whether the new digest now resolves to this identifier for dedup.
    pub rebound: bool,
}

/// Orchestrates every request against one image store.
///
/// Built once at process start and shared behind an `Arc`. The dedup index
/// is whatever backend the caller injects; [`DedupIndex::is_persistent`]
/// tells whether its bindings outlive the process.
pub struct ImageService {
    store: Arc<dyn ImageStore>,
    index: Arc<dyn DedupIndex>,
    compositor: Arc<Compositor>,
    hasher: ContentHasher,
    digest_locks: KeyedLocks<ContentDigest>,
    image_locks: KeyedLocks<ImageId>,
}

impl ImageService {
    pub fn new(
        store: Arc<dyn ImageStore>,
        index: Arc<dyn DedupIndex>,
        compositor: Arc<Compositor>,
    ) -> Self {
        Self {
            store,
            index,
            compositor,
            hasher: ContentHasher::IMAGE,
            digest_locks: KeyedLocks::new(),
            image_locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ImageStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<dyn DedupIndex> {
        &self.index
    }

    pub fn compositor(&self) -> &Arc<Compositor> {
        &self.compositor
    }

    // ---- Ingest ----

    /// Ingest a staged upload. The staged file is removed in every outcome.
    pub async fn ingest(&self, staged: StagedFile) -> ServiceResult<IngestOutcome> {
        let read = tokio::fs::read(&staged.path).await;
        if let Err(e) = tokio::fs::remove_file(&staged.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %staged.path.display(), error = %e, "failed to remove staged upload");
            }
        }
        self.ingest_bytes(&staged.original_name, read?).await
    }

    /// Store `bytes` unless identical content is already stored.
    ///
    /// Two concurrent ingests of the same content serialize on the digest:
    /// the first creates the blob, the second reuses its identifier.
    pub async fn ingest_bytes(
        &self,
        original_name: &str,
        bytes: Vec<u8>,
    ) -> ServiceResult<IngestOutcome> {
        let hasher = self.hasher;
        let (digest, bytes) = tokio::task::spawn_blocking(move || (hasher.digest(&bytes), bytes))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))?;
        let _guard = self.digest_locks.lock(&digest).await;

        if let Some(id) = self.index.lookup(&digest)? {
            tracing::debug!(%id, digest = %digest.short_hex(), "duplicate upload");
            return Ok(IngestOutcome {
                record: ImageRecord::new(id, digest),
                deduplicated: true,
            });
        }

        let id = ImageId::assign(original_name, probe::sniff_extension(&bytes));
        self.store.create(&id, &bytes).await?;
        self.index.register(digest, id.clone())?;
        tracing::info!(%id, digest = %digest.short_hex(), bytes = bytes.len(), "image ingested");

        Ok(IngestOutcome {
            record: ImageRecord::new(id, digest),
            deduplicated: false,
        })
    }

    // ---- Fetch ----

    pub async fn fetch(&self, raw_id: &str) -> ServiceResult<Fetched> {
        let id = parse_existing(raw_id)?;
        let bytes = self.store.get(&id).await?;
        let content_type = id
            .content_type()
            .or_else(|| probe::sniff_content_type(&bytes))
            .unwrap_or("application/octet-stream");
        Ok(Fetched {
            id,
            bytes,
            content_type,
        })
    }

    // ---- Mutation ----

    pub async fn annotate(&self, req: AnnotateRequest) -> ServiceResult<MutationOutcome> {
        if req.text.is_empty() {
            return Err(ServiceError::Input("text must not be empty".into()));
        }
        let limit = self.compositor.config().max_text_chars;
        if req.text.chars().count() > limit {
            return Err(ServiceError::Input(format!(
                "text is longer than {limit} characters"
            )));
        }
        let (text, x, y) = (req.text, req.x, req.y);
        self.mutate(&req.image_id, "annotate", move |c, base| {
            c.annotate(base, x, y, &text)
        })
        .await
    }

    pub async fn draw(&self, req: DrawRequest) -> ServiceResult<MutationOutcome> {
        let drawing = decode_drawing_data(&req.drawing_data)?;
        self.draw_bytes(&req.image_id, drawing, req.offset).await
    }

    /// Like [`draw`](Self::draw) with an already decoded layer.
    pub async fn draw_bytes(
        &self,
        image_id: &str,
        drawing: Vec<u8>,
        offset: Option<(i64, i64)>,
    ) -> ServiceResult<MutationOutcome> {
        if drawing.is_empty() {
            return Err(ServiceError::Input("drawing is empty".into()));
        }
        self.mutate(image_id, "draw", move |c, base| c.draw(base, &drawing, offset))
            .await
    }

    /// Read, composite and atomically replace one image.
    ///
    /// The identifier lock is held for the whole sequence so concurrent
    /// mutations of one image apply one after the other, each on top of the
    /// previous result.
    async fn mutate<F>(&self, raw_id: &str, kind: &'static str, op: F) -> ServiceResult<MutationOutcome>
    where
        F: FnOnce(&Compositor, &[u8]) -> OverlayResult<Composite> + Send + 'static,
    {
        let id = parse_existing(raw_id)?;
        let _guard = self.image_locks.lock(&id).await;

        let dims = self.store.metadata(&id).await?;
        tracing::debug!(%id, %dims, kind, "compositing");
        let base = self.store.get(&id).await?;

        let compositor = Arc::clone(&self.compositor);
        let hasher = self.hasher;
        let (composite, digest) = tokio::task::spawn_blocking(move || {
            op(&compositor, &base).map(|composite| {
                let digest = hasher.digest(&composite.bytes);
                (composite, digest)
            })
        })
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))??;

        // Keeps a concurrent ingest of identical bytes from racing the rebind.
        let _digest_guard = self.digest_locks.lock(&digest).await;
        self.store.put(&id, &composite.bytes).await?;
        let rebinding = self.index.rebind(&id, digest)?;
        tracing::info!(
            %id,
            kind,
            digest = %digest.short_hex(),
            previous = ?rebinding.previous.map(|d| d.short_hex()),
            rebound = rebinding.bound,
            "image replaced"
        );

        Ok(MutationOutcome {
            record: ImageRecord::new(id, digest),
            dimensions: composite.dimensions,
            region: composite.region,
            rebound: rebinding.bound,
        })
    }

    // ---- Catalog ----

    /// Identifiers of all listable images, sorted.
    pub async fn list(&self) -> ServiceResult<Vec<ImageId>> {
        let catalog = self.store.list().await?;
        if catalog.total_entries() == 0 {
            return Err(ServiceError::EmptyCatalog(EmptyCatalog::NoImages));
        }
        if catalog.is_empty() {
            return Err(ServiceError::EmptyCatalog(EmptyCatalog::NoValidImages));
        }
        if catalog.skipped > 0 {
            tracing::debug!(skipped = catalog.skipped, "non-image entries left out of catalog");
        }
        Ok(catalog.images)
    }
}

/// An identifier that fails validation can never name a stored blob.
fn parse_existing(raw: &str) -> ServiceResult<ImageId> {
    ImageId::parse(raw).map_err(|_| ServiceError::NotFound(raw.to_string()))
}

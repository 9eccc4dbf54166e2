use tokio::task::JoinHandle;

use crate::campaign::frame::{FrameLoader, load_frame};
use crate::campaign::model::Campaign;
use crate::campaign::store::CampaignSource;
use crate::config::editor::EditorConfig;
use crate::foundation::core::{PixelBuffer, Vec2};
use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::foundation::math::approx_eq_rel;
use crate::ingest::pipeline::{PreparedPhoto, accept_upload, prepare_photo};
use crate::layers::stack::{FrameGeometry, LayerStack};
use crate::render::cpu::{CpuCompositor, Decorations, LiveFrame};
use crate::render::export::{ExportOutput, ExportRequest, export};
use crate::render::snapshot::CompositionSnapshot;
use crate::transform::controller::{Transform, TransformController};
use crate::viewport::manager::{ResizeOutcome, Viewport, ViewportManager};
use crate::viewport::observer::{ResizeFeed, ResizeHandle, resize_channel};

/// Editor lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorState {
    /// Frame loaded, no photo yet.
    Empty,
    /// An ingest is in flight. A previous photo, if any, is still displayed.
    Processing,
    Loaded,
    /// An export snapshot was taken and has not been finished yet.
    Exporting,
}

/// Identifies one ingest. Only the most recently issued ticket may be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngestTicket(u64);

impl IngestTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Finished ingest, successful or not, ready for [`EditorSession::finish_upload`].
#[derive(Debug)]
pub struct IngestOutcome {
    pub ticket: IngestTicket,
    pub result: TwibbonResult<PreparedPhoto>,
}

/// Compress and decode running on the blocking pool.
#[derive(Debug)]
pub struct PendingIngest {
    ticket: IngestTicket,
    handle: JoinHandle<TwibbonResult<PreparedPhoto>>,
}

impl PendingIngest {
    pub fn ticket(&self) -> IngestTicket {
        self.ticket
    }

    pub async fn wait(self) -> IngestOutcome {
        let result = match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(TwibbonError::decode(format!("ingest task failed: {e}"))),
        };
        IngestOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// What [`EditorSession::finish_upload`] did with an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestApplied {
    /// The photo layer was replaced and the transform reset.
    Applied {
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },
    /// A newer ingest was started; nothing changed.
    Superseded,
}

/// Immutable export unit. Rendering it never touches the session.
#[derive(Clone, Debug)]
pub struct ExportJob {
    snapshot: CompositionSnapshot,
    request: ExportRequest,
    slug: String,
}

impl ExportJob {
    pub fn snapshot(&self) -> &CompositionSnapshot {
        &self.snapshot
    }

    pub fn request(&self) -> &ExportRequest {
        &self.request
    }

    /// Render and encode on the calling thread.
    pub fn render(self) -> TwibbonResult<ExportOutput> {
        let mut compositor = CpuCompositor::new();
        export(&mut compositor, &self.snapshot, &self.request, &self.slug)
    }

    /// Render and encode on the blocking pool.
    pub async fn run(self) -> TwibbonResult<ExportOutput> {
        tokio::task::spawn_blocking(move || self.render())
            .await
            .map_err(|e| TwibbonError::export(format!("export task failed: {e}")))?
    }
}

/// One user's editing session for one campaign.
///
/// Owns the viewport, layer stack and photo transform. Every mutation goes through `&mut self`;
/// long-running work is handed off as owned values ([`PendingIngest`], [`ExportJob`]).
pub struct EditorSession {
    campaign: Campaign,
    config: EditorConfig,
    viewport: ViewportManager,
    layers: LayerStack,
    controller: TransformController,
    state: EditorState,
    ingest_seq: u64,
    resize: Option<ResizeFeed>,
    compositor: CpuCompositor,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("slug", &self.campaign.slug)
            .field("state", &self.state)
            .field("viewport", &self.viewport.viewport())
            .field("transform", &self.controller.transform())
            .field("has_photo", &self.layers.has_photo())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Fetch the campaign and its frame, then build a session.
    ///
    /// Fails without producing a session when the campaign is unknown or the frame cannot be
    /// fetched or decoded.
    #[tracing::instrument(skip(source, loader, config))]
    pub async fn open<S, L>(
        source: &S,
        loader: &L,
        slug: &str,
        container_width: f64,
        config: EditorConfig,
    ) -> TwibbonResult<Self>
    where
        S: CampaignSource + ?Sized,
        L: FrameLoader,
    {
        let campaign = source.fetch_campaign(slug)?;
        campaign.validate()?;
        let frame = load_frame(loader, &campaign.frame_url).await?;
        Self::new(campaign, frame, container_width, config)
    }

    /// Build a session from an already fetched campaign and decoded frame.
    pub fn new(
        campaign: Campaign,
        frame: PixelBuffer,
        container_width: f64,
        config: EditorConfig,
    ) -> TwibbonResult<Self> {
        campaign.validate()?;
        config.validate()?;
        let bounds = config.scale_bounds()?;
        let viewport = ViewportManager::initialize(container_width, campaign.aspect_ratio())?;

        let frame_aspect = f64::from(frame.height()) / f64::from(frame.width().max(1));
        if !approx_eq_rel(frame_aspect, campaign.aspect_ratio(), 1e-3) {
            tracing::warn!(
                slug = %campaign.slug,
                frame_width = frame.width(),
                frame_height = frame.height(),
                "frame image aspect differs from campaign record"
            );
        }

        let mut layers = LayerStack::new();
        layers.set_frame(frame, &viewport.viewport())?;

        Ok(Self {
            controller: TransformController::new(bounds, config.scale_mode),
            campaign,
            config,
            viewport,
            layers,
            state: EditorState::Empty,
            ingest_seq: 0,
            resize: None,
            compositor: CpuCompositor::new(),
        })
    }

    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn transform(&self) -> Transform {
        self.controller.transform()
    }

    pub fn has_photo(&self) -> bool {
        self.layers.has_photo()
    }

    pub fn frame_geometry(&self) -> Option<FrameGeometry> {
        self.layers.frame().map(|f| f.geometry())
    }

    /// Validate an upload and start compress+decode on the blocking pool.
    ///
    /// Supersedes any ingest still in flight. Must be called inside a tokio runtime.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn begin_upload(&mut self, bytes: Vec<u8>, mime: &str) -> TwibbonResult<PendingIngest> {
        if self.state == EditorState::Exporting {
            return Err(TwibbonError::input("cannot upload while an export is running"));
        }
        if self.viewport().is_empty() {
            return Err(TwibbonError::input("viewport has zero size"));
        }
        let upload = accept_upload(bytes, mime)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TwibbonError::input(format!("upload needs a tokio runtime: {e}")))?;

        self.ingest_seq += 1;
        let ticket = IngestTicket(self.ingest_seq);
        if self.state == EditorState::Processing {
            tracing::debug!(ticket = ticket.0, "superseding pending ingest");
        }
        self.state = EditorState::Processing;

        let opts = self.config.compress_opts();
        let placement = self.config.placement;
        let handle = runtime.spawn_blocking(move || prepare_photo(&upload, opts, placement));
        Ok(PendingIngest { ticket, handle })
    }

    /// Apply a finished ingest if it is still the current one.
    ///
    /// On failure the previous photo stays in place and the error is returned.
    pub fn finish_upload(&mut self, outcome: IngestOutcome) -> TwibbonResult<IngestApplied> {
        if outcome.ticket.0 != self.ingest_seq {
            tracing::debug!(
                ticket = outcome.ticket.0,
                current = self.ingest_seq,
                "discarding superseded ingest"
            );
            return Ok(IngestApplied::Superseded);
        }
        if self.state != EditorState::Processing {
            tracing::debug!(ticket = outcome.ticket.0, "ingest already settled");
            return Ok(IngestApplied::Superseded);
        }

        let prepared = match outcome.result {
            Ok(prepared) => prepared,
            Err(e) => {
                self.state = self.settled_state();
                tracing::warn!(error = %e, "ingest failed; keeping previous photo");
                return Err(e);
            }
        };

        let applied = IngestApplied::Applied {
            width: prepared.layer.pixels().width(),
            height: prepared.layer.pixels().height(),
            source_width: prepared.source_width,
            source_height: prepared.source_height,
        };
        let initial_scale = prepared.place_on_viewport(&self.viewport());
        drop(self.layers.replace_photo(prepared.layer));
        let evicted = self.compositor.evict_released();
        self.controller.reset(initial_scale);
        self.state = EditorState::Loaded;
        tracing::debug!(?applied, evicted, "photo layer replaced");
        Ok(applied)
    }

    /// Abandon any ingest in flight. A later `finish_upload` for it is a no-op.
    pub fn cancel_upload(&mut self) {
        if self.state == EditorState::Processing {
            self.ingest_seq += 1;
            self.state = self.settled_state();
        }
    }

    pub async fn upload(&mut self, bytes: Vec<u8>, mime: &str) -> TwibbonResult<IngestApplied> {
        let pending = self.begin_upload(bytes, mime)?;
        let outcome = pending.wait().await;
        self.finish_upload(outcome)
    }

    fn settled_state(&self) -> EditorState {
        if self.layers.has_photo() {
            EditorState::Loaded
        } else {
            EditorState::Empty
        }
    }

    /// Apply a scale value. Returns the resulting transform, or `None` without a photo.
    pub fn set_scale(&mut self, value: f64) -> Option<Transform> {
        self.has_photo().then(|| {
            self.controller.set_scale(value);
            self.controller.transform()
        })
    }

    pub fn set_rotation(&mut self, degrees: f64) -> Option<Transform> {
        self.has_photo().then(|| {
            self.controller.set_rotation(degrees);
            self.controller.transform()
        })
    }

    /// Set the photo offset as fractions of the viewport size.
    pub fn set_offset(&mut self, fx: f64, fy: f64) -> Option<Transform> {
        self.has_photo().then(|| {
            self.controller.set_offset(fx, fy);
            self.controller.transform()
        })
    }

    /// Pan by a pointer delta in viewport pixels.
    pub fn drag_by(&mut self, dx_px: f64, dy_px: f64) -> Option<Transform> {
        let viewport = self.viewport();
        self.has_photo().then(|| {
            self.controller.drag_by(Vec2::new(dx_px, dy_px), &viewport);
            self.controller.transform()
        })
    }

    /// Apply a container width directly, rescaling the frame on change.
    pub fn on_resize(&mut self, container_width: f64) -> ResizeOutcome {
        let outcome = self.viewport.on_resize(container_width);
        if let ResizeOutcome::Resized(viewport) = outcome {
            let geometry = self.layers.rescale_frame(&viewport);
            tracing::debug!(
                width = viewport.width,
                height = viewport.height,
                ?geometry,
                "viewport resized"
            );
        }
        outcome
    }

    /// Open the session's resize subscription. Replaces any previous one.
    pub fn subscribe_resize(&mut self) -> ResizeHandle {
        let (handle, feed) = resize_channel();
        self.resize = Some(feed);
        handle
    }

    /// Apply the latest queued resize notification, if any.
    pub fn pump_resize(&mut self) -> ResizeOutcome {
        match self.resize.as_mut().and_then(ResizeFeed::drain_latest) {
            Some(width) => self.on_resize(width),
            None => ResizeOutcome::Unchanged,
        }
    }

    /// Wait for the next resize notification and apply it.
    ///
    /// Returns `None` without a subscription or once every handle was dropped.
    pub async fn wait_resize(&mut self) -> Option<ResizeOutcome> {
        let width = self.resize.as_mut()?.next_latest().await?;
        Some(self.on_resize(width))
    }

    /// Release the resize subscription and abandon any ingest in flight.
    pub fn close(&mut self) {
        self.resize = None;
        self.cancel_upload();
    }

    pub fn is_subscribed(&self) -> bool {
        self.resize.is_some()
    }

    /// Capture the current composition.
    pub fn snapshot(&self) -> CompositionSnapshot {
        CompositionSnapshot::capture(
            &self.layers,
            &self.controller.transform(),
            self.viewport.viewport(),
        )
    }

    /// Snapshot the composition for export and enter `Exporting`.
    pub fn begin_export(&mut self, request: ExportRequest) -> TwibbonResult<ExportJob> {
        match self.state {
            EditorState::Empty => return Err(TwibbonError::EmptyComposition),
            EditorState::Processing => {
                return Err(TwibbonError::export("an upload is still processing"));
            }
            EditorState::Exporting => {
                return Err(TwibbonError::export("an export is already running"));
            }
            EditorState::Loaded => {}
        }
        if !self.layers.has_photo() {
            return Err(TwibbonError::EmptyComposition);
        }
        request.validate()?;
        if self.viewport().is_empty() {
            return Err(TwibbonError::export("viewport has zero size"));
        }

        self.state = EditorState::Exporting;
        Ok(ExportJob {
            snapshot: self.snapshot(),
            request,
            slug: self.campaign.slug.clone(),
        })
    }

    /// Leave `Exporting`. The job's result is passed through unchanged.
    pub fn finish_export(
        &mut self,
        result: TwibbonResult<ExportOutput>,
    ) -> TwibbonResult<ExportOutput> {
        if self.state == EditorState::Exporting {
            self.state = self.settled_state();
        }
        if let Err(e) = &result {
            tracing::warn!(error = %e, "export failed");
        }
        result
    }

    #[tracing::instrument(skip(self))]
    pub async fn export(&mut self, request: ExportRequest) -> TwibbonResult<ExportOutput> {
        let job = self.begin_export(request)?;
        let result = job.run().await;
        self.finish_export(result)
    }

    /// Render the on-screen composite, optionally with interaction overlays.
    pub fn render_live(&mut self, decorations: Decorations) -> TwibbonResult<LiveFrame> {
        let snapshot = self.snapshot();
        self.compositor.render_live(&snapshot, decorations)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;

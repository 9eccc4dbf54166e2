//! Twibbon is a photo-and-frame compositing engine.
//!
//! A campaign supplies a decorative frame with a fixed aspect ratio. A user photo is ingested
//! (bounded, re-encoded, cover-fit), positioned underneath the frame with scale, rotation and
//! offset, and exported at a resolution multiplier that pixel-matches the live composite.
//!
//! - Open an [`EditorSession`] from a [`CampaignSource`] and a [`FrameLoader`]
//! - Upload a photo and adjust its [`Transform`]
//! - Render live with [`EditorSession::render_live`] or export with [`EditorSession::export`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod campaign;
pub(crate) mod config;
pub(crate) mod ingest;
pub(crate) mod layers;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod transform;
pub(crate) mod viewport;

pub use crate::foundation::core::{Affine, PixelBuffer, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{TwibbonError, TwibbonResult};

pub use crate::campaign::frame::{DefaultFrameLoader, FrameLoader, load_frame};
pub use crate::campaign::model::{Campaign, normalize_slug};
pub use crate::campaign::store::{CampaignSource, InMemoryCampaigns, JsonCampaignStore};
pub use crate::config::editor::EditorConfig;
pub use crate::ingest::pipeline::{
    CompressOpts, Compressed, PreparedPhoto, SUPPORTED_MIME_TYPES, Upload, accept_upload,
    compress, decode_image, downscaled_dimensions, prepare_photo,
};
pub use crate::ingest::placement::{PlacementPolicy, base_scale, covers};
pub use crate::layers::stack::{
    FrameGeometry, FrameLayer, LayerKind, LayerRef, LayerStack, PhotoLayer,
};
pub use crate::render::cpu::{CpuCompositor, Decorations, LiveFrame};
pub use crate::render::export::{
    ExportFormat, ExportOutput, ExportRequest, encode_raster, export, export_filename,
};
pub use crate::render::snapshot::{CompositionSnapshot, DrawCall, Raster};
pub use crate::session::editor::{
    EditorSession, EditorState, ExportJob, IngestApplied, IngestOutcome, IngestTicket,
    PendingIngest,
};
pub use crate::transform::affine::{frame_affine, frame_scale, photo_affine, resolution};
pub use crate::transform::controller::{
    MAX_ROTATION_DEG, ScaleBounds, ScaleMode, Transform, TransformController,
};
pub use crate::viewport::manager::{ResizeOutcome, Viewport, ViewportManager};
pub use crate::viewport::observer::{ResizeFeed, ResizeHandle, resize_channel};

//! Flowdraw Render Engine
//!
//! Turns flow definitions into exported workspace snapshots.
//!
//! # Pipeline Architecture
//!
//! ```text
//! flows.json ──> Flow::parse
//!                    │
//!                    ▼
//!            RenderSession (one per file)
//!              open → import → settle
//!                    │
//!                    ▼
//!            sequencer: one workspace at a time
//!                    │
//!                    ▼
//!            SnapshotSequence
//!                    │
//!        ┌───────────┼───────────┐
//!        ▼           ▼           ▼
//!      .html       .json    -00.svg, -01.svg, ...
//! ```
//!
//! Batch mode walks a directory tree and feeds each `.json` file through the
//! same pipeline, serially.

pub mod batch;
pub mod engine;
pub mod export;
pub mod pipeline;
pub mod registry;
pub mod sequencer;
pub mod session;
pub mod snapshot;
pub mod svg;

pub use batch::{process_all, walk, BatchProgress, BatchSummary, ProgressCallback};
pub use engine::{RenderBackend, RenderEngine};
pub use export::{export, Artifact, Destination};
pub use pipeline::{Pipeline, PipelineOptions};
pub use registry::{NodeTypeDef, NodeTypeRegistry};
pub use sequencer::sequence;
pub use session::{RenderSession, SessionOptions, SessionState};
pub use snapshot::{Snapshot, SnapshotSequence};
pub use svg::SvgEngine;

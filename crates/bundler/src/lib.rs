pub mod error;
pub mod graph;
pub mod manifest;
pub mod pipeline;
pub mod resolve;
pub mod split;

// Re-exports
pub use error::BuildError;
pub use graph::{broken_id, GraphBuilder, ModuleGraph, ModuleKind, ModuleNode, ResolvedImport};
pub use manifest::{Manifest, ManifestChunk};
pub use pipeline::{build, BuildOutput, ChunkArtifact, StyleArtifact};
pub use resolve::{ModuleResolver, EXTENSIONS};
pub use split::{split, Chunk, ChunkKind, ChunkPlan, SplitPolicy};

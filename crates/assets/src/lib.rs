//! Environment asset pipeline: addressing, transfer, progress and decoding.
//!
//! Assets are fetched as bytes from an `AssetSource`, then decoded into a
//! flat, ordered list of meshes plus transform nodes. Decoded assets carry a
//! content-addressed id so a scene can tell two imports of the same bytes apart
//! from two different assets.
//!
//! # Invariants
//! - Progress reports never go backwards, even across retries.
//! - Only transient transfer failures are retried; decode failures never are.
//! - Mesh order is the importer's traversal order and stays stable for the
//!   lifetime of a decoded asset.

mod error;
mod decoder;
mod path;
mod progress;
mod retry;
mod source;
mod types;

pub use error::AssetError;
pub use decoder::GltfDecoder;
pub use path::AssetPath;
pub use progress::{LoadProgress, ProgressTracker};
pub use retry::{RetryPolicy, fetch_with_retry};
pub use source::{AssetSource, FileSource, MemorySource};
pub use types::{AssetDecoder, AssetId, DecodedAsset, DecodedMesh, TransformNode};

pub fn crate_info() -> &'static str {
    "atrium-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }
}

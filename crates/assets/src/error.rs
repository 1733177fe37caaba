/// Errors from asset transfer and decoding.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("transfer of {path} failed: {reason}")]
    Transfer { path: String, reason: String },
    #[error("glTF parse error: {0}")]
    GltfParse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("gave up on {path} after {attempts} attempts: {last}")]
    Exhausted {
        path: String,
        attempts: u32,
        last: Box<AssetError>,
    },
}

impl AssetError {
    /// Whether another attempt at the same transfer could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AssetError::Io(e) => e.kind() != std::io::ErrorKind::NotFound,
            AssetError::Transfer { .. } => true,
            AssetError::NotFound(_)
            | AssetError::GltfParse(_)
            | AssetError::Json(_)
            | AssetError::Exhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let timeout = AssetError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "slow",
        ));
        assert!(timeout.is_transient());
        let missing = AssetError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert!(!missing.is_transient());
        assert!(!AssetError::NotFound("room.glb".into()).is_transient());
        assert!(!AssetError::GltfParse("bad".into()).is_transient());
        assert!(
            AssetError::Transfer {
                path: "a".into(),
                reason: "reset".into()
            }
            .is_transient()
        );
    }
}

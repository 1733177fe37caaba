use serde::{Deserialize, Serialize};

/// An asset addressed by base directory and file name. Sibling files such as
/// textures resolve against the same base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPath {
    pub base: String,
    pub file: String,
}

impl AssetPath {
    pub fn new(base: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            file: file.into(),
        }
    }

    /// Base and file joined with a single separator.
    pub fn full(&self) -> String {
        self.sibling(&self.file)
    }

    /// Resolve another file name against this asset's base.
    pub fn sibling(&self, name: &str) -> String {
        if self.base.is_empty() {
            return name.to_string();
        }
        format!("{}/{}", self.base.trim_end_matches('/'), name)
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.file
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

impl std::fmt::Display for AssetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_single_separator() {
        assert_eq!(AssetPath::new("./models/", "room1.glb").full(), "./models/room1.glb");
        assert_eq!(AssetPath::new("./models", "room1.glb").full(), "./models/room1.glb");
        assert_eq!(AssetPath::new("", "room1.glb").full(), "room1.glb");
    }

    #[test]
    fn siblings_share_base() {
        let p = AssetPath::new("./models/", "room1.glb");
        assert_eq!(p.sibling("inertia1.mp4"), "./models/inertia1.mp4");
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(AssetPath::new("", "Room.GLB").extension().as_deref(), Some("glb"));
        assert_eq!(AssetPath::new("", "noext").extension(), None);
    }
}

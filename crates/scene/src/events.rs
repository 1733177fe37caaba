use atrium_assets::AssetId;

/// Record of a state change made to the scene, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    CameraAttached {
        name: String,
    },
    EnvironmentImported {
        asset: AssetId,
        meshes: usize,
        transform_nodes: usize,
    },
    CollisionsMarked {
        enabled: usize,
        excluded: Option<usize>,
    },
    MaterialAssigned {
        mesh: usize,
        material: String,
    },
    VideoPlayback {
        material: String,
        playing: bool,
    },
    EffectAttached {
        kind: &'static str,
    },
}

impl std::fmt::Display for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneEvent::CameraAttached { name } => write!(f, "camera attached: {name}"),
            SceneEvent::EnvironmentImported {
                asset,
                meshes,
                transform_nodes,
            } => write!(
                f,
                "environment {asset} imported: {meshes} meshes, {transform_nodes} transform nodes"
            ),
            SceneEvent::CollisionsMarked { enabled, excluded } => match excluded {
                Some(idx) => write!(f, "collisions on {enabled} meshes (excluding #{idx})"),
                None => write!(f, "collisions on {enabled} meshes"),
            },
            SceneEvent::MaterialAssigned { mesh, material } => {
                write!(f, "material '{material}' assigned to mesh #{mesh}")
            }
            SceneEvent::VideoPlayback { material, playing } => {
                let state = if *playing { "playing" } else { "unavailable" };
                write!(f, "video on '{material}': {state}")
            }
            SceneEvent::EffectAttached { kind } => write!(f, "effect attached: {kind}"),
        }
    }
}

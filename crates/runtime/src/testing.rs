//! Fixtures shared by the runtime tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use atrium_assets::MemorySource;
use atrium_engine::Services;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use glam::Vec3;
use serde_json::json;

/// Scene-space position of mesh entry `i` decoded from `room_gltf`. Index 0
/// is the decoder's synthetic root.
pub fn mesh_position(i: usize) -> Vec3 {
    Vec3::new(i as f32, 0.5 * i as f32, -(i as f32))
}

/// glTF document that decodes to `mesh_count` entries: the synthetic root
/// plus nodes `mesh1..`, each a unit cube.
pub fn room_gltf(mesh_count: usize) -> Vec<u8> {
    let nodes: Vec<_> = (1..mesh_count)
        .map(|i| {
            // The decoder mirrors X into left-handed scene space.
            let p = mesh_position(i);
            json!({ "name": format!("mesh{i}"), "mesh": 0, "translation": [-p.x, p.y, p.z] })
        })
        .collect();
    let roots: Vec<usize> = (0..nodes.len()).collect();
    let doc = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": roots }],
        "nodes": nodes,
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{ "byteLength": 288 }],
        "bufferViews": [{ "buffer": 0, "byteLength": 288 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "type": "VEC3",
            "count": 24,
            "min": [-0.5, -0.5, -0.5],
            "max": [0.5, 0.5, 0.5]
        }]
    });
    serde_json::to_vec(&doc).unwrap()
}

/// Source serving `room_gltf(mesh_count)` at the default asset path.
pub fn reference_source(mesh_count: usize) -> MemorySource {
    let mut source = MemorySource::new();
    source.insert("./models/room1.glb", room_gltf(mesh_count));
    source
}

/// Services whose input source stays unavailable until `open` is called.
#[derive(Clone, Default)]
pub struct GatedServices {
    waiting: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
    open: Rc<RefCell<bool>>,
}

impl GatedServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        *self.open.borrow_mut() = true;
        for tx in self.waiting.borrow_mut().drain(..) {
            let _ = tx.send(());
        }
    }
}

impl Services for GatedServices {
    fn input_ready(&self) -> LocalBoxFuture<'static, ()> {
        if *self.open.borrow() {
            return future::ready(()).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        self.waiting.borrow_mut().push(tx);
        rx.map(|_| ()).boxed_local()
    }

    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }
}

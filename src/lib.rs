//! Scene-state and rendering building blocks for the orbit viewer.
//!
//! The crate keeps CPU-side scene state (camera, lights, meshes,
//! materials) in plain types that are testable without a GPU; the
//! [`render::Renderer`] pushes that state into uniform buffers once per
//! frame. The binary wires these pieces to a window and input loop.

pub mod app;
pub mod camera;
pub mod light;
pub mod object;
pub mod render;
pub mod texture;

pub use app::{CursorTracker, Spin, Ticker};
pub use camera::Camera;
pub use light::{Light, LightSet, MAX_LIGHTS};
pub use object::{DrawMode, GeometryError, Material, MeshData, RenderObject, VertexLayout};
pub use render::{ObjectId, Renderer};
pub use texture::{PixelFormat, TextureData};

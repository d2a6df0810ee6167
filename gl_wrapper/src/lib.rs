pub mod buffer;
pub mod driver;
pub mod error;
pub mod image;
pub mod layout;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod native;
pub mod program;
pub mod renderer;
pub mod source;
pub mod texture;
pub mod vertex_array;

pub use driver::{Gl, GlRef};

/// Unit quad as `(x, y, u, v)` vertices, counter-clockwise from bottom left.
#[rustfmt::skip]
pub const QUAD_VERTICES: [f32; 16] = [
    -0.5, -0.5, 0.0, 0.0,
     0.5, -0.5, 1.0, 0.0,
     0.5,  0.5, 1.0, 1.0,
    -0.5,  0.5, 0.0, 1.0,
];

#[rustfmt::skip]
pub const QUAD_INDICES: [u32; 6] = [
    0, 1, 2,
    2, 3, 0,
];

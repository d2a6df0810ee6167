use std::rc::Rc;

use gl::types::GLsizei;

use crate::buffer::IndexBuffer;
use crate::driver::GlRef;
use crate::gl_call;
use crate::program::ShaderProgram;
use crate::vertex_array::VertexArray;

/// Issues clears and indexed draws. Keeps no state between calls.
pub struct Renderer {
    gl: GlRef,
}

impl Renderer {
    pub fn new(gl: &GlRef) -> Self {
        Self { gl: Rc::clone(gl) }
    }

    /// Binds all three objects and draws `index_buffer.count()` indices as
    /// a triangle list.
    pub fn draw(&self, vertex_array: &VertexArray, index_buffer: &IndexBuffer, program: &ShaderProgram) {
        program.bind();
        vertex_array.bind();
        index_buffer.bind();

        gl_call!(
            self.gl,
            draw_elements(gl::TRIANGLES, index_buffer.count() as GLsizei, gl::UNSIGNED_INT)
        );
    }

    pub fn clear(&self) {
        gl_call!(self.gl, clear(gl::COLOR_BUFFER_BIT));
    }

    pub fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        gl_call!(self.gl, clear_color(r, g, b, a));
    }

    pub fn resize(&self, width: u32, height: u32) {
        gl_call!(self.gl, viewport(0, 0, width as GLsizei, height as GLsizei));
    }

    pub fn version(&self) -> String {
        gl_call!(self.gl, version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGl;

    #[test]
    fn clear_and_resize() {
        let mock = Rc::new(MockGl::new());
        let gl: GlRef = mock.clone();
        let renderer = Renderer::new(&gl);

        renderer.set_clear_color(0.1, 0.2, 0.3, 1.0);
        renderer.clear();
        renderer.resize(640, 480);

        let state = mock.state();
        assert_eq!(state.clear_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(state.clears, [gl::COLOR_BUFFER_BIT]);
        assert_eq!(state.viewport, (0, 0, 640, 480));
    }
}

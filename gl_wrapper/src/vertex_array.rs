use std::rc::Rc;

use gl::types::{GLint, GLsizei, GLuint};
use log::trace;

use crate::buffer::{BufferError, VertexBuffer};
use crate::driver::GlRef;
use crate::gl_call;
use crate::layout::VertexBufferLayout;

pub struct VertexArray {
    gl: GlRef,
    id: GLuint,
}

impl VertexArray {
    /// Creates a vertex array and leaves it bound.
    pub fn new(gl: &GlRef) -> Result<Self, BufferError> {
        let gl = Rc::clone(gl);

        let id = gl_call!(gl, gen_vertex_array());
        if id == 0 {
            return Err(BufferError::Allocation);
        }
        gl_call!(gl, bind_vertex_array(id));

        Ok(Self { gl, id })
    }

    /// Feeds attribute slots `0..n` from `buffer` as described by `layout`.
    pub fn add_buffer(&self, buffer: &VertexBuffer, layout: &VertexBufferLayout) {
        self.bind();
        buffer.bind();

        let stride = layout.stride() as GLsizei;

        for (slot, element, offset) in layout.attributes() {
            gl_call!(self.gl, enable_vertex_attrib_array(slot));
            gl_call!(
                self.gl,
                vertex_attrib_pointer(
                    slot,
                    element.count as GLint,
                    element.kind.gl_type(),
                    element.normalized,
                    stride,
                    offset as usize,
                )
            );
        }

        trace!(
            "vertex array {}: {} attributes from buffer {}, stride {stride}",
            self.id,
            layout.elements().len(),
            buffer.id()
        );
    }

    pub fn bind(&self) {
        gl_call!(self.gl, bind_vertex_array(self.id));
    }

    pub fn unbind(&self) {
        gl_call!(self.gl, bind_vertex_array(0));
    }

    pub fn id(&self) -> GLuint {
        self.id
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        gl_call!(self.gl, delete_vertex_array(self.id));
    }
}

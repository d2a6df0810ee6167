use std::rc::Rc;

use bytemuck::Pod;
use gl::types::GLuint;
use log::trace;
use thiserror::Error;

use crate::driver::{Gl, GlRef};
use crate::gl_call;

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Driver could not allocate a buffer object")]
    Allocation,
}

fn create_buffer(gl: &dyn Gl, target: u32, data: &[u8]) -> Result<GLuint, BufferError> {
    let id = gl_call!(gl, gen_buffer());
    if id == 0 {
        return Err(BufferError::Allocation);
    }

    gl_call!(gl, bind_buffer(target, id));
    gl_call!(gl, buffer_data(target, data, gl::STATIC_DRAW));

    Ok(id)
}

/// Vertex data uploaded once into an `ARRAY_BUFFER`.
pub struct VertexBuffer {
    gl: GlRef,
    id: GLuint,
    size: usize,
}

impl VertexBuffer {
    pub fn new<T: Pod>(gl: &GlRef, data: &[T]) -> Result<Self, BufferError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let id = create_buffer(&**gl, gl::ARRAY_BUFFER, bytes)?;
        trace!("vertex buffer {id}: {} bytes", bytes.len());

        Ok(Self {
            gl: Rc::clone(gl),
            id,
            size: bytes.len(),
        })
    }

    pub fn bind(&self) {
        gl_call!(self.gl, bind_buffer(gl::ARRAY_BUFFER, self.id));
    }

    pub fn unbind(&self) {
        gl_call!(self.gl, bind_buffer(gl::ARRAY_BUFFER, 0));
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    /// Uploaded size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        gl_call!(self.gl, delete_buffer(self.id));
    }
}

/// `u32` indices uploaded once into an `ELEMENT_ARRAY_BUFFER`.
pub struct IndexBuffer {
    gl: GlRef,
    id: GLuint,
    count: usize,
}

impl IndexBuffer {
    pub fn new(gl: &GlRef, indices: &[u32]) -> Result<Self, BufferError> {
        let id = create_buffer(&**gl, gl::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(indices))?;
        trace!("index buffer {id}: {} indices", indices.len());

        Ok(Self {
            gl: Rc::clone(gl),
            id,
            count: indices.len(),
        })
    }

    pub fn bind(&self) {
        gl_call!(self.gl, bind_buffer(gl::ELEMENT_ARRAY_BUFFER, self.id));
    }

    pub fn unbind(&self) {
        gl_call!(self.gl, bind_buffer(gl::ELEMENT_ARRAY_BUFFER, 0));
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    /// Number of indices.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        gl_call!(self.gl, delete_buffer(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGl;

    fn mock() -> (Rc<MockGl>, GlRef) {
        let mock = Rc::new(MockGl::new());
        let gl: GlRef = mock.clone();
        (mock, gl)
    }

    #[test]
    fn vertex_buffer_uploads_static_data() {
        let (mock, gl) = mock();
        let data = [1.0_f32, 2.0, 3.0, 4.0];

        let vb = VertexBuffer::new(&gl, &data).unwrap();

        let state = mock.state();
        assert_eq!(state.buffers[&vb.id()], bytemuck::cast_slice::<f32, u8>(&data));
        assert_eq!(state.buffer_usage[&vb.id()], gl::STATIC_DRAW);
        assert_eq!(state.array_buffer, vb.id());
        assert_eq!(vb.size(), 16);
    }

    #[test]
    fn bind_then_unbind_clears_slot() {
        let (mock, gl) = mock();
        let vb = VertexBuffer::new(&gl, &[0_u8; 32]).unwrap();
        let ib = IndexBuffer::new(&gl, &[0, 1, 2]).unwrap();

        vb.bind();
        ib.bind();
        assert_eq!(mock.state().array_buffer, vb.id());
        assert_eq!(mock.state().element_array_buffer, ib.id());

        vb.unbind();
        ib.unbind();
        ib.unbind();
        assert_eq!(mock.state().array_buffer, 0);
        assert_eq!(mock.state().element_array_buffer, 0);
    }

    #[test]
    fn index_buffer_counts_elements() {
        let (mock, gl) = mock();

        let ib = IndexBuffer::new(&gl, &[0, 1, 2, 2, 3, 0]).unwrap();

        assert_eq!(ib.count(), 6);
        assert_eq!(mock.state().buffers[&ib.id()].len(), 24);
    }

    #[test]
    fn drop_releases_once_even_when_bound() {
        let (mock, gl) = mock();
        let vb = VertexBuffer::new(&gl, &[0.0_f32; 8]).unwrap();
        let id = vb.id();
        vb.bind();

        drop(vb);

        assert_eq!(mock.deletions(id), 1);
        assert_eq!(mock.state().array_buffer, 0);
        assert!(!mock.state().buffers.contains_key(&id));
    }

    #[test]
    fn failed_allocation_is_an_error() {
        let (mock, gl) = mock();
        mock.fail_allocations(true);

        let vb = VertexBuffer::new(&gl, &[0.0_f32; 4]);
        let ib = IndexBuffer::new(&gl, &[0, 1, 2]);

        assert!(matches!(vb, Err(BufferError::Allocation)));
        assert!(matches!(ib, Err(BufferError::Allocation)));
        let state = mock.state();
        assert!(state.buffers.is_empty());
        assert_eq!(state.array_buffer, 0);
        assert_eq!(state.element_array_buffer, 0);
    }
}

use std::rc::Rc;

use gl::types::{GLbitfield, GLenum, GLint, GLsizei, GLuint};

/// Shared handle to the driver. Wrappers keep one so `Drop` can release
/// their object; `Rc` keeps them on the thread owning the context.
pub type GlRef = Rc<dyn Gl>;

/// The subset of the OpenGL API the wrappers issue.
///
/// Every method maps to one driver entry point. Handles are plain `GLuint`
/// values, `0` meaning "none" both as a binding and as a failed allocation.
pub trait Gl {
    fn get_error(&self) -> GLenum;
    fn version(&self) -> String;

    fn gen_buffer(&self) -> GLuint;
    fn delete_buffer(&self, buffer: GLuint);
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum);

    fn gen_vertex_array(&self) -> GLuint;
    fn delete_vertex_array(&self, array: GLuint);
    fn bind_vertex_array(&self, array: GLuint);
    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );

    fn create_shader(&self, kind: GLenum) -> GLuint;
    fn shader_source(&self, shader: GLuint, source: &str);
    fn compile_shader(&self, shader: GLuint);
    fn compile_status(&self, shader: GLuint) -> bool;
    fn shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn validate_program(&self, program: GLuint);
    fn link_status(&self, program: GLuint) -> bool;
    fn program_info_log(&self, program: GLuint) -> String;
    fn use_program(&self, program: GLuint);
    fn delete_program(&self, program: GLuint);

    /// Returns `-1` when `name` is not an active uniform of `program`.
    fn uniform_location(&self, program: GLuint, name: &str) -> GLint;
    fn uniform_1i(&self, location: GLint, value: i32);
    fn uniform_1f(&self, location: GLint, value: f32);
    fn uniform_4f(&self, location: GLint, value: [f32; 4]);
    /// `value` is column-major.
    fn uniform_matrix_4fv(&self, location: GLint, value: &[f32; 16]);

    fn gen_texture(&self) -> GLuint;
    fn delete_texture(&self, texture: GLuint);
    fn active_texture(&self, unit: GLuint);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    fn tex_parameter_i(&self, target: GLenum, name: GLenum, param: GLint);
    /// Uploads an RGBA8 image. `None` leaves the storage uninitialized.
    fn tex_image_2d(&self, target: GLenum, width: GLsizei, height: GLsizei, pixels: Option<&[u8]>);

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: GLbitfield);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum);
}

use std::ffi::{c_char, c_void, CStr, CString};
use std::marker::PhantomData;

use gl::types::{GLbitfield, GLenum, GLint, GLsizei, GLuint};

use crate::driver::Gl;

/// Forwards every call to the loaded OpenGL function pointers.
pub struct NativeGl {
    // GL contexts are bound to one thread
    _not_send: PhantomData<*const ()>,
}

impl NativeGl {
    /// Loads function pointers through `loader`.
    ///
    /// # Safety
    ///
    /// The context the loader belongs to must be current on this thread for
    /// as long as the returned value, or any wrapper holding it, is alive.
    pub unsafe fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        Self {
            _not_send: PhantomData,
        }
    }
}

fn info_log(len: GLint, fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut c_char)) -> String {
    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0_u8; len as usize];
    let mut written: GLsizei = 0;
    fetch(len, &mut written, buf.as_mut_ptr() as *mut c_char);
    buf.truncate(written.max(0) as usize);

    String::from_utf8_lossy(&buf).into_owned()
}

fn gl_bool(value: bool) -> u8 {
    if value {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

impl Gl for NativeGl {
    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    fn version(&self) -> String {
        unsafe {
            let ptr = gl::GetString(gl::VERSION);
            if ptr.is_null() {
                return String::new();
            }
            CStr::from_ptr(ptr as *const c_char)
                .to_string_lossy()
                .into_owned()
        }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        id
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        unsafe { gl::BindBuffer(target, buffer) }
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe {
            gl::BufferData(
                target,
                data.len() as isize,
                data.as_ptr() as *const c_void,
                usage,
            )
        }
    }

    fn gen_vertex_array(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        id
    }

    fn delete_vertex_array(&self, array: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &array) }
    }

    fn bind_vertex_array(&self, array: GLuint) {
        unsafe { gl::BindVertexArray(array) }
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::EnableVertexAttribArray(index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        unsafe {
            gl::VertexAttribPointer(
                index,
                size,
                kind,
                gl_bool(normalized),
                stride,
                offset as *const c_void,
            )
        }
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        unsafe { gl::CreateShader(kind) }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let ptr = source.as_ptr() as *const c_char;
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader, 1, &ptr, &len) }
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn compile_status(&self, shader: GLuint) -> bool {
        let mut status = 0;
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut len = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) };
        info_log(len, |size, written, buf| unsafe {
            gl::GetShaderInfoLog(shader, size, written, buf)
        })
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn validate_program(&self, program: GLuint) {
        unsafe { gl::ValidateProgram(program) }
    }

    fn link_status(&self, program: GLuint) -> bool {
        let mut status = 0;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut len = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };
        info_log(len, |size, written, buf| unsafe {
            gl::GetProgramInfoLog(program, size, written, buf)
        })
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        let Ok(name) = CString::new(name) else {
            return -1;
        };
        unsafe { gl::GetUniformLocation(program, name.as_ptr()) }
    }

    fn uniform_1i(&self, location: GLint, value: i32) {
        unsafe { gl::Uniform1i(location, value) }
    }

    fn uniform_1f(&self, location: GLint, value: f32) {
        unsafe { gl::Uniform1f(location, value) }
    }

    fn uniform_4f(&self, location: GLint, value: [f32; 4]) {
        let [x, y, z, w] = value;
        unsafe { gl::Uniform4f(location, x, y, z, w) }
    }

    fn uniform_matrix_4fv(&self, location: GLint, value: &[f32; 16]) {
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, value.as_ptr()) }
    }

    fn gen_texture(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        id
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) }
    }

    fn active_texture(&self, unit: GLuint) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        unsafe { gl::BindTexture(target, texture) }
    }

    fn tex_parameter_i(&self, target: GLenum, name: GLenum, param: GLint) {
        unsafe { gl::TexParameteri(target, name, param) }
    }

    fn tex_image_2d(&self, target: GLenum, width: GLsizei, height: GLsizei, pixels: Option<&[u8]>) {
        let data = pixels.map_or(std::ptr::null(), |p| p.as_ptr() as *const c_void);

        unsafe {
            gl::TexImage2D(
                target,
                0,
                gl::RGBA8 as GLint,
                width,
                height,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                data,
            )
        }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { gl::ClearColor(r, g, b, a) }
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { gl::Clear(mask) }
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { gl::Viewport(x, y, width, height) }
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum) {
        unsafe { gl::DrawElements(mode, count, kind, std::ptr::null()) }
    }
}

//! Recording software driver.
//!
//! `MockGl` keeps the driver state the wrappers touch (objects, binding
//! slots, uploads, uniforms, draws) in plain collections so tests can assert
//! on it without a context. It raises the same error codes a driver would
//! for the misuse cases the wrappers can run into.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeSet, HashMap, VecDeque};

use gl::types::{GLbitfield, GLenum, GLint, GLsizei, GLuint};

use crate::driver::Gl;

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttribPointer {
    pub index: GLuint,
    pub size: GLint,
    pub kind: GLenum,
    pub normalized: bool,
    pub stride: GLsizei,
    pub offset: usize,
    pub buffer: GLuint,
    pub vertex_array: GLuint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: GLenum,
    pub count: GLsizei,
    pub kind: GLenum,
    pub vertex_array: GLuint,
    pub element_buffer: GLuint,
    pub program: GLuint,
}

#[derive(Debug, Clone)]
pub struct MockShader {
    pub kind: GLenum,
    pub source: String,
    pub compiled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockProgram {
    pub attached: Vec<GLuint>,
    pub linked: bool,
    pub validated: bool,
    pub info_log: String,
    /// Active uniforms, the location being the index.
    pub uniforms: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockTexture {
    pub params: HashMap<GLenum, GLint>,
    pub width: GLsizei,
    pub height: GLsizei,
    /// Byte length of the last upload, `None` for an uninitialized one.
    pub uploaded: Option<usize>,
}

#[derive(Debug, Default)]
pub struct MockState {
    next_id: GLuint,
    /// Every allocation returns handle `0` while set.
    pub fail_alloc: bool,
    pub errors: VecDeque<GLenum>,

    pub buffers: HashMap<GLuint, Vec<u8>>,
    pub buffer_usage: HashMap<GLuint, GLenum>,
    pub vertex_arrays: BTreeSet<GLuint>,
    pub shaders: HashMap<GLuint, MockShader>,
    pub programs: HashMap<GLuint, MockProgram>,
    pub textures: HashMap<GLuint, MockTexture>,
    /// How many times each handle was deleted.
    pub deletions: HashMap<GLuint, usize>,

    pub array_buffer: GLuint,
    pub element_array_buffer: GLuint,
    pub vertex_array: GLuint,
    pub program: GLuint,
    pub active_texture: GLuint,
    pub texture_units: HashMap<GLuint, GLuint>,

    pub attributes: Vec<AttribPointer>,
    pub enabled_attributes: BTreeSet<GLuint>,
    pub uniform_lookups: usize,
    pub uniforms: HashMap<(GLuint, GLint), UniformValue>,
    pub draws: Vec<DrawCall>,
    pub clears: Vec<GLbitfield>,
    pub clear_color: [f32; 4],
    pub viewport: (GLint, GLint, GLsizei, GLsizei),
}

impl MockState {
    fn alloc(&mut self) -> GLuint {
        if self.fail_alloc {
            return 0;
        }

        self.next_id += 1;
        self.next_id
    }

    fn raise(&mut self, code: GLenum) {
        self.errors.push_back(code);
    }

    fn record_delete(&mut self, id: GLuint) {
        *self.deletions.entry(id).or_default() += 1;
    }

    fn bound_texture(&self) -> GLuint {
        self.texture_units
            .get(&self.active_texture)
            .copied()
            .unwrap_or(0)
    }

    fn set_uniform(&mut self, location: GLint, value: UniformValue) {
        if location == -1 {
            return;
        }

        let valid = self
            .programs
            .get(&self.program)
            .map_or(false, |p| p.linked && (location as usize) < p.uniforms.len());

        if location < 0 || !valid {
            self.raise(gl::INVALID_OPERATION);
            return;
        }

        self.uniforms.insert((self.program, location), value);
    }
}

#[derive(Debug, Default)]
pub struct MockGl {
    state: RefCell<MockState>,
}

impl MockGl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, MockState> {
        self.state.borrow()
    }

    /// Makes the following allocations fail like an exhausted driver would.
    pub fn fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_alloc = fail;
    }

    /// Queues `code` as if a previous call had raised it.
    pub fn push_error(&self, code: GLenum) {
        self.state.borrow_mut().raise(code);
    }

    pub fn deletions(&self, id: GLuint) -> usize {
        self.state().deletions.get(&id).copied().unwrap_or(0)
    }

    /// Value last set for `name` in `program`.
    pub fn uniform(&self, program: GLuint, name: &str) -> Option<UniformValue> {
        let state = self.state();
        let location = state
            .programs
            .get(&program)?
            .uniforms
            .iter()
            .position(|u| u == name)?;

        state.uniforms.get(&(program, location as GLint)).cloned()
    }
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != "uniform" {
            return None;
        }
        let _ty = tokens.next()?;
        let name = tokens.next()?;
        let name = name.split(|c| c == ';' || c == '[').next()?;

        (!name.is_empty()).then(|| name.to_owned())
    })
}

impl Gl for MockGl {
    fn get_error(&self) -> GLenum {
        self.state
            .borrow_mut()
            .errors
            .pop_front()
            .unwrap_or(gl::NO_ERROR)
    }

    fn version(&self) -> String {
        "3.3.0 MockGl".to_owned()
    }

    fn gen_buffer(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        if id != 0 {
            state.buffers.insert(id, Vec::new());
        }
        id
    }

    fn delete_buffer(&self, buffer: GLuint) {
        if buffer == 0 {
            return;
        }

        let mut state = self.state.borrow_mut();
        state.record_delete(buffer);
        state.buffers.remove(&buffer);
        state.buffer_usage.remove(&buffer);
        if state.array_buffer == buffer {
            state.array_buffer = 0;
        }
        if state.element_array_buffer == buffer {
            state.element_array_buffer = 0;
        }
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        let mut state = self.state.borrow_mut();
        if buffer != 0 && !state.buffers.contains_key(&buffer) {
            state.raise(gl::INVALID_OPERATION);
            return;
        }

        match target {
            gl::ARRAY_BUFFER => state.array_buffer = buffer,
            gl::ELEMENT_ARRAY_BUFFER => state.element_array_buffer = buffer,
            _ => state.raise(gl::INVALID_ENUM),
        }
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        let mut state = self.state.borrow_mut();
        let bound = match target {
            gl::ARRAY_BUFFER => state.array_buffer,
            gl::ELEMENT_ARRAY_BUFFER => state.element_array_buffer,
            _ => return state.raise(gl::INVALID_ENUM),
        };

        if bound == 0 {
            return state.raise(gl::INVALID_OPERATION);
        }

        state.buffers.insert(bound, data.to_vec());
        state.buffer_usage.insert(bound, usage);
    }

    fn gen_vertex_array(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        if id != 0 {
            state.vertex_arrays.insert(id);
        }
        id
    }

    fn delete_vertex_array(&self, array: GLuint) {
        if array == 0 {
            return;
        }

        let mut state = self.state.borrow_mut();
        state.record_delete(array);
        state.vertex_arrays.remove(&array);
        if state.vertex_array == array {
            state.vertex_array = 0;
        }
    }

    fn bind_vertex_array(&self, array: GLuint) {
        let mut state = self.state.borrow_mut();
        if array != 0 && !state.vertex_arrays.contains(&array) {
            return state.raise(gl::INVALID_OPERATION);
        }
        state.vertex_array = array;
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        let mut state = self.state.borrow_mut();
        if state.vertex_array == 0 {
            return state.raise(gl::INVALID_OPERATION);
        }
        state.enabled_attributes.insert(index);
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
        let mut state = self.state.borrow_mut();
        if !(1..=4).contains(&size) || stride < 0 {
            return state.raise(gl::INVALID_VALUE);
        }
        if state.vertex_array == 0 || state.array_buffer == 0 {
            return state.raise(gl::INVALID_OPERATION);
        }

        let pointer = AttribPointer {
            index,
            size,
            kind,
            normalized,
            stride,
            offset,
            buffer: state.array_buffer,
            vertex_array: state.vertex_array,
        };
        state.attributes.push(pointer);
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        let mut state = self.state.borrow_mut();
        if kind != gl::VERTEX_SHADER && kind != gl::FRAGMENT_SHADER {
            state.raise(gl::INVALID_ENUM);
            return 0;
        }

        let id = state.alloc();
        if id != 0 {
            let shader = MockShader {
                kind,
                source: String::new(),
                compiled: false,
            };
            state.shaders.insert(id, shader);
        }
        id
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(s) => s.source = source.to_owned(),
            None => state.raise(gl::INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(s) => s.compiled = s.source.contains("void main"),
            None => state.raise(gl::INVALID_VALUE),
        }
    }

    fn compile_status(&self, shader: GLuint) -> bool {
        self.state()
            .shaders
            .get(&shader)
            .map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        match self.state().shaders.get(&shader) {
            Some(s) if !s.compiled => "0:1(1): error: no function with name 'main'".to_owned(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        if shader == 0 {
            return;
        }

        let mut state = self.state.borrow_mut();
        state.record_delete(shader);
        state.shaders.remove(&shader);
    }

    fn create_program(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        if id != 0 {
            state.programs.insert(id, MockProgram::default());
        }
        id
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            return state.raise(gl::INVALID_VALUE);
        }
        match state.programs.get_mut(&program) {
            Some(p) => p.attached.push(shader),
            None => state.raise(gl::INVALID_VALUE),
        }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        let detached = state.programs.get_mut(&program).map_or(false, |p| {
            let before = p.attached.len();
            p.attached.retain(|s| *s != shader);
            p.attached.len() != before
        });

        if !detached {
            state.raise(gl::INVALID_OPERATION);
        }
    }

    fn link_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            return state.raise(gl::INVALID_VALUE);
        };

        let stages: Vec<&MockShader> = attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .collect();
        let has = |kind: GLenum| stages.iter().any(|s| s.kind == kind && s.compiled);

        let (linked, info_log) = if !stages.iter().all(|s| s.compiled) {
            (false, "error: linking with uncompiled shader".to_owned())
        } else if !has(gl::VERTEX_SHADER) || !has(gl::FRAGMENT_SHADER) {
            (false, "error: program lacks a vertex or fragment stage".to_owned())
        } else {
            (true, String::new())
        };

        let mut uniforms = Vec::new();
        if linked {
            for stage in &stages {
                for name in declared_uniforms(&stage.source) {
                    if !uniforms.contains(&name) {
                        uniforms.push(name);
                    }
                }
            }
        }

        if let Some(p) = state.programs.get_mut(&program) {
            p.linked = linked;
            p.info_log = info_log;
            p.uniforms = uniforms;
        }
    }

    fn validate_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(p) => p.validated = p.linked,
            None => state.raise(gl::INVALID_VALUE),
        }
    }

    fn link_status(&self, program: GLuint) -> bool {
        self.state()
            .programs
            .get(&program)
            .map_or(false, |p| p.linked)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        self.state()
            .programs
            .get(&program)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        if program != 0 && !state.programs.get(&program).map_or(false, |p| p.linked) {
            return state.raise(gl::INVALID_OPERATION);
        }
        state.program = program;
    }

    fn delete_program(&self, program: GLuint) {
        if program == 0 {
            return;
        }

        let mut state = self.state.borrow_mut();
        state.record_delete(program);
        state.programs.remove(&program);
        state.uniforms.retain(|(p, _), _| *p != program);
        if state.program == program {
            state.program = 0;
        }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        let mut state = self.state.borrow_mut();
        state.uniform_lookups += 1;

        let lookup = state
            .programs
            .get(&program)
            .filter(|p| p.linked)
            .map(|p| p.uniforms.iter().position(|u| u == name));

        match lookup {
            Some(location) => location.map_or(-1, |l| l as GLint),
            None => {
                state.raise(gl::INVALID_OPERATION);
                -1
            }
        }
    }

    fn uniform_1i(&self, location: GLint, value: i32) {
        self.state
            .borrow_mut()
            .set_uniform(location, UniformValue::Int(value));
    }

    fn uniform_1f(&self, location: GLint, value: f32) {
        self.state
            .borrow_mut()
            .set_uniform(location, UniformValue::Float(value));
    }

    fn uniform_4f(&self, location: GLint, value: [f32; 4]) {
        self.state
            .borrow_mut()
            .set_uniform(location, UniformValue::Vec4(value));
    }

    fn uniform_matrix_4fv(&self, location: GLint, value: &[f32; 16]) {
        self.state
            .borrow_mut()
            .set_uniform(location, UniformValue::Mat4(*value));
    }

    fn gen_texture(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        if id != 0 {
            state.textures.insert(id, MockTexture::default());
        }
        id
    }

    fn delete_texture(&self, texture: GLuint) {
        if texture == 0 {
            return;
        }

        let mut state = self.state.borrow_mut();
        state.record_delete(texture);
        state.textures.remove(&texture);
        state.texture_units.retain(|_, t| *t != texture);
    }

    fn active_texture(&self, unit: GLuint) {
        let mut state = self.state.borrow_mut();
        // GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS is at least 48 in 3.3
        if unit >= 48 {
            return state.raise(gl::INVALID_ENUM);
        }
        state.active_texture = unit;
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        let mut state = self.state.borrow_mut();
        if target != gl::TEXTURE_2D {
            return state.raise(gl::INVALID_ENUM);
        }
        if texture != 0 && !state.textures.contains_key(&texture) {
            return state.raise(gl::INVALID_OPERATION);
        }

        let unit = state.active_texture;
        if texture == 0 {
            state.texture_units.remove(&unit);
        } else {
            state.texture_units.insert(unit, texture);
        }
    }

    fn tex_parameter_i(&self, target: GLenum, name: GLenum, param: GLint) {
        let mut state = self.state.borrow_mut();
        if target != gl::TEXTURE_2D {
            return state.raise(gl::INVALID_ENUM);
        }

        let bound = state.bound_texture();
        match state.textures.get_mut(&bound) {
            Some(t) => {
                t.params.insert(name, param);
            }
            None => state.raise(gl::INVALID_OPERATION),
        }
    }

    fn tex_image_2d(&self, target: GLenum, width: GLsizei, height: GLsizei, pixels: Option<&[u8]>) {
        let mut state = self.state.borrow_mut();
        if target != gl::TEXTURE_2D {
            return state.raise(gl::INVALID_ENUM);
        }
        if width < 0 || height < 0 {
            return state.raise(gl::INVALID_VALUE);
        }

        let bound = state.bound_texture();
        match state.textures.get_mut(&bound) {
            Some(t) => {
                t.width = width;
                t.height = height;
                t.uploaded = pixels.map(|p| p.len());
            }
            None => state.raise(gl::INVALID_OPERATION),
        }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear(&self, mask: GLbitfield) {
        self.state.borrow_mut().clears.push(mask);
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        let mut state = self.state.borrow_mut();
        if width < 0 || height < 0 {
            return state.raise(gl::INVALID_VALUE);
        }
        state.viewport = (x, y, width, height);
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum) {
        let mut state = self.state.borrow_mut();
        if count < 0 {
            return state.raise(gl::INVALID_VALUE);
        }
        if state.vertex_array == 0 || state.element_array_buffer == 0 || state.program == 0 {
            return state.raise(gl::INVALID_OPERATION);
        }

        let draw = DrawCall {
            mode,
            count,
            kind,
            vertex_array: state.vertex_array,
            element_buffer: state.element_array_buffer,
            program: state.program,
        };
        state.draws.push(draw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_declarations() {
        let src = "#version 330 core\nuniform vec4 u_Color;\n  uniform mat4 u_MVP;\nuniform float u_Values[4];\nin vec4 position;\n";

        let names: Vec<_> = declared_uniforms(src).collect();

        assert_eq!(names, ["u_Color", "u_MVP", "u_Values"]);
    }

    #[test]
    fn deleting_bound_buffer_clears_slot() {
        let gl = MockGl::new();
        let id = gl.gen_buffer();
        gl.bind_buffer(gl::ARRAY_BUFFER, id);

        gl.delete_buffer(id);

        assert_eq!(gl.state().array_buffer, 0);
        assert_eq!(gl.deletions(id), 1);
    }

    #[test]
    fn binding_deleted_object_raises() {
        let gl = MockGl::new();
        let id = gl.gen_vertex_array();
        gl.delete_vertex_array(id);

        gl.bind_vertex_array(id);

        assert_eq!(gl.get_error(), gl::INVALID_OPERATION);
        assert_eq!(gl.state().vertex_array, 0);
    }
}

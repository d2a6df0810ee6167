use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cgmath::Matrix4;
use gl::types::{GLenum, GLint, GLuint};
use log::{debug, error};
use thiserror::Error;

use crate::driver::{Gl, GlRef};
use crate::gl_call;
use crate::source::ShaderProgramSource;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Could not read shader source {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Driver could not allocate a program object")]
    Allocation,
}

fn stage_name(kind: GLenum) -> &'static str {
    if kind == gl::VERTEX_SHADER {
        "vertex"
    } else {
        "fragment"
    }
}

/// Compiles one stage. A failed stage is logged, deleted and reported as `0`.
fn compile_shader(gl: &dyn Gl, kind: GLenum, source: &str) -> GLuint {
    let id = gl_call!(gl, create_shader(kind));
    if id == 0 {
        error!("Failed to create {} shader", stage_name(kind));
        return 0;
    }

    gl_call!(gl, shader_source(id, source));
    gl_call!(gl, compile_shader(id));

    if !gl_call!(gl, compile_status(id)) {
        let log = gl_call!(gl, shader_info_log(id));
        error!("Failed to compile {} shader!\n{log}", stage_name(kind));

        gl_call!(gl, delete_shader(id));
        return 0;
    }

    id
}

/// Linked vertex + fragment program.
///
/// Uniform locations are resolved on first use and cached by name, unknown
/// names included; setting an unknown uniform does nothing.
pub struct ShaderProgram {
    gl: GlRef,
    id: GLuint,
    uniform_cache: RefCell<HashMap<String, GLint>>,
}

impl ShaderProgram {
    pub fn from_file(gl: &GlRef, path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = ShaderProgramSource::parse_file(path)?;
        debug!("Parsed shader {path:?}");

        Self::from_source(gl, &source)
    }

    /// Builds the program even when a stage fails to compile; the driver then
    /// reports the problem again while linking.
    pub fn from_source(gl: &GlRef, source: &ShaderProgramSource) -> Result<Self, ShaderError> {
        let gl = Rc::clone(gl);

        let id = gl_call!(gl, create_program());
        if id == 0 {
            return Err(ShaderError::Allocation);
        }

        let vs = compile_shader(&*gl, gl::VERTEX_SHADER, &source.vertex);
        let fs = compile_shader(&*gl, gl::FRAGMENT_SHADER, &source.fragment);

        gl_call!(gl, attach_shader(id, vs));
        gl_call!(gl, attach_shader(id, fs));
        gl_call!(gl, link_program(id));
        gl_call!(gl, validate_program(id));

        if !gl_call!(gl, link_status(id)) {
            let log = gl_call!(gl, program_info_log(id));
            error!("Failed to link shader program!\n{log}");
        }

        for stage in [vs, fs] {
            if stage != 0 {
                gl_call!(gl, detach_shader(id, stage));
                gl_call!(gl, delete_shader(stage));
            }
        }

        Ok(Self {
            gl,
            id,
            uniform_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn bind(&self) {
        gl_call!(self.gl, use_program(self.id));
    }

    pub fn unbind(&self) {
        gl_call!(self.gl, use_program(0));
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    /// Location of `name`, `-1` when the program has no such uniform.
    pub fn uniform_location(&self, name: &str) -> GLint {
        if let Some(location) = self.uniform_cache.borrow().get(name) {
            return *location;
        }

        let location = gl_call!(self.gl, uniform_location(self.id, name));
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_owned(), location);

        location
    }

    // setters expect the program to be bound

    pub fn set_uniform_1i(&self, name: &str, value: i32) {
        let location = self.uniform_location(name);
        gl_call!(self.gl, uniform_1i(location, value));
    }

    pub fn set_uniform_1f(&self, name: &str, value: f32) {
        let location = self.uniform_location(name);
        gl_call!(self.gl, uniform_1f(location, value));
    }

    pub fn set_uniform_4f(&self, name: &str, v0: f32, v1: f32, v2: f32, v3: f32) {
        let location = self.uniform_location(name);
        gl_call!(self.gl, uniform_4f(location, [v0, v1, v2, v3]));
    }

    pub fn set_uniform_mat4f(&self, name: &str, matrix: &Matrix4<f32>) {
        let location = self.uniform_location(name);
        let columns: &[f32; 16] = matrix.as_ref();
        gl_call!(self.gl, uniform_matrix_4fv(location, columns));
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        gl_call!(self.gl, delete_program(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::tests::capture_logs;
    use crate::mock::{MockGl, UniformValue};

    use cgmath::{Matrix4, Vector3};

    const SOURCE: &str = "\
#shader vertex
#version 330 core
layout(location = 0) in vec4 position;
uniform mat4 u_MVP;
void main() { gl_Position = u_MVP * position; }
#shader fragment
#version 330 core
layout(location = 0) out vec4 color;
uniform vec4 u_Color;
void main() { color = u_Color; }
";

    fn setup() -> (Rc<MockGl>, ShaderProgram) {
        let mock = Rc::new(MockGl::new());
        let gl: GlRef = mock.clone();
        let program = ShaderProgram::from_source(&gl, &SOURCE.parse().unwrap()).unwrap();
        (mock, program)
    }

    #[test]
    fn links_and_releases_stages() {
        let (mock, program) = setup();

        let state = mock.state();
        let linked = &state.programs[&program.id()];
        assert!(linked.linked);
        assert!(linked.validated);
        assert!(linked.attached.is_empty());
        assert!(state.shaders.is_empty());
        assert!(state.errors.is_empty());
    }

    #[test]
    fn uniform_location_is_cached() {
        let (mock, program) = setup();
        program.bind();

        program.set_uniform_4f("u_Color", 0.2, 0.3, 0.8, 1.0);
        program.set_uniform_4f("u_Color", 0.4, 0.3, 0.8, 1.0);

        assert_eq!(mock.state().uniform_lookups, 1);
        assert_eq!(
            mock.uniform(program.id(), "u_Color"),
            Some(UniformValue::Vec4([0.4, 0.3, 0.8, 1.0]))
        );
    }

    #[test]
    fn missing_uniform_is_ignored() {
        let (mock, program) = setup();
        program.bind();

        program.set_uniform_1f("u_Missing", 1.0);
        program.set_uniform_1i("u_Missing", 3);

        assert_eq!(program.uniform_location("u_Missing"), -1);
        assert_eq!(mock.state().uniform_lookups, 1);
        assert!(mock.state().errors.is_empty());
    }

    #[test]
    fn matrix_uniform_is_column_major() {
        let (mock, program) = setup();
        program.bind();
        let matrix = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));

        program.set_uniform_mat4f("u_MVP", &matrix);

        let Some(UniformValue::Mat4(columns)) = mock.uniform(program.id(), "u_MVP") else {
            panic!("u_MVP not set");
        };
        assert_eq!(&columns[12..15], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn failed_stage_still_links() {
        let mock = Rc::new(MockGl::new());
        let gl: GlRef = mock.clone();
        let source = ShaderProgramSource {
            vertex: "void main() {}\n".to_owned(),
            fragment: "syntax error\n".to_owned(),
        };

        let program = ShaderProgram::from_source(&gl, &source).unwrap();

        let state = mock.state();
        let failed = &state.programs[&program.id()];
        assert!(!failed.linked);
        assert!(!failed.info_log.is_empty());
        // the failed stage and the linked one are both gone
        assert!(state.shaders.is_empty());
        assert_eq!(state.deletions.values().sum::<usize>(), 2);
    }

    #[test]
    fn drop_releases_bound_program() {
        let (mock, program) = setup();
        let id = program.id();
        program.bind();

        drop(program);

        assert_eq!(mock.deletions(id), 1);
        assert_eq!(mock.state().program, 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mock = Rc::new(MockGl::new());
        let gl: GlRef = mock.clone();

        let res = ShaderProgram::from_file(&gl, "nope/Basic.shader");

        assert!(matches!(res, Err(ShaderError::Io(..))));
        assert!(mock.state().programs.is_empty());
    }

    #[test]
    fn failed_allocation_is_an_error() {
        let mock = Rc::new(MockGl::new());
        let gl: GlRef = mock.clone();
        mock.fail_allocations(true);

        let res = ShaderProgram::from_source(&gl, &SOURCE.parse().unwrap());

        assert!(matches!(res, Err(ShaderError::Allocation)));
        let state = mock.state();
        assert!(state.programs.is_empty());
        assert!(state.shaders.is_empty());
    }

    #[test]
    fn compile_failure_names_the_stage() {
        let mock = Rc::new(MockGl::new());
        let gl: GlRef = mock.clone();
        let source = ShaderProgramSource {
            vertex: "void main() {}\n".to_owned(),
            fragment: "syntax error\n".to_owned(),
        };

        let logs = capture_logs(|| {
            ShaderProgram::from_source(&gl, &source).unwrap();
        });

        assert!(logs
            .iter()
            .any(|l| l.starts_with("ERROR Failed to compile fragment shader!")));
        assert!(!logs.iter().any(|l| l.contains("vertex shader")));
        assert!(logs.iter().any(|l| l.starts_with("ERROR Failed to link")));
    }
}

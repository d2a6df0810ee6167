use std::rc::Rc;

use gl_wrapper::buffer::{IndexBuffer, VertexBuffer};
use gl_wrapper::layout::VertexBufferLayout;
use gl_wrapper::mock::{DrawCall, MockGl, UniformValue};
use gl_wrapper::program::ShaderProgram;
use gl_wrapper::renderer::Renderer;
use gl_wrapper::source::ShaderProgramSource;
use gl_wrapper::vertex_array::VertexArray;
use gl_wrapper::{GlRef, QUAD_INDICES, QUAD_VERTICES};

const BASIC_SHADER: &str = include_str!("../../interactive/res/shaders/Basic.shader");

#[test]
fn quad_is_one_indexed_draw() {
    let mock = Rc::new(MockGl::new());
    let gl: GlRef = mock.clone();

    let va = VertexArray::new(&gl).unwrap();
    let vb = VertexBuffer::new(&gl, &QUAD_VERTICES).unwrap();
    let mut layout = VertexBufferLayout::new();
    layout.push::<f32>(2).unwrap().push::<f32>(2).unwrap();
    va.add_buffer(&vb, &layout);
    let ib = IndexBuffer::new(&gl, &QUAD_INDICES).unwrap();

    let source: ShaderProgramSource = BASIC_SHADER.parse().unwrap();
    let program = ShaderProgram::from_source(&gl, &source).unwrap();

    va.unbind();
    vb.unbind();
    ib.unbind();
    program.unbind();

    let renderer = Renderer::new(&gl);
    renderer.clear();
    program.bind();
    program.set_uniform_4f("u_Color", 0.2, 0.3, 0.8, 1.0);
    renderer.draw(&va, &ib, &program);

    let state = mock.state();
    assert!(state.errors.is_empty());
    assert_eq!(
        state.draws,
        [DrawCall {
            mode: gl::TRIANGLES,
            count: 6,
            kind: gl::UNSIGNED_INT,
            vertex_array: va.id(),
            element_buffer: ib.id(),
            program: program.id(),
        }]
    );
    assert_eq!(state.attributes.len(), 2);
    assert_eq!(state.attributes[1].offset, 8);
    assert_eq!(state.attributes[1].stride, 16);
    drop(state);

    assert_eq!(
        mock.uniform(program.id(), "u_Color"),
        Some(UniformValue::Vec4([0.2, 0.3, 0.8, 1.0]))
    );
}

#[test]
fn every_handle_is_released_once() {
    let mock = Rc::new(MockGl::new());
    let gl: GlRef = mock.clone();

    let ids = {
        let va = VertexArray::new(&gl).unwrap();
        let vb = VertexBuffer::new(&gl, &QUAD_VERTICES).unwrap();
        let ib = IndexBuffer::new(&gl, &QUAD_INDICES).unwrap();
        let program =
            ShaderProgram::from_source(&gl, &BASIC_SHADER.parse().unwrap()).unwrap();

        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).unwrap().push::<f32>(2).unwrap();
        va.add_buffer(&vb, &layout);
        Renderer::new(&gl).draw(&va, &ib, &program);

        [va.id(), vb.id(), ib.id(), program.id()]
    };

    for id in ids {
        assert_eq!(mock.deletions(id), 1, "handle {id}");
    }

    let state = mock.state();
    assert_eq!(state.vertex_array, 0);
    assert_eq!(state.array_buffer, 0);
    assert_eq!(state.element_array_buffer, 0);
    assert_eq!(state.program, 0);
}

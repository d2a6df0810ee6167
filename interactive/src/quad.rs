use std::path::Path;

use cgmath::ortho;

use gl_wrapper::buffer::{IndexBuffer, VertexBuffer};
use gl_wrapper::layout::VertexBufferLayout;
use gl_wrapper::program::ShaderProgram;
use gl_wrapper::renderer::Renderer;
use gl_wrapper::texture::Texture;
use gl_wrapper::vertex_array::VertexArray;
use gl_wrapper::{GlRef, QUAD_INDICES, QUAD_VERTICES};

use crate::app::AppError;

const TEXTURE_SLOT: u32 = 0;

/// Red channel bouncing between 0 and 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCycle {
    pub r: f32,
    increment: f32,
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self {
            r: 0.0,
            increment: 0.05,
        }
    }
}

impl ColorCycle {
    pub fn step(&mut self) -> f32 {
        if self.r > 1.0 {
            self.increment = -0.05;
        }
        if self.r < 0.0 {
            self.increment = 0.05;
        }

        self.r += self.increment;
        self.r
    }
}

/// GPU objects of the demo quad.
pub struct QuadScene {
    // field order is drop order
    texture: Option<Texture>,
    program: ShaderProgram,
    index_buffer: IndexBuffer,
    vertex_array: VertexArray,
    // read through the vertex array
    _vertex_buffer: VertexBuffer,
    color: ColorCycle,
}

impl QuadScene {
    pub fn new(
        gl: &GlRef,
        shader: impl AsRef<Path>,
        texture: Option<&Path>,
        aspect: f32,
    ) -> Result<Self, AppError> {
        let vertex_array = VertexArray::new(gl)?;
        let vertex_buffer = VertexBuffer::new(gl, &QUAD_VERTICES)?;

        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2)?.push::<f32>(2)?;
        vertex_array.add_buffer(&vertex_buffer, &layout);

        let index_buffer = IndexBuffer::new(gl, &QUAD_INDICES)?;

        let program = ShaderProgram::from_file(gl, shader)?;
        program.bind();

        let projection = ortho(-aspect, aspect, -1.0, 1.0, -1.0, 1.0);
        program.set_uniform_mat4f("u_MVP", &projection);
        program.set_uniform_4f("u_Color", 0.2, 0.3, 0.8, 1.0);

        let texture = texture.map(|path| Texture::new(gl, path)).transpose()?;
        if let Some(texture) = &texture {
            texture.bind(TEXTURE_SLOT);
            program.set_uniform_1i("u_Texture", TEXTURE_SLOT as i32);
        }
        program.set_uniform_1i("u_HasTexture", texture.is_some() as i32);

        vertex_array.unbind();
        vertex_buffer.unbind();
        index_buffer.unbind();
        program.unbind();

        Ok(Self {
            texture,
            program,
            index_buffer,
            vertex_array,
            _vertex_buffer: vertex_buffer,
            color: ColorCycle::default(),
        })
    }

    pub fn draw(&mut self, renderer: &Renderer) {
        renderer.clear();

        if let Some(texture) = &self.texture {
            texture.bind(TEXTURE_SLOT);
        }

        self.program.bind();
        self.program.set_uniform_4f("u_Color", self.color.r, 0.3, 0.8, 1.0);
        renderer.draw(&self.vertex_array, &self.index_buffer, &self.program);

        self.color.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bounces_between_bounds() {
        let mut cycle = ColorCycle::default();

        let values: Vec<f32> = (0..60).map(|_| cycle.step()).collect();

        assert!(values.iter().all(|r| (-0.06..=1.06).contains(r)));
        let peak = values
            .iter()
            .position(|r| *r > 1.0)
            .expect("reaches the top");
        assert!(values[peak + 1] < values[peak]);
        assert!(values.iter().skip(peak).any(|r| *r < 0.0));
    }

    #[test]
    fn first_steps_go_up() {
        let mut cycle = ColorCycle::default();

        assert!((cycle.step() - 0.05).abs() < 1e-6);
        assert!((cycle.step() - 0.10).abs() < 1e-6);
    }
}

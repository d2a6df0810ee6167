use std::path::{Path, PathBuf};
use std::rc::Rc;

use gl::types::{GLint, GLsizei, GLuint};
use log::{debug, warn};
use thiserror::Error;

use crate::driver::GlRef;
use crate::gl_call;
use crate::image::{self, ImageError};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("Driver could not allocate a texture object")]
    Allocation,
}

/// RGBA8 2D texture loaded from an image file.
pub struct Texture {
    gl: GlRef,
    id: GLuint,
    path: PathBuf,
    width: u32,
    height: u32,
}

impl Texture {
    /// Loads `path` flipped vertically so that texture coordinate `(0, 0)` is
    /// the bottom left corner of the image.
    ///
    /// A file that cannot be opened is an error. A file that cannot be decoded
    /// is only logged: the texture is then created without contents.
    pub fn new(gl: &GlRef, path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let gl = Rc::clone(gl);

        let image = match image::load_rgba8(path, true) {
            Ok(image) => Some(image),
            Err(e @ ImageError::Open(..)) => return Err(e.into()),
            Err(e) => {
                warn!("Texture {path:?} uploaded without data: {e}");
                None
            }
        };

        let id = gl_call!(gl, gen_texture());
        if id == 0 {
            return Err(TextureError::Allocation);
        }

        gl_call!(gl, bind_texture(gl::TEXTURE_2D, id));

        gl_call!(gl, tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint));
        gl_call!(gl, tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint));
        gl_call!(gl, tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint));
        gl_call!(gl, tex_parameter_i(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint));

        let (width, height) = image.as_ref().map_or((0, 0), |i| (i.width, i.height));
        let pixels = image.as_ref().map(|i| i.pixels.as_slice());

        gl_call!(
            gl,
            tex_image_2d(gl::TEXTURE_2D, width as GLsizei, height as GLsizei, pixels)
        );
        gl_call!(gl, bind_texture(gl::TEXTURE_2D, 0));

        // pixels are owned by the driver from here on
        drop(image);

        debug!("Texture {id} from {path:?}: {width}x{height}");

        Ok(Self {
            gl,
            id,
            path: path.to_owned(),
            width,
            height,
        })
    }

    pub fn bind(&self, slot: u32) {
        gl_call!(self.gl, active_texture(slot));
        gl_call!(self.gl, bind_texture(gl::TEXTURE_2D, self.id));
    }

    pub fn unbind(&self) {
        gl_call!(self.gl, bind_texture(gl::TEXTURE_2D, 0));
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        gl_call!(self.gl, delete_texture(self.id));
    }
}

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use png::{ColorType, Transformations};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Could not open image {0:?}: {1}")]
    Open(PathBuf, #[source] std::io::Error),
    #[error("Could not decode image: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("Unsupported color type {0:?}")]
    Unsupported(ColorType),
}

/// Decoded image with 4 channels of 8 bits each.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Channel count of the source file.
    pub channels: u8,
    pub pixels: Vec<u8>,
}

/// Decodes a PNG file into RGBA8.
///
/// With `flip_vertically` the first row of `pixels` is the bottom row of the
/// image, which is where OpenGL starts reading texture data.
pub fn load_rgba8(path: impl AsRef<Path>, flip_vertically: bool) -> Result<Image, ImageError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ImageError::Open(path.to_owned(), e))?;

    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

    let mut reader = decoder.read_info()?;
    let channels = reader.info().color_type.samples() as u8;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    let pixels = to_rgba8(&buf, info.color_type)?;

    let pixels = if flip_vertically {
        flip_rows(&pixels, info.width as usize * 4)
    } else {
        pixels
    };

    Ok(Image {
        width: info.width,
        height: info.height,
        channels,
        pixels,
    })
}

fn to_rgba8(data: &[u8], color_type: ColorType) -> Result<Vec<u8>, ImageError> {
    let pixels = match color_type {
        ColorType::Rgba => data.to_vec(),
        ColorType::Rgb => data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        ColorType::Grayscale => data.iter().flat_map(|g| [*g, *g, *g, 255]).collect(),
        // EXPAND turns palettes into RGB(A) before they get here
        ColorType::Indexed => return Err(ImageError::Unsupported(color_type)),
    };

    Ok(pixels)
}

fn flip_rows(pixels: &[u8], row_len: usize) -> Vec<u8> {
    if row_len == 0 {
        return pixels.to_vec();
    }

    pixels
        .chunks_exact(row_len)
        .rev()
        .flatten()
        .copied()
        .collect()
}

use std::path::PathBuf;

use clap::Parser;

const DEFAULT_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/res/shaders/Basic.shader");

#[derive(Debug, Parser)]
pub struct Args {
    /// Window width in pixels
    #[arg(long, default_value_t = 640)]
    pub width: u32,
    /// Window height in pixels
    #[arg(long, default_value_t = 480)]
    pub height: u32,
    /// Combined vertex + fragment shader file
    #[arg(short, long, default_value = DEFAULT_SHADER)]
    pub shader: PathBuf,
    /// PNG image drawn onto the quad
    #[arg(short, long)]
    pub texture: Option<PathBuf>,
    /// Present frames as fast as possible instead of waiting for vertical sync
    #[arg(long)]
    pub no_vsync: bool,
}

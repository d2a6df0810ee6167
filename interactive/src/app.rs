use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};

use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use std::ffi::CString;
use std::num::NonZeroU32;
use std::rc::Rc;

use log::{info, warn};

use thiserror::Error;

use winit::dpi::{PhysicalSize, Size};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use gl_wrapper::buffer::BufferError;
use gl_wrapper::layout::LayoutError;
use gl_wrapper::native::NativeGl;
use gl_wrapper::program::ShaderError;
use gl_wrapper::renderer::Renderer;
use gl_wrapper::texture::TextureError;
use gl_wrapper::GlRef;

use crate::args::Args;
use crate::quad::QuadScene;

pub struct App {
    event_loop: EventLoop<()>,
    gl_context: PossiblyCurrentContext,
    gl_window: GlWindow,
    renderer: Renderer,
    scene: QuadScene,
}

impl App {
    pub fn new(args: &Args) -> Result<Self, AppError> {
        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(args.width, args.height)))
            .with_resizable(false)
            .with_title("Hello quad");
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let template = ConfigTemplateBuilder::new();

        // glutin fails `build` itself when no config matches, and the picker
        // has to return one, so the list is never empty here
        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .reduce(|best, c| if c.num_samples() > best.num_samples() { c } else { best })
                    .expect("display offered no config")
            })
            .map_err(|e| AppError::Window(e.to_string()))?;
        let window = window.ok_or_else(|| AppError::Window("no window created".to_owned()))?;

        let handle = Some(window.raw_window_handle());
        let gl_display = gl_config.display();

        let context_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(handle);

        let gl_window = GlWindow::new(window, &gl_config)?;

        let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attr)? }
            .make_current(&gl_window.surface)?;

        let interval = if args.no_vsync {
            SwapInterval::DontWait
        } else {
            SwapInterval::Wait(NonZeroU32::MIN)
        };
        if let Err(e) = gl_window.surface.set_swap_interval(&gl_context, interval) {
            warn!("Could not set swap interval: {e}");
        }

        // the context stays current on this thread until `App` is dropped
        let gl: GlRef = Rc::new(unsafe {
            NativeGl::load_with(|s| match CString::new(s) {
                Ok(name) => gl_display.get_proc_address(name.as_c_str()).cast(),
                Err(_) => std::ptr::null(),
            })
        });

        let renderer = Renderer::new(&gl);
        info!("OpenGL {}", renderer.version());

        let aspect = args.width as f32 / args.height.max(1) as f32;
        let scene = QuadScene::new(&gl, &args.shader, args.texture.as_deref(), aspect)?;

        Ok(Self {
            event_loop,
            gl_context,
            gl_window,
            renderer,
            scene,
        })
    }

    pub fn run(self) -> ! {
        let Self {
            event_loop,
            gl_context,
            gl_window,
            renderer,
            scene,
        } = self;

        // GL objects have to go before the context does
        let mut scene = Some(scene);

        event_loop.run(move |event, _window_target, control_flow| {
            *control_flow = ControlFlow::Poll;
            match event {
                Event::MainEventsCleared => gl_window.window.request_redraw(),
                Event::RedrawRequested(_) => {
                    if let Some(scene) = &mut scene {
                        scene.draw(&renderer);
                    }

                    if let Err(e) = gl_window.surface.swap_buffers(&gl_context) {
                        warn!("Could not swap buffers: {e}");
                    }
                }
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    info!("Window closed");
                    control_flow.set_exit();
                }
                Event::LoopDestroyed => {
                    scene.take();
                }
                _ => (),
            }
        })
    }
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
}

impl GlWindow {
    pub fn new(window: Window, config: &Config) -> Result<Self, AppError> {
        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.raw_window_handle();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(width).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(height).unwrap_or(NonZeroU32::MIN),
        );

        let surface = unsafe { config.display().create_window_surface(config, &attrs)? };

        Ok(Self { window, surface })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not create window: {0}")]
    Window(String),
    #[error("OpenGL context error: {0}")]
    Context(#[from] glutin::error::Error),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

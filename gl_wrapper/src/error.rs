use gl::types::GLenum;
use log::error;

use crate::driver::Gl;

// a lost context may keep reporting errors forever
const MAX_DRAINED: usize = 64;

/// Wraps a driver call with error checking.
///
/// Stale error codes are drained before the call; codes raised by the call
/// are logged together with the call text and its location.
///
/// `gl_call!(gl, method(args))` evaluates to the method's return value,
/// `gl_call!(@clean gl, method(args))` to `(value, clean)`.
#[macro_export]
macro_rules! gl_call {
    (@clean $gl:expr, $method:ident ( $($arg:expr),* $(,)? )) => {{
        let gl: &dyn $crate::driver::Gl = &*$gl;
        $crate::error::clear_errors(gl);
        let value = gl.$method($($arg),*);
        let clean = $crate::error::log_call(
            gl,
            stringify!($method($($arg),*)),
            file!(),
            line!(),
        );
        (value, clean)
    }};
    ($gl:expr, $method:ident ( $($arg:expr),* $(,)? )) => {
        $crate::gl_call!(@clean $gl, $method($($arg),*)).0
    };
}

/// Drains the driver's error queue.
pub fn clear_errors(gl: &dyn Gl) {
    for _ in 0..MAX_DRAINED {
        if gl.get_error() == gl::NO_ERROR {
            break;
        }
    }
}

/// Logs every pending error code. Returns `true` if there was none.
pub fn log_call(gl: &dyn Gl, call: &str, file: &str, line: u32) -> bool {
    let mut clean = true;

    for _ in 0..MAX_DRAINED {
        let code = gl.get_error();
        if code == gl::NO_ERROR {
            break;
        }

        error!(
            "[OpenGL Error] ({code:#06x} {}) {call} {file}:{line}",
            error_name(code)
        );
        clean = false;
    }

    clean
}

pub fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown",
    }
}

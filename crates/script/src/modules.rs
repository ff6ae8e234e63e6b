use rhai::{Array, Dynamic, EvalAltResult, FLOAT, INT, ImmutableString, Module};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use woodgas_common::{FrameClock, FrameTime};
use woodgas_input::Key;
use woodgas_render::{SharedRenderer, Transform3D, orthographic};

pub const LOG_DEBUG: INT = 0;
pub const LOG_INFO: INT = 1;
pub const LOG_WARN: INT = 2;
pub const LOG_ERROR: INT = 3;

pub(crate) type RhaiResult<T> = Result<T, Box<EvalAltResult>>;

/// State reachable from native functions.
pub(crate) struct Shared {
    pub(crate) renderer: SharedRenderer,
    pub(crate) log_level: Cell<INT>,
    pub(crate) time: Cell<FrameTime>,
    clock: RefCell<FrameClock>,
}

impl Shared {
    pub(crate) fn new(renderer: SharedRenderer) -> Self {
        Self {
            renderer,
            log_level: Cell::new(LOG_DEBUG),
            time: Cell::new(FrameTime::default()),
            clock: RefCell::new(FrameClock::new()),
        }
    }

    /// Emit `value` at `level` unless it is below the script log level.
    /// Returns the message that was emitted.
    pub(crate) fn log(&self, level: INT, value: &Dynamic) -> Option<String> {
        if level < self.log_level.get() {
            return None;
        }
        let message = message(value);
        match level {
            LOG_DEBUG => tracing::debug!(target: "script", "{message}"),
            LOG_INFO => tracing::info!(target: "script", "{message}"),
            LOG_WARN => tracing::warn!(target: "script", "{message}"),
            l if l >= LOG_ERROR => tracing::error!(target: "script", "{message}"),
            _ => tracing::trace!(target: "script", "{message}"),
        }
        Some(message)
    }

    /// Frame boundary inside a script-driven loop.
    fn frame_complete(&self) {
        let mut clock = self.clock.borrow_mut();
        let frame = clock.frame_complete();
        self.time.set(FrameTime {
            delta: frame.as_secs_f64(),
            elapsed: clock.current(),
        });
    }
}

/// An array logs its items joined by spaces.
fn message(value: &Dynamic) -> String {
    match value.clone().try_cast::<Array>() {
        Some(items) => items.iter().map(Dynamic::to_string).collect::<Vec<_>>().join(" "),
        None => value.to_string(),
    }
}

/// Scripts pass whole numbers as INT; every render argument is a float.
fn number(value: &Dynamic, arg: &str) -> RhaiResult<f32> {
    if let Ok(f) = value.as_float() {
        return Ok(f as f32);
    }
    value
        .as_int()
        .map(|i| i as f32)
        .map_err(|_| format!("{arg} must be a number, got {}", value.type_name()).into())
}

pub(crate) fn render_module(shared: &Rc<Shared>) -> Module {
    let mut module = Module::new();

    let s = shared.clone();
    module.set_native_fn(
        "upload_orthographic",
        move |l: Dynamic, r: Dynamic, b: Dynamic, t: Dynamic, n: Dynamic, f: Dynamic| -> RhaiResult<()> {
            let projection = orthographic(
                number(&l, "left")?,
                number(&r, "right")?,
                number(&b, "bottom")?,
                number(&t, "top")?,
                number(&n, "near")?,
                number(&f, "far")?,
            )
            .map_err(|e| e.to_string())?;
            s.renderer.borrow_mut().upload_orthographic(projection);
            Ok(())
        },
    );

    let s = shared.clone();
    module.set_native_fn("is_window_open", move || -> RhaiResult<bool> {
        Ok(s.renderer.borrow().is_window_open())
    });

    let s = shared.clone();
    module.set_native_fn("poll_inputs", move || -> RhaiResult<()> {
        s.renderer.borrow_mut().poll_inputs();
        Ok(())
    });

    let s = shared.clone();
    module.set_native_fn("clear", move || -> RhaiResult<()> {
        s.renderer.borrow_mut().clear();
        Ok(())
    });

    let s = shared.clone();
    module.set_native_fn(
        "upload_transform",
        move |x: Dynamic,
              y: Dynamic,
              z: Dynamic,
              rx: Dynamic,
              ry: Dynamic,
              rz: Dynamic,
              sx: Dynamic,
              sy: Dynamic,
              sz: Dynamic|
              -> RhaiResult<()> {
            let model = Transform3D::new()
                .translate(number(&x, "x")?, number(&y, "y")?, number(&z, "z")?)
                .rotate_x(number(&rx, "rotate_x")?)
                .rotate_y(number(&ry, "rotate_y")?)
                .rotate_z(number(&rz, "rotate_z")?)
                .scale(number(&sx, "scale_x")?, number(&sy, "scale_y")?, number(&sz, "scale_z")?);
            s.renderer.borrow_mut().upload_transform(model.matrix());
            Ok(())
        },
    );

    let s = shared.clone();
    module.set_native_fn("draw_quad", move || -> RhaiResult<()> {
        s.renderer.borrow_mut().draw_quad();
        Ok(())
    });

    let s = shared.clone();
    module.set_native_fn("swap_buffers", move || -> RhaiResult<()> {
        s.renderer.borrow_mut().swap_buffers().map_err(|e| e.to_string())?;
        s.frame_complete();
        Ok(())
    });

    let s = shared.clone();
    module.set_native_fn("is_key_down", move |name: ImmutableString| -> RhaiResult<bool> {
        let key: Key = name.parse().map_err(|e: woodgas_input::UnknownKey| e.to_string())?;
        Ok(s.renderer.borrow().input_state().is_key_down(key))
    });

    module
}

pub(crate) fn logger_module(shared: &Rc<Shared>) -> Module {
    let mut module = Module::new();
    module.set_var("DEBUG", LOG_DEBUG);
    module.set_var("INFO", LOG_INFO);
    module.set_var("WARN", LOG_WARN);
    module.set_var("ERROR", LOG_ERROR);

    for (name, level) in [
        ("debug", LOG_DEBUG),
        ("info", LOG_INFO),
        ("warn", LOG_WARN),
        ("error", LOG_ERROR),
    ] {
        let s = shared.clone();
        module.set_native_fn(name, move |value: Dynamic| -> RhaiResult<()> {
            s.log(level, &value);
            Ok(())
        });
    }

    let s = shared.clone();
    module.set_native_fn("log", move |level: INT, value: Dynamic| -> RhaiResult<()> {
        s.log(level, &value);
        Ok(())
    });

    let s = shared.clone();
    module.set_native_fn("set_log_level", move |level: INT| -> RhaiResult<()> {
        s.log_level.set(level);
        Ok(())
    });

    let s = shared.clone();
    module.set_native_fn("get_log_level", move || -> RhaiResult<INT> {
        Ok(s.log_level.get())
    });

    module
}

pub(crate) fn time_module(shared: &Rc<Shared>) -> Module {
    let mut module = Module::new();

    let s = shared.clone();
    module.set_native_fn("delta", move || -> RhaiResult<FLOAT> {
        Ok(s.time.get().delta as FLOAT)
    });

    let s = shared.clone();
    module.set_native_fn("elapsed", move || -> RhaiResult<FLOAT> {
        Ok(s.time.get().elapsed as FLOAT)
    });

    module
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_int_and_float() {
        assert_eq!(number(&Dynamic::from(2 as INT), "x").unwrap(), 2.0);
        assert_eq!(number(&Dynamic::from(0.5 as FLOAT), "x").unwrap(), 0.5);
        let err = number(&Dynamic::from("two".to_string()), "x").unwrap_err();
        assert!(err.to_string().contains("x must be a number"));
    }

    #[test]
    fn frame_complete_updates_time() {
        let shared = Shared::new(SharedRenderer::new(woodgas_render::HeadlessRenderer::new()));
        assert_eq!(shared.time.get(), FrameTime::default());
        shared.frame_complete();
        assert!(shared.time.get().elapsed >= shared.time.get().delta);
    }

    #[test]
    fn log_level_filters_messages() {
        let shared = Shared::new(SharedRenderer::new(woodgas_render::HeadlessRenderer::new()));
        let text = Dynamic::from("hello".to_string());
        assert_eq!(shared.log(LOG_DEBUG, &text).as_deref(), Some("hello"));

        shared.log_level.set(LOG_WARN);
        assert_eq!(shared.log(LOG_DEBUG, &text), None);
        assert_eq!(shared.log(LOG_INFO, &text), None);
        assert_eq!(shared.log(LOG_WARN, &text).as_deref(), Some("hello"));
        assert_eq!(shared.log(LOG_ERROR, &text).as_deref(), Some("hello"));
    }

    #[test]
    fn arrays_log_space_separated() {
        let shared = Shared::new(SharedRenderer::new(woodgas_render::HeadlessRenderer::new()));
        let items: Array = vec![
            Dynamic::from("pos".to_string()),
            Dynamic::from(3 as INT),
            Dynamic::from(0.5 as FLOAT),
        ];
        assert_eq!(shared.log(LOG_INFO, &Dynamic::from_array(items)).as_deref(), Some("pos 3 0.5"));
    }
}

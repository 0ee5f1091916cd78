//! Canvas drawing and the `requestAnimationFrame` loop.
//!
//! Each frame paints a backdrop (a translucent wash for trails while moving,
//! a hard clear once frozen), steps the controller, then draws the rocket dot
//! or the particle disks. What to draw is computed as plain values first so it
//! can be checked without a canvas.

use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

use super::{Controller, Phase, Simulation, Viewport};
use crate::config::FireworksConfig;

pub const TRAIL_FILL: &str = "rgba(248, 250, 252, 0.25)";
pub const ROCKET_COLOR: &str = "#334155";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backdrop {
    /// Translucent wash so moving dots leave fading trails.
    Trail,
    /// Full clear so the settled burst stays crisp.
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disk {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: &'static str,
}

pub fn backdrop(phase: &Phase) -> Backdrop {
    match phase {
        Phase::Frozen(_) => Backdrop::Clear,
        Phase::Ascending(_) | Phase::Exploding(_) => Backdrop::Trail,
    }
}

pub fn disks(sim: &Simulation) -> Vec<Disk> {
    match sim.phase() {
        Phase::Ascending(rocket) => vec![Disk {
            x: rocket.x,
            y: rocket.y,
            radius: sim.config().rocket_radius,
            color: ROCKET_COLOR,
        }],
        Phase::Exploding(particles) | Phase::Frozen(particles) => particles
            .iter()
            .map(|p| Disk { x: p.x, y: p.y, radius: p.radius, color: p.color })
            .collect(),
    }
}

fn paint_backdrop(ctx: &CanvasRenderingContext2d, backdrop: Backdrop, viewport: Viewport) {
    match backdrop {
        Backdrop::Clear => ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height),
        Backdrop::Trail => {
            ctx.set_fill_style(&JsValue::from_str(TRAIL_FILL));
            ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
        }
    }
}

fn paint_disks(ctx: &CanvasRenderingContext2d, disks: &[Disk]) {
    for d in disks {
        ctx.begin_path();
        ctx.arc(d.x, d.y, d.radius, 0.0, TAU).ok();
        ctx.set_fill_style(&JsValue::from_str(d.color));
        ctx.fill();
    }
}

// --- Loop driver ------------------------------------------------------------

struct LoopState {
    ctx: CanvasRenderingContext2d,
    controller: Controller,
    rng: StdRng,
}

impl LoopState {
    fn frame(&mut self) {
        let viewport = self.controller.simulation().viewport();
        paint_backdrop(&self.ctx, backdrop(self.controller.simulation().phase()), viewport);
        self.controller.tick(&mut self.rng);
        paint_disks(&self.ctx, &disks(self.controller.simulation()));
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Running animation. Stopping (explicitly or on drop) cancels the pending
/// frame and detaches the resize listener.
pub struct FireworksHandle {
    running: Rc<Cell<bool>>,
    frame_id: Rc<Cell<Option<i32>>>,
    frame: FrameCallback,
    resize: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

impl FireworksHandle {
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn stop(&mut self) {
        if !self.running.replace(false) {
            return;
        }
        if let Some(w) = window() {
            if let Some(id) = self.frame_id.take() {
                w.cancel_animation_frame(id).ok();
            }
            if let Some(resize) = &self.resize {
                w.remove_event_listener_with_callback("resize", resize.as_ref().unchecked_ref()).ok();
            }
        }
        self.resize = None;
        // Breaks the closure's reference to itself.
        self.frame.borrow_mut().take();
        log::debug!("fireworks loop stopped");
    }
}

impl Drop for FireworksHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn window_viewport(win: &web_sys::Window) -> Viewport {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(dim(win.inner_width()), dim(win.inner_height()))
}

fn fit_canvas(canvas: &HtmlCanvasElement, viewport: Viewport) {
    canvas.set_width(viewport.width as u32);
    canvas.set_height(viewport.height as u32);
}

/// Size `canvas` to the window and start animating into it.
pub fn start_fireworks(
    canvas: &HtmlCanvasElement,
    config: &FireworksConfig,
    on_complete: impl FnMut() + 'static,
) -> Result<FireworksHandle, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;

    let viewport = window_viewport(&win);
    fit_canvas(canvas, viewport);
    let sim = Simulation::new(config.clone(), viewport);
    let state = Rc::new(RefCell::new(LoopState {
        ctx,
        controller: Controller::new(sim, on_complete),
        rng: StdRng::from_entropy(),
    }));

    let resize = {
        let state = state.clone();
        let canvas = canvas.clone();
        Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            let Some(w) = window() else { return };
            let viewport = window_viewport(&w);
            fit_canvas(&canvas, viewport);
            if let Ok(mut st) = state.try_borrow_mut() {
                st.controller.resize(viewport);
            }
        }) as Box<dyn FnMut(_)>)
    };
    win.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;

    let running = Rc::new(Cell::new(true));
    let frame_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    {
        let running = running.clone();
        let frame_id = frame_id.clone();
        *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
            if !running.get() {
                return;
            }
            state.borrow_mut().frame();
            if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
                frame_id.set(w.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
            }
        }) as Box<dyn FnMut(f64)>));
    }
    if let Some(cb) = g.borrow().as_ref() {
        frame_id.set(Some(win.request_animation_frame(cb.as_ref().unchecked_ref())?));
    }
    log::debug!("fireworks started at {}x{}", viewport.width, viewport.height);

    Ok(FireworksHandle { running, frame_id, frame: g, resize: Some(resize) })
}

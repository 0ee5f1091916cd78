//! Page shell: fireworks first, then a button, then the grade card.
//!
//! The view moves Animating -> Ready -> Loading -> Result. `RevealFlow` holds
//! that machine with no browser dependency. The rest of the module builds the
//! DOM for each view and wires clicks, the text request and timers to it. State
//! lives in a thread-local like any single-threaded wasm page.

use std::cell::RefCell;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlCanvasElement, window};

use crate::config::RevealConfig;
use crate::encouragement::EncouragementProvider;
use crate::fireworks::render::{FireworksHandle, start_fireworks};
use crate::student::StudentData;

pub mod emoji;

use emoji::{EMOJI, EmojiPool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Animating,
    Ready,
    Loading,
    Result,
}

/// View state plus the comment fetched for the current reveal.
///
/// Each reveal gets a ticket. A comment or a "show result" timer carrying an
/// older ticket is ignored, so a late reply can never overwrite a newer state.
#[derive(Debug)]
pub struct RevealFlow {
    view: View,
    ticket: u64,
    comment: Option<String>,
}

impl Default for RevealFlow {
    fn default() -> Self {
        Self { view: View::Animating, ticket: 0, comment: None }
    }
}

impl RevealFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The canvas stays up while animating and while the button is offered.
    pub fn shows_fireworks(&self) -> bool {
        matches!(self.view, View::Animating | View::Ready)
    }

    pub fn animation_finished(&mut self) -> bool {
        self.advance(View::Animating, View::Ready)
    }

    /// Start a reveal, returning its ticket. Only valid from Ready.
    pub fn begin_reveal(&mut self) -> Option<u64> {
        if !self.advance(View::Ready, View::Loading) {
            return None;
        }
        self.ticket += 1;
        self.comment = None;
        Some(self.ticket)
    }

    /// Store the comment if it belongs to the reveal still loading.
    pub fn comment_arrived(&mut self, ticket: u64, text: String) -> bool {
        if self.view != View::Loading || ticket != self.ticket {
            return false;
        }
        self.comment = Some(text);
        true
    }

    pub fn show_result(&mut self, ticket: u64) -> bool {
        if ticket != self.ticket || self.comment.is_none() {
            return false;
        }
        self.advance(View::Loading, View::Result)
    }

    fn advance(&mut self, from: View, to: View) -> bool {
        if self.view != from {
            log::debug!("ignoring {from:?} -> {to:?} while {:?}", self.view);
            return false;
        }
        self.view = to;
        true
    }
}

/// CSS font size for the grade, smaller as the label gets longer.
pub fn grade_font_size(grade: &str) -> &'static str {
    match grade.chars().count() {
        0 | 1 => "10rem",
        2 => "8rem",
        _ => "6rem",
    }
}

// --- DOM shell --------------------------------------------------------------

const STYLE_ID: &str = "gr-style";
const CANVAS_ID: &str = "gr-fireworks";
const CONTENT_ID: &str = "gr-content";

const STYLES: &str = "
@keyframes grFadeInUp { from { opacity: 0; transform: translateY(20px) scale(0.95); } to { opacity: 1; transform: translateY(0) scale(1); } }
@keyframes grFloatUp { from { opacity: 1; transform: translateY(0); } to { opacity: 0; transform: translateY(-160px); } }
@keyframes grSpin { to { transform: rotate(360deg); } }
.gr-fade-in { animation: grFadeInUp 0.6s ease-out forwards; }
.gr-card { background: rgba(255,255,255,0.7); backdrop-filter: blur(12px); border: 1px solid rgba(255,255,255,0.6); box-shadow: 0 20px 50px rgba(15,23,42,0.12); padding: 2.5rem; border-radius: 1.5rem; display: flex; flex-direction: column; align-items: center; animation: grFadeInUp 0.8s ease-out; }
.gr-emoji { position: fixed; font-size: 2.25rem; pointer-events: none; z-index: 50; animation: grFloatUp 1.5s ease-out forwards; }
";

struct Shell {
    config: RevealConfig,
    student: StudentData,
    flow: RevealFlow,
    emojis: EmojiPool,
    rng: StdRng,
    doc: Document,
    canvas: HtmlCanvasElement,
    content: Element,
    fireworks: Option<FireworksHandle>,
}

thread_local! {
    static SHELL: RefCell<Option<Shell>> = const { RefCell::new(None) };
}

/// Build the page and start the fireworks.
pub fn mount(config: RevealConfig) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

    if doc.get_element_by_id(STYLE_ID).is_none() {
        let style = doc.create_element("style")?;
        style.set_id(STYLE_ID);
        style.set_text_content(Some(STYLES));
        body.append_child(&style)?;
    }
    body.set_attribute("style", "margin:0; min-height:100vh; overflow:hidden; background:#f8fafc; color:#1e293b; font-family:system-ui, 'Noto Sans TC', sans-serif;")?;

    let canvas: HtmlCanvasElement = match doc.get_element_by_id(CANVAS_ID) {
        Some(el) => el.dyn_into()?,
        None => {
            let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
            c.set_id(CANVAS_ID);
            c.set_attribute("style", "position:fixed; top:0; left:0; width:100%; height:100%; pointer-events:none; z-index:0;")?;
            body.append_child(&c)?;
            c
        }
    };
    let content = match doc.get_element_by_id(CONTENT_ID) {
        Some(el) => el,
        None => {
            let div = doc.create_element("div")?;
            div.set_id(CONTENT_ID);
            div.set_attribute("style", "position:relative; z-index:10; width:100%; max-width:28rem; margin:0 auto; padding:0 1.5rem; box-sizing:border-box; min-height:100vh; display:flex; flex-direction:column; align-items:center; justify-content:center; text-align:center;")?;
            body.append_child(&div)?;
            div
        }
    };

    let student = StudentData::from_location();
    log::info!("revealing grade {:?} for {:?}", student.grade, student.name);

    let fireworks = start_fireworks(&canvas, &config.fireworks, on_animation_complete)?;

    let shell = Shell {
        config,
        student,
        flow: RevealFlow::new(),
        emojis: EmojiPool::new(),
        rng: StdRng::from_entropy(),
        doc,
        canvas,
        content,
        fireworks: Some(fireworks),
    };
    render(&shell)?;
    SHELL.with(|s| s.replace(Some(shell)));
    Ok(())
}

fn with_shell<T>(f: impl FnOnce(&mut Shell) -> T) -> Option<T> {
    SHELL.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn on_animation_complete() {
    with_shell(|shell| {
        if shell.flow.animation_finished() {
            render(shell).ok();
        }
    });
}

fn on_reveal_click() {
    let request = with_shell(|shell| {
        let ticket = shell.flow.begin_reveal()?;
        if !shell.flow.shows_fireworks() {
            // Dropping the handle stops the loop and detaches its listener.
            shell.fireworks = None;
            shell.canvas.set_attribute("hidden", "").ok();
        }
        render(shell).ok();
        let provider = EncouragementProvider::from_config(&shell.config);
        Some((ticket, provider, shell.student.clone(), shell.config.reveal_delay_ms))
    })
    .flatten();
    let Some((ticket, mut provider, student, delay_ms)) = request else { return };

    // Not cancellable: if the reveal has moved on, the ticket check drops the reply.
    wasm_bindgen_futures::spawn_local(async move {
        let text = provider.provide(&student.name, &student.grade, &student.context).await;
        let accepted = with_shell(|shell| shell.flow.comment_arrived(ticket, text)).unwrap_or(false);
        if !accepted {
            log::debug!("discarding comment for stale reveal {ticket}");
            return;
        }
        let scheduled = set_timeout(delay_ms, move || {
            with_shell(|shell| {
                if shell.flow.show_result(ticket) {
                    render(shell).ok();
                }
            });
        });
        if let Err(err) = scheduled {
            log::error!("could not schedule result view: {err:?}");
        }
    });
}

fn on_awesome_click(evt: web_sys::MouseEvent) {
    let Some(button) = evt.current_target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };
    let rect = button.get_bounding_client_rect();
    let center_x = rect.left() + rect.width() / 2.0;
    let top_y = rect.top();

    let spawned = with_shell(|shell| {
        let batch = shell.emojis.spawn(shell.config.emoji_per_tap, center_x, top_y, &mut shell.rng);
        for token in &batch {
            if let Err(err) = append_emoji(&shell.doc, token.id, token.x, token.y) {
                log::warn!("emoji token not shown: {err:?}");
            }
        }
        (batch.iter().map(|e| e.id).collect::<Vec<_>>(), shell.config.emoji_lifetime_ms)
    });
    let Some((ids, lifetime_ms)) = spawned else { return };

    let scheduled = set_timeout(lifetime_ms, move || {
        with_shell(|shell| {
            shell.emojis.expire(&ids);
            for id in &ids {
                if let Some(el) = shell.doc.get_element_by_id(&emoji_element_id(*id)) {
                    el.remove();
                }
            }
        });
    });
    if let Err(err) = scheduled {
        log::error!("could not schedule emoji cleanup: {err:?}");
    }
}

fn emoji_element_id(id: u64) -> String {
    format!("gr-emoji-{id}")
}

fn append_emoji(doc: &Document, id: u64, x: f64, y: f64) -> Result<(), JsValue> {
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let el = doc.create_element("div")?;
    el.set_id(&emoji_element_id(id));
    el.set_class_name("gr-emoji");
    el.set_attribute("style", &format!("left:{x}px; top:{y}px;"))?;
    el.set_text_content(Some(EMOJI));
    body.append_child(&el)?;
    Ok(())
}

fn set_timeout(ms: u32, f: impl FnOnce() + 'static) -> Result<i32, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let callback = Closure::once_into_js(f);
    win.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), timeout_ms(ms))
}

/// Browser timers take an `i32`; longer delays saturate instead of wrapping negative.
fn timeout_ms(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

fn on_click(el: &Element, handler: impl FnMut(web_sys::MouseEvent) + 'static) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::MouseEvent)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn render(shell: &Shell) -> Result<(), JsValue> {
    let doc = &shell.doc;
    let content = &shell.content;
    content.set_inner_html("");
    match shell.flow.view() {
        View::Animating => {}
        View::Ready => {
            let wrap = doc.create_element("div")?;
            wrap.set_class_name("gr-fade-in");
            wrap.set_attribute("style", "display:flex; justify-content:center; margin-top:8rem;")?;
            let button = doc.create_element("button")?;
            button.set_attribute("style", "padding:1rem 3rem; font-weight:700; font-size:1.25rem; letter-spacing:0.025em; color:#fff; background:#111827; border:none; border-radius:9999px; cursor:pointer; box-shadow:0 10px 25px rgba(0,0,0,0.2);")?;
            button.set_text_content(Some("查看評語"));
            on_click(&button, |_| on_reveal_click())?;
            wrap.append_child(&button)?;
            content.append_child(&wrap)?;
        }
        View::Loading => {
            let wrap = doc.create_element("div")?;
            wrap.set_class_name("gr-fade-in");
            wrap.set_attribute("style", "display:flex; flex-direction:column; align-items:center;")?;
            let spinner = doc.create_element("div")?;
            spinner.set_attribute("style", "width:3rem; height:3rem; border:4px solid #c7d2fe; border-top-color:#4f46e5; border-radius:50%; animation:grSpin 1s linear infinite;")?;
            let label = doc.create_element("p")?;
            label.set_attribute("style", "margin-top:1.5rem; font-size:1.125rem; font-weight:500; color:#64748b;")?;
            label.set_text_content(Some("正在分析..."));
            wrap.append_child(&spinner)?;
            wrap.append_child(&label)?;
            content.append_child(&wrap)?;
        }
        View::Result => {
            let card = doc.create_element("div")?;
            card.set_class_name("gr-card");
            let grade = doc.create_element("h2")?;
            grade.set_attribute(
                "style",
                &format!(
                    "margin:0 0 2rem; font-size:{}; line-height:1; font-family:serif; font-weight:900; background:linear-gradient(to bottom right,#facc15,#ca8a04); -webkit-background-clip:text; background-clip:text; color:transparent;",
                    grade_font_size(&shell.student.grade)
                ),
            )?;
            grade.set_text_content(Some(&shell.student.grade));
            let divider = doc.create_element("div")?;
            divider.set_attribute("style", "width:4rem; height:0.25rem; background:#e2e8f0; border-radius:9999px; margin-bottom:1.5rem;")?;
            let comment = doc.create_element("p")?;
            comment.set_attribute("style", "min-height:60px; margin:0 0 2.5rem; font-size:1.25rem; font-weight:500; line-height:1.6; color:#334155;")?;
            comment.set_text_content(shell.flow.comment());
            let button = doc.create_element("button")?;
            button.set_attribute("style", "padding:0.75rem 2.5rem; font-size:1.125rem; font-weight:700; color:#fff; background:linear-gradient(to right,#ec4899,#f43f5e); border:none; border-radius:0.75rem; cursor:pointer; box-shadow:0 10px 25px rgba(236,72,153,0.35);")?;
            button.set_text_content(Some("我好棒！"));
            on_click(&button, on_awesome_click)?;
            for child in [&grade, &divider, &comment, &button] {
                card.append_child(child)?;
            }
            content.append_child(&card)?;
        }
    }
    Ok(())
}

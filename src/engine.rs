use crate::browser::{self, LoopClosure};
use anyhow::{anyhow, Error, Result};
// wasm is single threaded, so Rc RefCell rather than Arc Mutex
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use self::input::{KeyPress, KeyState};

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&self, renderer: &Renderer);
}

/// Drives the game from `requestAnimationFrame`: every callback drains the
/// queued key events, updates the game exactly once, then draws it
pub struct GameLoop {
    keystate: KeyState,
    keyevent_receiver: UnboundedReceiver<KeyPress>,
}

type SharedLoopClosure = Rc<RefCell<Option<LoopClosure>>>;

impl GameLoop {
    fn new(keyevent_receiver: UnboundedReceiver<KeyPress>) -> Self {
        GameLoop {
            keystate: KeyState::new(),
            keyevent_receiver,
        }
    }

    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let keyevent_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop::new(keyevent_receiver);
        let renderer = Renderer {
            context: browser::context()?,
        };

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |_perf: f64| {
            game_loop.frame(game.as_mut());
            game.draw(&renderer);

            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    log::error!("GameLoop: could not schedule next frame : {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }

    /// One tick per frame callback, whatever the display refresh rate
    fn frame(&mut self, game: &mut dyn Game) {
        input::process_input(&mut self.keystate, &mut self.keyevent_receiver);
        game.update(&self.keystate);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn square(side: f64) -> Self {
        Size {
            width: side,
            height: side,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.size.width
    }

    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.height
    }

    /// Strict overlap: boxes that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x() < other.right()
            && self.right() > other.x()
            && self.y() < other.bottom()
            && self.bottom() > other.y()
    }
}

/// Thin wrapper over the canvas 2d context
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x(), rect.y(), rect.size.width, rect.size.height);
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context
            .fill_rect(rect.x(), rect.y(), rect.size.width, rect.size.height);
    }

    pub fn stroke_rect(&self, rect: &Rect, color: &str, line_width: f64) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
        self.context
            .stroke_rect(rect.x(), rect.y(), rect.size.width, rect.size.height);
    }

    /// Horizontal line from x = 0 to `width` at `y`, bowed down by `dip` at the middle
    pub fn wave(&self, y: f64, width: f64, dip: f64, color: &str, line_width: f64) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
        self.context.begin_path();
        self.context.move_to(0.0, y);
        self.context.quadratic_curve_to(width / 2.0, y + dip, width, y);
        self.context.stroke();
    }

    pub fn text(&self, text: &str, position: &Point, font: &str, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.set_font(font);
        if let Err(err) = self.context.fill_text(text, position.x, position.y) {
            log::error!("Could not draw text '{}' : {:#?}", text, err);
        }
    }

    pub fn draw_entire_image(&self, image: &HtmlImageElement, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_dw_and_dh(
                image,
                destination.x(),
                destination.y(),
                destination.size.width,
                destination.size.height,
            )
        {
            log::error!("Could not draw image {} : {:#?}", image.src(), err);
        }
    }
}

/// An image that may not have loaded; drawing falls back to plain shapes
pub struct Sprite {
    image: Option<HtmlImageElement>,
}

impl Sprite {
    pub fn new(image: Option<HtmlImageElement>) -> Self {
        Sprite { image }
    }

    /// Usable only once the browser has decoded it
    fn ready(&self) -> Option<&HtmlImageElement> {
        self.image
            .as_ref()
            .filter(|image| image.complete() && image.natural_height() > 0)
    }

    /// Draw `size` wide at `position`, height following the image's aspect
    /// ratio. Returns false when nothing was drawn.
    pub fn draw_fitted(&self, renderer: &Renderer, position: Point, size: f64) -> bool {
        match self.ready() {
            Some(image) => {
                let aspect_ratio =
                    f64::from(image.natural_width()) / f64::from(image.natural_height());
                let destination = Rect::new(
                    position,
                    Size {
                        width: size,
                        height: size / aspect_ratio,
                    },
                );
                renderer.draw_entire_image(image, &destination);
                true
            }
            None => false,
        }
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!("Error loading image: {:#?}", err)));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callbacks alive until the image loads or errors
    success_callback.forget();
    error_callback.forget();

    // Result<Result<(), Error>, oneshot::Canceled>
    // - first ? : channel was dropped
    // - second ? : image failed to load
    rx.await??;

    Ok(image)
}

/// Keyboard plumbing: browser key events are queued on a channel and drained
/// into a `KeyState` once per animation frame
pub mod input {
    use crate::browser;
    use crate::sim::TickInput;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use std::collections::HashSet;
    use wasm_bindgen::JsCast;

    const LEFT_KEYS: [&str; 2] = ["ArrowLeft", "a"];
    const RIGHT_KEYS: [&str; 2] = ["ArrowRight", "d"];

    #[derive(Debug)]
    pub enum KeyPress {
        KeyUp(String),
        KeyDown(String),
    }

    /// `KeyboardEvent.key` values currently held down. Single letters are
    /// stored lowercase so "A" pressed with shift is released by "a".
    #[derive(Debug, Default)]
    pub struct KeyState {
        pressed_keys: HashSet<String>,
    }

    impl KeyState {
        pub fn new() -> Self {
            KeyState {
                pressed_keys: HashSet::new(),
            }
        }

        pub fn is_pressed(&self, key: &str) -> bool {
            self.pressed_keys.contains(&key_name(key))
        }

        pub fn set_pressed(&mut self, key: &str) {
            self.pressed_keys.insert(key_name(key));
        }

        pub fn set_released(&mut self, key: &str) {
            self.pressed_keys.remove(&key_name(key));
        }

        fn any_pressed(&self, keys: &[&str]) -> bool {
            keys.iter().any(|key| self.is_pressed(key))
        }

        /// Movement intents for the next tick; left and right are read independently
        pub fn tick_input(&self) -> TickInput {
            TickInput {
                left: self.any_pressed(&LEFT_KEYS),
                right: self.any_pressed(&RIGHT_KEYS),
            }
        }
    }

    fn key_name(key: &str) -> String {
        if key.chars().count() == 1 {
            key.to_lowercase()
        } else {
            key.to_string()
        }
    }

    pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
        let (keydown_sender, keyevent_receiver) = unbounded();
        let keyup_sender = keydown_sender.clone();

        let onkeydown = browser::closure_wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(event.key()));
        }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

        let onkeyup = browser::closure_wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(event.key()));
        }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

        let window = browser::window()?;
        window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
        window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
        onkeydown.forget();
        onkeyup.forget();

        Ok(keyevent_receiver)
    }

    pub fn process_input(state: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
        // Ok(None) : channel closed, Err : nothing queued right now
        while let Ok(Some(event)) = keyevent_receiver.try_next() {
            match event {
                KeyPress::KeyUp(key) => state.set_released(&key),
                KeyPress::KeyDown(key) => state.set_pressed(&key),
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::TickInput;
    use futures::channel::mpsc::unbounded;

    #[derive(Default)]
    struct CountingGame {
        inputs: Vec<TickInput>,
    }

    #[async_trait(?Send)]
    impl Game for CountingGame {
        async fn initialize(&self) -> Result<Box<dyn Game>> {
            Ok(Box::new(CountingGame::default()))
        }

        fn update(&mut self, keystate: &KeyState) {
            self.inputs.push(keystate.tick_input());
        }

        fn draw(&self, _renderer: &Renderer) {}
    }

    #[test]
    fn each_frame_updates_exactly_once() {
        let (sender, receiver) = unbounded();
        let mut game_loop = GameLoop::new(receiver);
        let mut game = CountingGame::default();

        sender
            .unbounded_send(KeyPress::KeyDown("ArrowLeft".into()))
            .unwrap();
        game_loop.frame(&mut game);
        game_loop.frame(&mut game);
        sender
            .unbounded_send(KeyPress::KeyUp("ArrowLeft".into()))
            .unwrap();
        game_loop.frame(&mut game);

        let lefts: Vec<bool> = game.inputs.iter().map(|input| input.left).collect();
        assert_eq!(lefts, vec![true, true, false]);
    }

    fn square(x: f64, y: f64, side: f64) -> Rect {
        Rect::new(Point { x, y }, Size::square(side))
    }

    #[test]
    fn overlapping_boxes_intersect() {
        let player = square(380.0, 420.0, 40.0);
        let obstacle = square(390.0, 430.0, 40.0);
        assert!(player.intersects(&obstacle));
        assert!(obstacle.intersects(&player));
    }

    #[test]
    fn edge_contact_is_not_an_intersection() {
        let a = square(0.0, 0.0, 40.0);
        assert!(!a.intersects(&square(40.0, 0.0, 40.0)));
        assert!(!a.intersects(&square(0.0, 40.0, 40.0)));
        assert!(!a.intersects(&square(100.0, 100.0, 40.0)));
    }

    #[test]
    fn contained_box_intersects() {
        let outer = square(0.0, 0.0, 100.0);
        assert!(outer.intersects(&square(10.0, 10.0, 5.0)));
    }
}

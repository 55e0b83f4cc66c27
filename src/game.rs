use crate::browser;
use crate::config::GameConfig;
use crate::engine::input::KeyState;
use crate::engine::{self, Game, Point, Rect, Renderer, Sprite};
use crate::run::{Controller, Notice};
use crate::sim::{Choice, GameState, ObstacleSkin};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use futures::join;
use std::rc::Rc;

/// ┌───────────────────────── Frame Overview ────────────────────────────┐
/// │                                                                     │
/// │  engine::GameLoop ──update()──► DuneRunner ──► overlay commands     │
/// │        │                           │          (start / A / B)       │
/// │        │                           └─────────► run::Controller      │
/// │        │                                        └─► sim::tick       │
/// │        └─────────draw()──────────► DuneRunner ──► Renderer          │
/// │                                                                     │
/// └─────────────────────────────────────────────────────────────────────┘
pub enum DuneRunner {
    /// Config and images are still being fetched
    Loading,
    Loaded(Dunes),
}

impl DuneRunner {
    const CONFIG_PATH: &'static str = "config.json";
    const PLAYER_IMAGE_PATH: &'static str = "player.png";

    pub fn new() -> Self {
        DuneRunner::Loading
    }

    async fn load_config() -> GameConfig {
        let config = browser::fetch_json::<GameConfig>(Self::CONFIG_PATH)
            .await
            .and_then(GameConfig::validated);
        match config {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "Using default config, could not load {} : {:#}",
                    Self::CONFIG_PATH,
                    err
                );
                GameConfig::default()
            }
        }
    }

    /// A missing image is not fatal, the sprite just draws its fallback shape
    async fn load_sprite(path: &str) -> Sprite {
        let image = engine::load_image(path)
            .await
            .with_context(|| format!("Failed to load sprite image from : {}", path));
        match image {
            Ok(image) => Sprite::new(Some(image)),
            Err(err) => {
                log::warn!("{:#}", err);
                Sprite::new(None)
            }
        }
    }

    fn size_canvas(config: &GameConfig) -> Result<()> {
        let canvas = browser::canvas()?;
        let (width, height) = config.canvas_pixels();
        canvas.set_width(width);
        canvas.set_height(height);
        Ok(())
    }
}

impl Default for DuneRunner {
    fn default() -> Self {
        DuneRunner::new()
    }
}

#[async_trait(?Send)]
impl Game for DuneRunner {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            DuneRunner::Loading => {
                let config = Rc::new(Self::load_config().await);
                Self::size_canvas(&config)?;

                let (player, first, second, third) = join!(
                    Self::load_sprite(Self::PLAYER_IMAGE_PATH),
                    Self::load_sprite(ObstacleSkin::First.image_path()),
                    Self::load_sprite(ObstacleSkin::Second.image_path()),
                    Self::load_sprite(ObstacleSkin::Third.image_path()),
                );

                let seed = config.seed.unwrap_or_else(rand::random);
                log::info!("Dunes ready, seed {}", seed);
                let dunes = Dunes {
                    controller: Controller::new(config, seed),
                    player,
                    obstacles: [first, second, third],
                    commands: overlay::prepare_commands()?,
                };
                Ok(Box::new(DuneRunner::Loaded(dunes)))
            }
            DuneRunner::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState) {
        if let DuneRunner::Loaded(dunes) = self {
            dunes.handle_commands();
            if let Some(notice) = dunes.controller.update(&keystate.tick_input()) {
                dunes.present(notice);
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let DuneRunner::Loaded(dunes) = self {
            dunes.draw(renderer);
        }
    }
}

pub struct Dunes {
    controller: Controller,
    player: Sprite,
    /// indexed by `ObstacleSkin::index`
    obstacles: [Sprite; 3],
    commands: UnboundedReceiver<overlay::Command>,
}

impl Dunes {
    fn handle_commands(&mut self) {
        while let Ok(Some(command)) = self.commands.try_next() {
            let result = match command {
                overlay::Command::Start => self.start(),
                overlay::Command::Choose(choice) => self.choose(choice),
                overlay::Command::Restart => self.restart(),
            };
            if let Err(err) = result {
                log::warn!("{:#}", err);
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        overlay::show_canvas()?;
        self.controller.start();
        Ok(())
    }

    fn choose(&mut self, choice: Choice) -> Result<()> {
        self.controller.choose(choice)?;
        overlay::hide_blessing()
    }

    fn restart(&mut self) -> Result<()> {
        overlay::hide_ending()?;
        self.controller.reset();
        self.start()
    }

    fn present(&self, notice: Notice) {
        let result = match notice {
            Notice::BlessingOffered(event) => overlay::show_blessing(event),
            Notice::RunEnded(summary) => overlay::show_ending(&summary.title, &summary.message),
        };
        if let Err(err) = result {
            log::error!("Could not update overlay : {:#}", err);
        }
    }

    // Draw order matters : background -> player -> obstacles -> score
    fn draw(&self, renderer: &Renderer) {
        let state = self.controller.state();
        let canvas = state.canvas_size();
        let screen = Rect::new(Point::default(), canvas);

        renderer.clear(&screen);
        renderer.fill_rect(&screen, state.world_color);
        for y in wave_rows(
            state.background_offset,
            state.config.background_wrap,
            canvas.height,
        ) {
            renderer.wave(y, canvas.width, 15.0, "#000", 2.0);
        }

        self.draw_player(renderer, state);
        self.draw_obstacles(renderer, state);

        renderer.text(
            &format!("Score: {}", state.score),
            &Point { x: 10.0, y: 30.0 },
            "20px 'Press Start 2P'",
            "#fff8e7",
        );
    }

    fn draw_player(&self, renderer: &Renderer, state: &GameState) {
        let player = &state.player;
        let position = Point {
            x: player.x,
            y: player.y,
        };
        if !self.player.draw_fitted(renderer, position, player.size) {
            renderer.fill_rect(&player.bounding_box(), "#fff");
        }
    }

    fn draw_obstacles(&self, renderer: &Renderer, state: &GameState) {
        for obstacle in &state.obstacles {
            let position = Point {
                x: obstacle.x,
                y: obstacle.y,
            };
            let sprite = &self.obstacles[obstacle.skin.index()];
            if !sprite.draw_fitted(renderer, position, obstacle.size) {
                let hitbox = obstacle.bounding_box();
                renderer.fill_rect(&hitbox, "#ff4444");
                renderer.stroke_rect(&hitbox, "#000", 2.0);
            }
        }
    }
}

/// y of each scrolling dune line, from one spacing above the canvas down to its height
fn wave_rows(offset: f64, spacing: f64, height: f64) -> impl Iterator<Item = f64> {
    let shift = if spacing > 0.0 { offset % spacing } else { 0.0 };
    let step = spacing.max(1.0);
    (0..)
        .map(move |row: u32| -step + f64::from(row) * step)
        .take_while(move |&base| base < height)
        .map(move |base| base + shift)
}

/// DOM overlays around the canvas: intro, blessing choice and ending screens.
/// Clicks are queued as `Command`s and applied on the next update.
mod overlay {
    use crate::browser;
    use crate::sim::{BlessingEvent, Choice};
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

    const INTRO_SCREEN: &str = "intro-screen";
    const START_BUTTON: &str = "start-btn";
    const CANVAS: &str = "gameCanvas";
    const DECISION_BOX: &str = "decision-box";
    const DECISION_TEXT: &str = "decision-text";
    const CHOICE_A: &str = "choiceA";
    const CHOICE_B: &str = "choiceB";
    const ENDING_SCREEN: &str = "ending-screen";
    const ENDING_TITLE: &str = "ending-title";
    const ENDING_TEXT: &str = "ending-text";
    const RESTART_BUTTON: &str = "restart-btn";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Command {
        Start,
        Choose(Choice),
        Restart,
    }

    fn send_on_click(id: &str, sender: &UnboundedSender<Command>, command: Command) -> Result<()> {
        let sender = sender.clone();
        browser::on_click(id, move || {
            let _ = sender.unbounded_send(command);
        })
    }

    pub fn prepare_commands() -> Result<UnboundedReceiver<Command>> {
        let (sender, receiver) = unbounded();
        send_on_click(START_BUTTON, &sender, Command::Start)?;
        send_on_click(CHOICE_A, &sender, Command::Choose(Choice::A))?;
        send_on_click(CHOICE_B, &sender, Command::Choose(Choice::B))?;
        // play-again button is optional in the page
        if let Err(err) = send_on_click(RESTART_BUTTON, &sender, Command::Restart) {
            log::info!("No restart button : {:#}", err);
        }
        Ok(receiver)
    }

    pub fn show_canvas() -> Result<()> {
        browser::set_display(INTRO_SCREEN, "none")?;
        browser::set_display(CANVAS, "block")
    }

    pub fn show_blessing(event: &BlessingEvent) -> Result<()> {
        browser::set_text(DECISION_TEXT, event.text)?;
        browser::set_text(CHOICE_A, event.option_a)?;
        browser::set_text(CHOICE_B, event.option_b)?;
        browser::set_hidden(DECISION_BOX, false)
    }

    pub fn hide_blessing() -> Result<()> {
        browser::set_hidden(DECISION_BOX, true)
    }

    pub fn show_ending(title: &str, message: &str) -> Result<()> {
        browser::set_display(CANVAS, "none")?;
        browser::set_text(ENDING_TITLE, title)?;
        browser::set_text(ENDING_TEXT, message)?;
        browser::set_hidden(ENDING_SCREEN, false)
    }

    pub fn hide_ending() -> Result<()> {
        browser::set_hidden(ENDING_SCREEN, true)
    }
}

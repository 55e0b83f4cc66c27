//! Dune Runner - dodge falling obstacles across the dunes, picking up
//! blessings along the way
//!
//! - `sim`    : pure game rules (state, tick, spawner, blessings)
//! - `run`    : Idle / Running / AwaitingChoice / Ended lifecycle
//! - `engine` : frame loop, renderer, keyboard input
//! - `game`   : the browser game tying it all to the canvas and DOM
use wasm_bindgen::prelude::*;

mod browser;
pub mod config;
pub mod engine;
mod game;
pub mod run;
pub mod sim;

pub use config::GameConfig;
pub use run::Controller;

/// Main entry for the WebAssembly module
/// - sets up panic messages and console logging
/// - loads the game and starts the frame loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set : {}", err).into());
    }

    browser::spawn_local(async move {
        let game = game::DuneRunner::new();
        if let Err(err) = engine::GameLoop::start(game).await {
            log::error!("Could not start game loop : {:#}", err);
        }
    });

    Ok(())
}

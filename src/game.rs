//! The controller that owns one game session.
//!
//! `Game` holds the state, the scaled tuning, the layout and the loaded
//! assets. The frame loop feeds it intents and elapsed time and asks it to
//! draw; it never talks to the terminal itself.

use std::time::Instant;

use log::{info, warn};
use rand::Rng;

use crate::assets::{AssetLoader, Assets};
use crate::audio::Audio;
use crate::input::Intent;
use crate::layout::Dimensions;
use crate::physics::{self, GameState, Tuning};
use crate::render::{self, LETTERBOX, PixelBuf, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Milliseconds between successive frames. The first frame after a reset
/// reports zero.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn delta_ms(&mut self, now: Instant) -> f64 {
        let dt = self
            .last
            .map_or(0.0, |last| now.saturating_duration_since(last).as_nanos() as f64 / 1e6);
        self.last = Some(now);
        dt
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

pub struct Game<R: Rng> {
    state: GameState,
    tuning: Tuning,
    dims: Dimensions,
    rng: R,
    assets: Assets,
    loader: Option<AssetLoader>,
    audio: Audio,
}

impl<R: Rng> Game<R> {
    /// A session that waits for `loader` before play starts.
    pub fn new(dims: Dimensions, rng: R, loader: AssetLoader, muted: bool) -> Self {
        let mut game = Self::with_assets(dims, rng, Assets::default(), Audio::disabled(muted));
        game.loader = Some(loader);
        game
    }

    /// A session that is ready to play immediately.
    pub fn with_assets(dims: Dimensions, rng: R, assets: Assets, audio: Audio) -> Self {
        if !dims.is_drawable() {
            warn!("Viewport too small for the canvas, nothing will be drawn");
        }
        let tuning = dims.tuning();
        Game {
            state: GameState::initial(&tuning),
            tuning,
            dims,
            rng,
            assets,
            loader: None,
            audio,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn is_ready(&self) -> bool {
        self.loader.is_none()
    }

    /// Opens the gate once every asset has reported. Returns readiness.
    pub fn poll_assets(&mut self) -> bool {
        if let Some(loader) = &mut self.loader {
            if !loader.poll() {
                return false;
            }
            let mut assets = loader.take();
            self.audio = Audio::open(assets.music.take(), self.audio.is_muted());
            self.assets = assets;
            self.loader = None;
        }
        true
    }

    pub fn handle(&mut self, intent: Intent) -> Flow {
        match intent {
            Intent::Jump => self.jump(),
            Intent::ToggleMute => {
                self.audio.toggle_mute();
            }
            Intent::Resize(cols, rows) => self.resize(Dimensions::from_terminal(cols, rows)),
            Intent::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn jump(&mut self) {
        if !self.is_ready() {
            return;
        }
        if self.state.game_over {
            info!("Restarting");
        }
        self.state = physics::jump(&self.state, &self.tuning);
        self.audio.start_music();
    }

    /// Rescales the running game to a new layout. An undrawable layout
    /// pauses play and keeps the state at its last usable scale.
    pub fn resize(&mut self, dims: Dimensions) {
        let old = self.tuning.scale;
        self.dims = dims;
        if !dims.is_drawable() {
            warn!("Viewport too small for the canvas, pausing");
            return;
        }
        if old > 0.0 {
            self.state = self.state.rescaled(dims.scale / old);
        } else {
            self.state = GameState::initial(&dims.tuning());
        }
        self.tuning = dims.tuning();
        info!("Resized: scale {old:.3} -> {:.3}", dims.scale);
    }

    /// One frame of physics over `dt_ms` of real time.
    pub fn tick(&mut self, dt_ms: f64) {
        if !self.is_ready() || !self.dims.is_drawable() {
            return;
        }
        let was_over = self.state.game_over;
        self.state = physics::step(&self.state, dt_ms, &self.tuning, &mut self.rng);
        if self.state.game_over && !was_over {
            info!(
                "Game over: score {}, level {}",
                self.state.score, self.state.level
            );
            self.audio.game_over();
        }
    }

    pub fn draw(&self, buf: &mut PixelBuf) {
        if !self.dims.is_drawable() {
            buf.clear(LETTERBOX);
            return;
        }
        if let Some(loader) = &self.loader {
            buf.clear(LETTERBOX);
            render::draw_loading(buf, &self.dims, loader.loaded(), AssetLoader::TOTAL);
            return;
        }
        render::draw_world(
            buf,
            &Scene {
                state: &self.state,
                tuning: &self.tuning,
                dims: &self.dims,
                assets: &self.assets,
            },
        );
        render::draw_hud(buf, &self.dims, &self.state, self.audio.is_muted());
        if self.state.game_over {
            render::draw_game_over(buf, &self.dims, &self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn game() -> Game<ChaCha8Rng> {
        Game::with_assets(
            Dimensions::from_viewport(800, 600),
            ChaCha8Rng::seed_from_u64(7),
            Assets::default(),
            Audio::disabled(false),
        )
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::default();
        let t0 = Instant::now();
        assert_eq!(clock.delta_ms(t0), 0.0);
        assert_eq!(clock.delta_ms(t0 + Duration::from_millis(16)), 16.0);
        clock.reset();
        assert_eq!(clock.delta_ms(t0 + Duration::from_millis(500)), 0.0);
    }

    #[test]
    fn test_jump_starts_music() {
        let mut g = game();
        assert!(!g.audio().music_on());
        g.handle(Intent::Jump);
        assert!(g.audio().music_on());
        assert_eq!(g.state().bird_velocity, -8.0);
    }

    #[test]
    fn test_game_over_stops_music_and_restart_resumes() {
        let mut g = game();
        g.handle(Intent::Jump);
        // fall out of the canvas
        for _ in 0..200 {
            g.tick(16.0);
        }
        assert!(g.state().game_over);
        assert!(!g.audio().music_on());

        let frozen = g.state().clone();
        g.tick(16.0);
        assert_eq!(g.state(), &frozen);

        g.handle(Intent::Jump);
        assert_eq!(g.state(), &GameState::initial(g.tuning()));
        assert!(g.audio().music_on());
    }

    #[test]
    fn test_resize_rescales_state() {
        let mut g = game();
        g.tick(16.0);
        let before = g.state().clone();
        g.handle(Intent::Resize(400, 150));
        assert_eq!(g.tuning().scale, 0.5);
        assert_eq!(g.state().bird_position, before.bird_position * 0.5);
        assert_eq!(g.state().pipes[0].x, before.pipes[0].x * 0.5);
    }

    #[test]
    fn test_tiny_viewport_pauses() {
        let mut g = game();
        g.resize(Dimensions::from_viewport(0, 0));
        let before = g.state().clone();
        g.tick(16.0);
        assert_eq!(g.state(), &before);
        assert_eq!(g.tuning().scale, 1.0);

        g.resize(Dimensions::from_viewport(400, 300));
        assert_eq!(g.state().bird_position, before.bird_position * 0.5);
    }

    #[test]
    fn test_mute_and_quit() {
        let mut g = game();
        assert_eq!(g.handle(Intent::ToggleMute), Flow::Continue);
        assert!(g.audio().is_muted());
        assert_eq!(g.handle(Intent::Quit), Flow::Quit);
    }

    #[test]
    fn test_loading_gate() {
        let mut g = Game::new(
            Dimensions::from_viewport(80, 60),
            ChaCha8Rng::seed_from_u64(1),
            AssetLoader::spawn("/definitely/not/here"),
            true,
        );
        assert!(!g.is_ready());
        g.handle(Intent::Jump);
        g.tick(16.0);
        assert_eq!(g.state(), &GameState::initial(g.tuning()));
        let mut buf = PixelBuf::new(80, 60);
        g.draw(&mut buf);
        assert_eq!(buf.get(0, 0), render::SKY.halved());
    }
}

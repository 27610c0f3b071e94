//! Bird physics, pipe scrolling, scoring and collision.
//!
//! Everything here is a pure transition over [`GameState`]: the frame loop owns
//! the state and replaces it with whatever [`step`] or [`jump`] returns. Lengths
//! are in scaled canvas pixels, velocities in scaled pixels per 16ms tick.

use rand::Rng;

/// Logical canvas size every constant is expressed against.
pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 600.0;

/// Frame time that counts as one physics step.
pub const REFERENCE_TICK_MS: f64 = 16.0;

/// A level is gained every this many points.
pub const SCORE_PER_LEVEL: u32 = 5;

// ── Tuning ──────────────────────────────────────────────────────────────────

/// Physical constants at a given layout scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub scale: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub gravity: f64,
    pub jump_strength: f64,
    pub base_speed: f64,
    pub speed_per_level: f64,
    pub pipe_width: f64,
    pub gap_height: f64,
    pub min_pipe_height: f64,
    pub bird_size: f64,
    pub bird_x: f64,
    pub start_y: f64,
    pub spawn_x: f64,
    pub spawn_threshold: f64,
}

impl Tuning {
    pub const BASE: Tuning = Tuning {
        scale: 1.0,
        canvas_width: CANVAS_WIDTH,
        canvas_height: CANVAS_HEIGHT,
        gravity: 0.5,
        jump_strength: -8.0,
        base_speed: 3.0,
        speed_per_level: 0.5,
        pipe_width: 52.0,
        gap_height: 150.0,
        min_pipe_height: 50.0,
        bird_size: 48.0,
        bird_x: 100.0,
        start_y: 250.0,
        spawn_x: CANVAS_WIDTH,
        spawn_threshold: 600.0,
    };

    pub fn scaled(scale: f64) -> Self {
        let b = Self::BASE;
        Tuning {
            scale,
            canvas_width: b.canvas_width * scale,
            canvas_height: b.canvas_height * scale,
            gravity: b.gravity * scale,
            jump_strength: b.jump_strength * scale,
            base_speed: b.base_speed * scale,
            speed_per_level: b.speed_per_level * scale,
            pipe_width: b.pipe_width * scale,
            gap_height: b.gap_height * scale,
            min_pipe_height: b.min_pipe_height * scale,
            bird_size: b.bird_size * scale,
            bird_x: b.bird_x * scale,
            start_y: b.start_y * scale,
            spawn_x: b.spawn_x * scale,
            spawn_threshold: b.spawn_threshold * scale,
        }
    }

    /// Horizontal scroll per reference tick at `level`.
    pub fn game_speed(&self, level: u32) -> f64 {
        self.base_speed + level.saturating_sub(1) as f64 * self.speed_per_level
    }

    /// Collision box of the bird centred at `y`. Smaller than the sprite,
    /// which has transparent margins.
    pub fn hitbox(&self, y: f64) -> Rect {
        let half_w = self.bird_size * 0.6 / 2.0;
        let half_h = self.bird_size * 0.4 / 2.0;
        Rect {
            left: self.bird_x - half_w,
            top: y - half_h,
            right: self.bird_x + half_w,
            bottom: y + half_h,
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::BASE
    }
}

// ── Geometry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Strict overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pipe {
    pub x: f64,
    pub gap_start: f64,
    pub gap_height: f64,
}

impl Pipe {
    pub fn gap_end(&self) -> f64 {
        self.gap_start + self.gap_height
    }

    pub fn right(&self, pipe_width: f64) -> f64 {
        self.x + pipe_width
    }

    /// Solid region above the gap. Unbounded upward.
    pub fn upper(&self, pipe_width: f64) -> Rect {
        Rect {
            left: self.x,
            top: f64::NEG_INFINITY,
            right: self.right(pipe_width),
            bottom: self.gap_start,
        }
    }

    /// Solid region below the gap. Unbounded downward.
    pub fn lower(&self, pipe_width: f64) -> Rect {
        Rect {
            left: self.x,
            top: self.gap_end(),
            right: self.right(pipe_width),
            bottom: f64::INFINITY,
        }
    }
}

// ── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub bird_position: f64,
    pub bird_velocity: f64,
    pub pipes: Vec<Pipe>,
    pub score: u32,
    pub game_over: bool,
    pub level: u32,
}

impl GameState {
    pub fn initial(tuning: &Tuning) -> Self {
        GameState {
            bird_position: tuning.start_y,
            bird_velocity: 0.0,
            pipes: Vec::new(),
            score: 0,
            game_over: false,
            level: 1,
        }
    }

    /// Multiplies every length by `ratio`, for a layout scale change mid-game.
    pub fn rescaled(&self, ratio: f64) -> Self {
        GameState {
            bird_position: self.bird_position * ratio,
            bird_velocity: self.bird_velocity * ratio,
            pipes: self
                .pipes
                .iter()
                .map(|p| Pipe {
                    x: p.x * ratio,
                    gap_start: p.gap_start * ratio,
                    gap_height: p.gap_height * ratio,
                })
                .collect(),
            ..self.clone()
        }
    }
}

pub fn level_for(score: u32) -> u32 {
    score / SCORE_PER_LEVEL + 1
}

// ── Transitions ─────────────────────────────────────────────────────────────

/// Jump input. Alive: velocity is overwritten with the impulse. Dead: full reset.
pub fn jump(state: &GameState, tuning: &Tuning) -> GameState {
    if state.game_over {
        return GameState::initial(tuning);
    }
    GameState {
        bird_velocity: tuning.jump_strength,
        ..state.clone()
    }
}

/// New pipe at the right edge with a uniformly random gap that keeps
/// `min_pipe_height` of solid pipe at both ends.
pub fn spawn_pipe<R: Rng>(tuning: &Tuning, rng: &mut R) -> Pipe {
    let lo = tuning.min_pipe_height;
    let hi = tuning.canvas_height - tuning.min_pipe_height - tuning.gap_height;
    let gap_start = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
    Pipe {
        x: tuning.spawn_x,
        gap_start,
        gap_height: tuning.gap_height,
    }
}

pub fn collides(hitbox: &Rect, pipe: &Pipe, pipe_width: f64) -> bool {
    hitbox.overlaps(&pipe.upper(pipe_width)) || hitbox.overlaps(&pipe.lower(pipe_width))
}

pub fn out_of_bounds(hitbox: &Rect, canvas_height: f64) -> bool {
    hitbox.top < 0.0 || hitbox.bottom > canvas_height
}

/// Advance the world by `dt_ms` of real time. A finished game is returned as is.
///
/// Scoring looks for a pipe whose trailing edge landed within one reference
/// tick of travel behind the bird, so a very long frame can skip a pipe.
pub fn step<R: Rng>(state: &GameState, dt_ms: f64, tuning: &Tuning, rng: &mut R) -> GameState {
    if state.game_over {
        return state.clone();
    }

    let steps = dt_ms / REFERENCE_TICK_MS;
    let speed = tuning.game_speed(state.level);

    let bird_position = state.bird_position + state.bird_velocity * steps;
    let bird_velocity = state.bird_velocity + tuning.gravity * steps;

    let mut pipes: Vec<Pipe> = state
        .pipes
        .iter()
        .map(|p| Pipe {
            x: p.x - speed * steps,
            ..*p
        })
        .filter(|p| p.right(tuning.pipe_width) > 0.0)
        .collect();

    if pipes.last().is_none_or(|p| p.x < tuning.spawn_threshold) {
        pipes.push(spawn_pipe(tuning, rng));
    }

    let scored = pipes.iter().any(|p| {
        let trailing = p.right(tuning.pipe_width);
        trailing <= tuning.bird_x && trailing > tuning.bird_x - speed
    });
    let (score, level) = if scored {
        let score = state.score + 1;
        (score, level_for(score))
    } else {
        (state.score, state.level)
    };

    let hitbox = tuning.hitbox(bird_position);
    let hit_pipe = pipes
        .iter()
        .any(|p| collides(&hitbox, p, tuning.pipe_width));
    let game_over = hit_pipe || out_of_bounds(&hitbox, tuning.canvas_height);

    GameState {
        bird_position,
        bird_velocity,
        pipes,
        score,
        game_over,
        level,
    }
}

//! Drawing the canvas into a terminal pixel buffer.
//!
//! Every terminal cell holds two pixels stacked vertically, painted with the
//! upper half block glyph. Canvas coordinates are the scaled physics
//! coordinates, shifted by the layout offset.

use std::f64::consts::SQRT_2;
use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};

use crate::assets::{Assets, Sprite};
use crate::layout::Dimensions;
use crate::physics::{GameState, Pipe, Tuning};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    pub const fn halved(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }

    fn term(self) -> CColor {
        CColor::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

pub const LETTERBOX: Rgb = Rgb(12, 12, 16);
pub const SKY: Rgb = Rgb(135, 206, 235);
pub const GROUND: Rgb = Rgb(144, 238, 144);
const PIPE_L: Rgb = Rgb(74, 122, 26);
const PIPE_M: Rgb = Rgb(100, 170, 40);
const PIPE_R: Rgb = Rgb(115, 191, 46);
const PIPE_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
const BIRD_Y: Rgb = Rgb(245, 200, 66);
const BIRD_HI: Rgb = Rgb(255, 225, 100);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(225, 75, 35);
const WHITE: Rgb = Rgb(255, 255, 255);
const SHADOW: Rgb = Rgb(0, 0, 0);
const MUTED: Rgb = Rgb(240, 90, 90);

/// Height of the fallback ground strip on the unscaled canvas.
const FALLBACK_GROUND_H: f64 = 100.0;

/// Bird tilt per unit of (unscaled) velocity, and its limit.
const TILT_PER_VELOCITY: f64 = 0.1;
const MAX_TILT: f64 = 0.5;

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
    clip: Option<(i32, i32, i32, i32)>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![LETTERBOX; w * h],
            clip: None,
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, LETTERBOX);
    }

    pub fn clear(&mut self, c: Rgb) {
        self.px.fill(c);
    }

    /// Restrict drawing to the canvas. `None` lifts the restriction.
    pub fn set_clip(&mut self, dims: Option<&Dimensions>) {
        self.clip = dims.map(|d| {
            let x = d.offset_x as i32;
            let y = d.offset_y as i32;
            (x, y, x + d.width as i32, y + d.height as i32)
        });
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if let Some((x0, y0, x1, y1)) = self.clip {
            if x < x0 || y < y0 || x >= x1 || y >= y1 {
                return;
            }
        }
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    pub fn darken_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        for py in y.max(0)..(y + h).min(self.h as i32) {
            for px in x.max(0)..(x + w).min(self.w as i32) {
                let c = self.get(px as usize, py as usize);
                self.set(px, py, c.halved());
            }
        }
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut pen = Pen::default();

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);
                if top == bot {
                    pen.background(out, top)?;
                    queue!(out, style::Print(' '))?;
                } else {
                    pen.foreground(out, top)?;
                    pen.background(out, bot)?;
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                pen = Pen::default();
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

/// Current terminal colours, so unchanged ones are not re-sent.
#[derive(Default)]
struct Pen {
    fg: Option<Rgb>,
    bg: Option<Rgb>,
}

impl Pen {
    fn foreground(&mut self, out: &mut impl Write, c: Rgb) -> io::Result<()> {
        if self.fg != Some(c) {
            queue!(out, style::SetForegroundColor(c.term()))?;
            self.fg = Some(c);
        }
        Ok(())
    }

    fn background(&mut self, out: &mut impl Write, c: Rgb) -> io::Result<()> {
        if self.bg != Some(c) {
            queue!(out, style::SetBackgroundColor(c.term()))?;
            self.bg = Some(c);
        }
        Ok(())
    }
}

// ── 3x5 bitmap font ─────────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

#[rustfmt::skip]
const LETTERS: [(char, [u8; 15]); 19] = [
    ('A', [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1]),
    ('C', [1,1,1, 1,0,0, 1,0,0, 1,0,0, 1,1,1]),
    ('D', [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,1,0]),
    ('E', [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1]),
    ('G', [1,1,1, 1,0,0, 1,0,1, 1,0,1, 1,1,1]),
    ('I', [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1]),
    ('K', [1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1]),
    ('L', [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1]),
    ('M', [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1]),
    ('N', [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,0,1]),
    ('O', [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1]),
    ('P', [1,1,1, 1,0,1, 1,1,1, 1,0,0, 1,0,0]),
    ('R', [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1]),
    ('S', [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1]),
    ('T', [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0]),
    ('U', [1,0,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1]),
    ('V', [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0]),
    ('/', [0,0,1, 0,0,1, 0,1,0, 1,0,0, 1,0,0]),
    (':', [0,0,0, 0,1,0, 0,0,0, 0,1,0, 0,0,0]),
];

fn glyph(ch: char) -> Option<&'static [u8; 15]> {
    if let Some(d) = ch.to_digit(10) {
        return Some(&DIGITS[d as usize]);
    }
    LETTERS
        .iter()
        .find(|(c, _)| *c == ch.to_ascii_uppercase())
        .map(|(_, g)| g)
}

/// Width in pixels of `text` at glyph pixel size `px`.
pub fn text_width(text: &str, px: i32) -> i32 {
    (text.chars().count() as i32 * 4 - 1).max(0) * px
}

/// Draws `text` with a drop shadow. Unknown characters render as blanks.
pub fn draw_text(buf: &mut PixelBuf, x: i32, y: i32, text: &str, fg: Rgb, px: i32) {
    for (i, ch) in text.chars().enumerate() {
        let Some(g) = glyph(ch) else { continue };
        let gx = x + i as i32 * 4 * px;
        for row in 0..5 {
            for col in 0..3 {
                if g[row * 3 + col] == 1 {
                    let cx = gx + col as i32 * px;
                    let cy = y + row as i32 * px;
                    buf.fill_rect(cx + px, cy + px, px, px, SHADOW);
                    buf.fill_rect(cx, cy, px, px, fg);
                }
            }
        }
    }
}

fn draw_text_centered(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, fg: Rgb, px: i32) {
    draw_text(buf, cx - text_width(text, px) / 2, y, text, fg, px);
}

/// Glyph pixel size that keeps HUD text readable on large canvases.
pub fn text_px(dims: &Dimensions) -> i32 {
    ((dims.scale * 10.0) as i32).max(1)
}

// ── Sprites ─────────────────────────────────────────────────────────────────

/// Stretches `sprite` over the rectangle, optionally upside down.
pub fn blit(buf: &mut PixelBuf, sprite: &Sprite, x: i32, y: i32, w: i32, h: i32, flip_v: bool) {
    if w <= 0 || h <= 0 {
        return;
    }
    for dy in 0..h {
        let mut sy = dy as usize * sprite.height / h as usize;
        if flip_v {
            sy = sprite.height - 1 - sy;
        }
        for dx in 0..w {
            let sx = dx as usize * sprite.width / w as usize;
            if let Some(c) = sprite.get(sx, sy) {
                buf.set(x + dx, y + dy, c);
            }
        }
    }
}

/// Draws `sprite` as a `size`-square centred on (cx, cy), rotated clockwise
/// by `angle` radians.
pub fn blit_rotated(buf: &mut PixelBuf, sprite: &Sprite, cx: f64, cy: f64, size: f64, angle: f64) {
    if size <= 0.0 {
        return;
    }
    let half = size / 2.0;
    let reach = (half * SQRT_2).ceil() as i32 + 1;
    let (sin, cos) = angle.sin_cos();
    let (ox, oy) = (cx.floor() as i32, cy.floor() as i32);

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let px = (ox + dx) as f64 + 0.5 - cx;
            let py = (oy + dy) as f64 + 0.5 - cy;
            let lx = px * cos + py * sin;
            let ly = -px * sin + py * cos;
            if lx < -half || lx >= half || ly < -half || ly >= half {
                continue;
            }
            let sx = ((lx + half) / size * sprite.width as f64) as usize;
            let sy = ((ly + half) / size * sprite.height as f64) as usize;
            if let Some(c) = sprite.get(sx, sy) {
                buf.set(ox + dx, oy + dy, c);
            }
        }
    }
}

// ── World ───────────────────────────────────────────────────────────────────

/// Everything the world renderer reads for one frame.
pub struct Scene<'a> {
    pub state: &'a GameState,
    pub tuning: &'a Tuning,
    pub dims: &'a Dimensions,
    pub assets: &'a Assets,
}

pub fn bird_tilt(velocity: f64, scale: f64) -> f64 {
    let unscaled = if scale > 0.0 { velocity / scale } else { 0.0 };
    (unscaled * TILT_PER_VELOCITY).clamp(-MAX_TILT, MAX_TILT)
}

/// Background, pipes and bird, clipped to the canvas.
pub fn draw_world(buf: &mut PixelBuf, scene: &Scene) {
    buf.clear(LETTERBOX);
    buf.set_clip(Some(scene.dims));
    draw_background(buf, scene);
    for pipe in &scene.state.pipes {
        match &scene.assets.tube {
            Some(tube) => draw_pipe_sprite(buf, scene, pipe, tube),
            None => draw_pipe_fallback(buf, scene, pipe),
        }
    }
    match &scene.assets.bird {
        Some(bird) => {
            let d = scene.dims;
            let t = scene.tuning;
            blit_rotated(
                buf,
                bird,
                d.offset_x as f64 + t.bird_x,
                d.offset_y as f64 + scene.state.bird_position,
                t.bird_size,
                bird_tilt(scene.state.bird_velocity, t.scale),
            );
        }
        None => draw_bird_fallback(buf, scene),
    }
    buf.set_clip(None);
}

fn draw_background(buf: &mut PixelBuf, scene: &Scene) {
    let d = scene.dims;
    let (x, y) = (d.offset_x as i32, d.offset_y as i32);
    let (w, h) = (d.width as i32, d.height as i32);
    match &scene.assets.background {
        Some(bg) => blit(buf, bg, x, y, w, h, false),
        None => {
            let ground_h = (FALLBACK_GROUND_H * d.scale) as i32;
            buf.fill_rect(x, y, w, h, SKY);
            buf.fill_rect(x, y + h - ground_h, w, ground_h, GROUND);
        }
    }
}

fn draw_pipe_sprite(buf: &mut PixelBuf, scene: &Scene, pipe: &Pipe, tube: &Sprite) {
    let d = scene.dims;
    let x = d.to_screen_x(pipe.x);
    let w = scene.tuning.pipe_width.round() as i32;
    let top = d.offset_y as i32;
    let gap_top = d.to_screen_y(pipe.gap_start);
    let gap_bot = d.to_screen_y(pipe.gap_end());
    let bottom = top + d.height as i32;

    // Upper pipe hangs from the gap, mirrored.
    blit(buf, tube, x, top, w, gap_top - top, true);
    blit(buf, tube, x, gap_bot, w, bottom - gap_bot, false);
}

fn pipe_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return PIPE_M;
    }
    let t = (x as f64 / (total_w - 1) as f64 * 256.0) as u16;
    if t < 64 {
        Rgb::lerp(PIPE_L, PIPE_M, (t * 4).min(256))
    } else if t < 100 {
        Rgb::lerp(PIPE_M, PIPE_HI, ((t - 64) * 7).min(256))
    } else if t < 160 {
        Rgb::lerp(PIPE_HI, PIPE_R, ((t - 100) * 4).min(256))
    } else {
        Rgb::lerp(PIPE_R, PIPE_L, ((t - 160) * 3).min(256))
    }
}

fn draw_pipe_fallback(buf: &mut PixelBuf, scene: &Scene, pipe: &Pipe) {
    let d = scene.dims;
    let s = scene.tuning.scale;
    let px = d.to_screen_x(pipe.x);
    let pw = scene.tuning.pipe_width.round().max(1.0) as i32;
    let cap_extra = (4.0 * s).round() as i32;
    let cap_h = (24.0 * s).max(1.0) as i32;
    let top = d.offset_y as i32;
    let bottom = top + d.height as i32;
    let gap_top = d.to_screen_y(pipe.gap_start);
    let gap_bot = d.to_screen_y(pipe.gap_end());

    for x in 0..pw {
        let c = pipe_shade(x, pw);
        for y in top..gap_top - cap_h {
            buf.set(px + x, y, c);
        }
        for y in gap_bot + cap_h..bottom {
            buf.set(px + x, y, c);
        }
    }
    for x in -cap_extra..(pw + cap_extra) {
        let c = pipe_shade(x + cap_extra, pw + cap_extra * 2);
        for y in (gap_top - cap_h)..gap_top {
            buf.set(px + x, y, c);
        }
        for y in gap_bot..(gap_bot + cap_h) {
            buf.set(px + x, y, c);
        }
        if cap_h > 2 {
            buf.set(px + x, gap_top - 1, CAP_DARK);
            buf.set(px + x, gap_bot, CAP_DARK);
        }
    }
}

fn draw_bird_fallback(buf: &mut PixelBuf, scene: &Scene) {
    let d = scene.dims;
    let t = scene.tuning;
    let cx = d.to_screen_x(t.bird_x);
    let cy = d.to_screen_y(scene.state.bird_position);
    // One unit is a twelfth of the sprite box.
    let u = t.bird_size / 12.0;

    let tilt = (bird_tilt(scene.state.bird_velocity, t.scale) * 2.0).round() as i32;

    let bw = (3.0 * u).max(1.0) as i32;
    let bh = (2.0 * u).max(1.0) as i32;
    buf.fill_rect(cx - bw, cy - bh, bw * 2 + 1, bh * 2, BIRD_Y);
    buf.fill_rect(cx - bw + 1, cy - bh, bw * 2 - 1, (u * 0.8).max(1.0) as i32, BIRD_HI);

    // Wing up while climbing.
    let wing_y = if scene.state.bird_velocity < 0.0 { -1 } else { 1 };
    let wing_w = (2.0 * u).max(1.0) as i32;
    let wing_h = (1.5 * u).max(1.0) as i32;
    buf.fill_rect(cx - bw + 1, cy + wing_y + tilt, wing_w, wing_h, BIRD_WING);

    let eye = (0.8 * u).max(1.0) as i32;
    let ex = cx + bw - (1.5 * u) as i32;
    let ey = cy - bh + u.max(1.0) as i32;
    buf.fill_rect(ex, ey, eye, eye, BIRD_EYE);
    buf.set(ex + eye - 1, ey + eye - 1, BIRD_PUPIL);

    let beak_w = (2.5 * u).max(1.0) as i32;
    let beak_h = (1.5 * u).max(1.0) as i32;
    buf.fill_rect(cx + bw + 1, cy + tilt, beak_w, beak_h, BIRD_BEAK);
}

// ── Overlays ────────────────────────────────────────────────────────────────

pub fn draw_hud(buf: &mut PixelBuf, dims: &Dimensions, state: &GameState, muted: bool) {
    let px = text_px(dims);
    let x = dims.offset_x as i32 + 2 * px;
    let y = dims.offset_y as i32 + 2 * px;
    let level = format!("LEVEL {}", state.level);
    let score = format!("SCORE {}", state.score);
    draw_text(buf, x, y, &level, WHITE, px);
    draw_text(buf, x + text_width(&level, px) + 6 * px, y, &score, WHITE, px);
    if muted {
        let right = (dims.offset_x + dims.width) as i32;
        draw_text(buf, right - text_width("MUTE", px) - 2 * px, y, "MUTE", MUTED, px);
    }
}

pub fn draw_loading(buf: &mut PixelBuf, dims: &Dimensions, loaded: usize, total: usize) {
    let (x, y) = (dims.offset_x as i32, dims.offset_y as i32);
    buf.fill_rect(x, y, dims.width as i32, dims.height as i32, SKY);
    buf.darken_rect(x, y, dims.width as i32, dims.height as i32);
    let px = text_px(dims);
    let cx = x + dims.width as i32 / 2;
    let cy = y + dims.height as i32 / 2;
    draw_text_centered(buf, cx, cy - 6 * px, "LOADING", WHITE, px);
    draw_text_centered(buf, cx, cy + px, &format!("{loaded}/{total}"), WHITE, px);
}

pub fn draw_game_over(buf: &mut PixelBuf, dims: &Dimensions, state: &GameState) {
    let px = text_px(dims);
    let score = format!("SCORE {}", state.score);
    let level = format!("LEVEL {}", state.level);
    let lines = [
        ("GAME OVER", BIRD_Y),
        (score.as_str(), WHITE),
        (level.as_str(), WHITE),
        ("SPACE OR CLICK", WHITE),
    ];
    let line_h = 7 * px;
    let panel_w = lines
        .iter()
        .map(|(text, _)| text_width(text, px))
        .max()
        .unwrap_or(0)
        + 6 * px;
    let panel_h = line_h * lines.len() as i32 + 4 * px;
    let cx = dims.offset_x as i32 + dims.width as i32 / 2;
    let cy = dims.offset_y as i32 + dims.height as i32 / 2;
    let (x, y) = (cx - panel_w / 2, cy - panel_h / 2);

    // Two passes leave a quarter of the brightness.
    buf.darken_rect(x, y, panel_w, panel_h);
    buf.darken_rect(x, y, panel_w, panel_h);
    for (i, (text, color)) in lines.iter().enumerate() {
        draw_text_centered(buf, cx, y + 3 * px + i as i32 * line_h, text, *color, px);
    }
}

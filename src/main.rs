use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute, terminal,
};
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use flapline::assets::AssetLoader;
use flapline::config::Config;
use flapline::input::intent_for;
use flapline::layout::Dimensions;
use flapline::logging;
use flapline::render::PixelBuf;
use flapline::{Flow, FrameClock, Game};

fn main() -> Result<()> {
    let config = Config::load()?;
    logging::init(config.log_file.as_deref(), config.level_filter()?)?;
    info!("Starting with {config:?}");

    terminal::enable_raw_mode().context("terminal does not support raw mode")?;
    let mut out = stdout();
    let entered = execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )
    .context("cannot take over the terminal screen");

    let result = entered.and_then(|_| run(&mut out, &config));
    let restored = cleanup(&mut out);
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result?;
    restored.context("cannot restore the terminal")?;
    info!("Bye");
    log::logger().flush();
    Ok(())
}

fn cleanup(out: &mut impl Write) -> io::Result<()> {
    execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

fn run(out: &mut impl Write, config: &Config) -> Result<()> {
    let (cols, rows) = terminal::size().context("cannot read terminal size")?;
    let mut buf = PixelBuf::new(cols as usize, rows as usize * 2);

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let loader = AssetLoader::spawn(&config.assets_dir);
    let mut game = Game::new(Dimensions::from_terminal(cols, rows), rng, loader, config.muted);

    let frame_dur = config.frame_duration();
    let mut clock = FrameClock::default();

    loop {
        let frame_start = Instant::now();

        // Input
        while event::poll(Duration::ZERO)? {
            let event = event::read()?;
            if let Event::Resize(c, r) = event {
                buf.resize(c as usize, r as usize * 2);
            }
            if let Some(intent) = intent_for(&event) {
                if game.handle(intent) == Flow::Quit {
                    info!("Quit requested");
                    return Ok(());
                }
            }
        }

        // Update
        let dt = if game.poll_assets() {
            clock.delta_ms(frame_start)
        } else {
            clock.reset();
            0.0
        };
        game.tick(dt);

        // Render
        game.draw(&mut buf);
        buf.render(out)?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

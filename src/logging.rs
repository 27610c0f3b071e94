//! Log records go to a file. The terminal is the game screen, so nothing may
//! be written to stderr.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;

/// A logger builder appending plain lines to `path`.
pub fn builder(path: &Path, level: LevelFilter) -> Result<Builder> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .format_timestamp_millis()
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(file)));
    Ok(builder)
}

/// Installs the global logger. With no path, logging stays off.
pub fn init(path: Option<&Path>, level: LevelFilter) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    builder(path, level)?
        .try_init()
        .context("cannot install logger")
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Record};

    #[test]
    fn test_filters_below_level() {
        let path = std::env::temp_dir().join(format!("flapline-log-{}.log", std::process::id()));
        let logger = builder(&path, LevelFilter::Warn).unwrap().build();
        assert_eq!(logger.filter(), LevelFilter::Warn);
        logger.log(
            &Record::builder()
                .args(format_args!("game over at score {}", 7))
                .level(Level::Error)
                .target("flapline::game")
                .module_path(Some("flapline::game"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("dropped"))
                .level(Level::Debug)
                .target("flapline::game")
                .build(),
        );
        logger.flush();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(text.contains("ERROR flapline::game"));
        assert!(text.contains("game over at score 7"));
        assert!(!text.contains("dropped"));
        assert!(!text.contains('\u{1b}'), "no colour codes in the file");
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let err = builder(Path::new("/definitely/not/here/flapline.log"), LevelFilter::Info)
            .unwrap_err();
        assert!(err.to_string().contains("cannot open log file"));
    }
}

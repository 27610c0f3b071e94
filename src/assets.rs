//! Sprite and music loading.
//!
//! Loading happens on a worker thread that reports every asset as it
//! finishes, successful or not. The game polls the loader each frame to show
//! progress and starts once everything has reported.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError, unbounded};
use image::{Rgba, RgbaImage};
use log::{debug, info, warn};

use crate::error::AssetError;
use crate::render::Rgb;

pub const BACKGROUND_FILE: &str = "bg.jpg";
pub const BIRD_FILE: &str = "bird.png";
pub const TUBE_FILE: &str = "tube.png";
pub const MUSIC_FILE: &str = "music.ogg";

/// Pixels with less alpha than this are left unpainted.
const OPAQUE_FROM: u8 = 128;

// ── Sprites ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub width: usize,
    pub height: usize,
    px: Vec<Option<Rgb>>,
}

impl Sprite {
    pub fn from_pixels(width: usize, height: usize, px: Vec<Option<Rgb>>) -> Option<Self> {
        (width > 0 && height > 0 && px.len() == width * height).then_some(Sprite {
            width,
            height,
            px,
        })
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            self.px[y * self.width + x]
        } else {
            None
        }
    }

    /// Any PNG or JPEG. Mostly transparent pixels become holes.
    pub fn from_rgba(img: &RgbaImage) -> Option<Self> {
        let px = img
            .pixels()
            .map(|&Rgba([r, g, b, a])| (a >= OPAQUE_FROM).then_some(Rgb(r, g, b)))
            .collect();
        Sprite::from_pixels(img.width() as usize, img.height() as usize, px)
    }
}

pub fn load_sprite(path: &Path) -> Result<Sprite, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let img = image::load_from_memory(&bytes)
        .map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    Sprite::from_rgba(&img).ok_or_else(|| AssetError::Format {
        path: path.to_path_buf(),
        reason: "empty image".into(),
    })
}

pub fn load_music(path: &Path) -> Result<Arc<[u8]>, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AssetError::Format {
            path: path.to_path_buf(),
            reason: "empty file".into(),
        });
    }
    Ok(bytes.into())
}

// ── Loader ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Background,
    Bird,
    Tube,
    Music,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Background,
        AssetKind::Bird,
        AssetKind::Tube,
        AssetKind::Music,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::Background => BACKGROUND_FILE,
            AssetKind::Bird => BIRD_FILE,
            AssetKind::Tube => TUBE_FILE,
            AssetKind::Music => MUSIC_FILE,
        }
    }
}

/// Whatever loaded. Missing entries are drawn or played with fallbacks.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub background: Option<Sprite>,
    pub bird: Option<Sprite>,
    pub tube: Option<Sprite>,
    pub music: Option<Arc<[u8]>>,
}

enum Loaded {
    Sprite(AssetKind, Result<Sprite, AssetError>),
    Music(Result<Arc<[u8]>, AssetError>),
}

fn load_one(dir: &Path, kind: AssetKind) -> Loaded {
    let path = dir.join(kind.file_name());
    match kind {
        AssetKind::Music => Loaded::Music(load_music(&path)),
        _ => Loaded::Sprite(kind, load_sprite(&path)),
    }
}

pub struct AssetLoader {
    rx: Receiver<Loaded>,
    assets: Assets,
    reported: usize,
    loaded: usize,
}

impl AssetLoader {
    pub const TOTAL: usize = AssetKind::ALL.len();

    pub fn spawn(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let (tx, rx) = unbounded();
        info!("Loading assets from {}", dir.display());
        thread::spawn(move || {
            for kind in AssetKind::ALL {
                if tx.send(load_one(&dir, kind)).is_err() {
                    debug!("Asset loader dropped, stopping");
                    return;
                }
            }
        });
        AssetLoader {
            rx,
            assets: Assets::default(),
            reported: 0,
            loaded: 0,
        }
    }

    /// Assets that finished successfully so far.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Drains finished loads. True once every asset has reported.
    pub fn poll(&mut self) -> bool {
        while self.reported < Self::TOTAL {
            match self.rx.try_recv() {
                Ok(loaded) => self.record(loaded),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    for kind in &AssetKind::ALL[self.reported..] {
                        let err = AssetError::Abandoned {
                            name: kind.file_name(),
                        };
                        warn!("{err}");
                    }
                    self.reported = Self::TOTAL;
                }
            }
        }
        self.reported == Self::TOTAL
    }

    fn record(&mut self, loaded: Loaded) {
        self.reported += 1;
        match loaded {
            Loaded::Sprite(kind, Ok(sprite)) => {
                debug!("Loaded {:?} sprite {}x{}", kind, sprite.width, sprite.height);
                self.loaded += 1;
                let slot = match kind {
                    AssetKind::Background => &mut self.assets.background,
                    AssetKind::Bird => &mut self.assets.bird,
                    _ => &mut self.assets.tube,
                };
                *slot = Some(sprite);
            }
            Loaded::Music(Ok(bytes)) => {
                debug!("Loaded music track ({} bytes)", bytes.len());
                self.loaded += 1;
                self.assets.music = Some(bytes);
            }
            Loaded::Sprite(kind, Err(err)) => {
                warn!("Failed to load {:?} sprite, using fallback: {err}", kind);
            }
            Loaded::Music(Err(err)) => {
                warn!("Failed to load music, audio disabled: {err}");
            }
        }
        if self.reported == Self::TOTAL {
            info!("Assets ready ({}/{} loaded)", self.loaded, Self::TOTAL);
        }
    }

    /// The loaded assets. Call once [`poll`](Self::poll) returns true.
    pub fn take(&mut self) -> Assets {
        std::mem::take(&mut self.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flapline-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn wait_ready(loader: &mut AssetLoader) {
        let start = Instant::now();
        while !loader.poll() {
            assert!(start.elapsed() < Duration::from_secs(5), "loader never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_alpha_becomes_transparency() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([40, 50, 60, 0]));
        img.put_pixel(2, 0, Rgba([70, 80, 90, 200]));
        let sprite = Sprite::from_rgba(&img).unwrap();
        assert_eq!((sprite.width, sprite.height), (3, 1));
        assert_eq!(sprite.get(0, 0), Some(Rgb(10, 20, 30)));
        assert_eq!(sprite.get(1, 0), None);
        assert_eq!(sprite.get(2, 0), Some(Rgb(70, 80, 90)));
        assert_eq!(sprite.get(5, 5), None);
    }

    #[test]
    fn test_load_png_from_disk() {
        let dir = temp_dir("png");
        let path = dir.join(BIRD_FILE);
        fs::write(&path, png(&RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255])))).unwrap();
        let sprite = load_sprite(&path).unwrap();
        assert_eq!((sprite.width, sprite.height), (4, 2));
        assert_eq!(sprite.get(3, 1), Some(Rgb(1, 2, 3)));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_bad_image_is_decode_error() {
        let dir = temp_dir("bad");
        let path = dir.join(TUBE_FILE);
        // PNG signature followed by a header claiming absurd dimensions.
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 13]);
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&[0xff; 8]);
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        fs::write(&path, bytes).unwrap();
        let err = load_sprite(&path).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
        assert!(err.to_string().contains("tube.png"));

        fs::write(&path, b"garbage").unwrap();
        assert!(matches!(load_sprite(&path), Err(AssetError::Decode { .. })));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_sprite(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
        assert!(err.to_string().contains("here.png"));
    }

    #[test]
    fn test_loader_degrades_when_directory_missing() {
        let mut loader = AssetLoader::spawn("/definitely/not/here");
        wait_ready(&mut loader);
        assert_eq!(loader.loaded(), 0);
        let assets = loader.take();
        assert!(assets.background.is_none());
        assert!(assets.bird.is_none());
        assert!(assets.tube.is_none());
        assert!(assets.music.is_none());
    }

    #[test]
    fn test_bad_sprite_does_not_stop_later_assets() {
        let dir = temp_dir("partial");
        fs::write(dir.join(BACKGROUND_FILE), b"\x89PNG\r\n\x1a\nbroken").unwrap();
        fs::write(dir.join(BIRD_FILE), png(&RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255])))).unwrap();
        fs::write(dir.join(TUBE_FILE), png(&RgbaImage::from_pixel(2, 3, Rgba([4, 5, 6, 255])))).unwrap();
        fs::write(dir.join(MUSIC_FILE), b"not really ogg").unwrap();

        let mut loader = AssetLoader::spawn(&dir);
        wait_ready(&mut loader);
        assert_eq!(loader.loaded(), 3);
        let assets = loader.take();
        assert!(assets.background.is_none());
        assert!(assets.bird.is_some());
        assert_eq!(assets.tube.map(|t| (t.width, t.height)), Some((2, 3)));
        assert_eq!(assets.music.as_deref(), Some(&b"not really ogg"[..]));

        fs::remove_dir_all(dir).ok();
    }
}

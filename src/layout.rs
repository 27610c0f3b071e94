use crate::physics::{CANVAS_HEIGHT, CANVAS_WIDTH, Tuning};

/// Canvas placement inside the viewport, in terminal pixels
/// (one column wide, half a row tall).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    pub offset_x: usize,
    pub offset_y: usize,
}

impl Dimensions {
    pub fn from_viewport(max_width: usize, max_height: usize) -> Self {
        let scale = (max_width as f64 / CANVAS_WIDTH).min(max_height as f64 / CANVAS_HEIGHT);
        let width = (CANVAS_WIDTH * scale) as usize;
        let height = (CANVAS_HEIGHT * scale) as usize;
        Dimensions {
            width,
            height,
            scale,
            offset_x: max_width.saturating_sub(width) / 2,
            offset_y: max_height.saturating_sub(height) / 2,
        }
    }

    /// Terminal size in cells to viewport in pixels.
    pub fn from_terminal(cols: u16, rows: u16) -> Self {
        Self::from_viewport(cols as usize, rows as usize * 2)
    }

    /// A zero-sized canvas has nothing to draw on.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn tuning(&self) -> Tuning {
        Tuning::scaled(self.scale)
    }

    /// Canvas-space x to viewport column.
    pub fn to_screen_x(&self, x: f64) -> i32 {
        self.offset_x as i32 + x.floor() as i32
    }

    pub fn to_screen_y(&self, y: f64) -> i32 {
        self.offset_y as i32 + y.floor() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_limited_by_height() {
        let d = Dimensions::from_viewport(800, 300);
        assert_eq!(d.scale, 0.5);
        assert_eq!((d.width, d.height), (400, 300));
        assert_eq!(d.offset_x, 200);
        assert_eq!(d.offset_y, 0);
    }

    #[test]
    fn test_scale_limited_by_width() {
        let d = Dimensions::from_viewport(400, 600);
        assert_eq!(d.scale, 0.5);
        assert_eq!((d.width, d.height), (400, 300));
        assert_eq!(d.offset_y, 150);
    }

    #[test]
    fn test_terminal_rows_are_two_pixels() {
        let d = Dimensions::from_terminal(160, 60);
        assert_eq!(d.scale, 0.2);
        assert_eq!((d.width, d.height), (160, 120));
    }

    #[test]
    fn test_half_viewport_halves_tuning() {
        let full = Dimensions::from_viewport(800, 600).tuning();
        let half = Dimensions::from_viewport(400, 300).tuning();
        assert_eq!(half.gravity * 2.0, full.gravity);
        assert_eq!(half.bird_size * 2.0, full.bird_size);
        assert_eq!(half.pipe_width * 2.0, full.pipe_width);
        assert_eq!(half.gap_height / half.canvas_height, full.gap_height / full.canvas_height);
    }

    #[test]
    fn test_empty_viewport_not_drawable() {
        assert!(!Dimensions::from_viewport(0, 40).is_drawable());
        assert!(!Dimensions::from_terminal(1, 1).is_drawable());
        assert!(Dimensions::from_terminal(80, 24).is_drawable());
    }
}

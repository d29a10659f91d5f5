/// Projected bounds of a SIC grid, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridExtent {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl GridExtent {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Result<Self, String> {
        if [left, right, top, bottom].iter().any(|v| !v.is_finite()) {
            return Err("Grid boundaries must be finite".to_string());
        }

        if left >= right {
            return Err("Left boundary must be < right boundary".to_string());
        }

        if bottom >= top {
            return Err("Bottom boundary must be < top boundary".to_string());
        }

        Ok(GridExtent {
            left,
            right,
            top,
            bottom,
        })
    }

    /// `[left, right, top, bottom]`, the upper-left/lower-right order image
    /// plotting expects.
    pub fn as_image_extent(&self) -> [f64; 4] {
        [self.left, self.right, self.top, self.bottom]
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.left..=self.right).contains(&x) && (self.bottom..=self.top).contains(&y)
    }
}

//! Row-major raster grids.
//!
//! One generic container covers every element kind the lane pipeline
//! touches: interleaved color frames, gray intensity images and binary
//! masks. Pixel `(x, y)` lives at `data[y * width + x]`, and integer
//! coordinates refer to pixel centers when sampling.

/// One interleaved 8-bit color sample.
pub type Rgb8 = [u8; 3];

/// Errors produced when wrapping raw buffers into grids.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("invalid grid buffer length (expected {expected} elements, got {got})")]
    SizeMismatch { expected: usize, got: usize },

    #[error("invalid grid dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

/// Owned 2-D grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<T>, // row-major, len = w*h
}

/// Borrowed 2-D grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a, T> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [T], // row-major, len = w*h
}

pub type ColorImage = Grid<Rgb8>;
pub type ColorImageView<'a> = GridView<'a, Rgb8>;
pub type GrayImage = Grid<u8>;
pub type GrayImageView<'a> = GridView<'a, u8>;
pub type BinaryImage = Grid<bool>;
pub type BinaryImageView<'a> = GridView<'a, bool>;

fn checked_len(width: usize, height: usize) -> Result<usize, GridError> {
    width
        .checked_mul(height)
        .ok_or(GridError::InvalidDimensions { width, height })
}

impl<T> Grid<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, GridError> {
        let expected = checked_len(width, height)?;
        if data.len() != expected {
            return Err(GridError::SizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn view(&self) -> GridView<'_, T> {
        GridView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// True when the grid has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T: Copy> Grid<T> {
    /// Element-wise conversion into another element kind.
    pub fn map<U>(&self, f: impl FnMut(T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().copied().map(f).collect(),
        }
    }
}

impl<'a, T> GridView<'a, T> {
    pub fn new(width: usize, height: usize, data: &'a [T]) -> Result<Self, GridError> {
        let expected = checked_len(width, height)?;
        if data.len() != expected {
            return Err(GridError::SizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl<T: Clone> GridView<'_, T> {
    pub fn to_grid(&self) -> Grid<T> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

impl<'a> ColorImageView<'a> {
    /// Wrap an interleaved 3-channel byte buffer in RGB order without copying.
    pub fn from_interleaved(
        width: usize,
        height: usize,
        bytes: &'a [u8],
    ) -> Result<Self, GridError> {
        let expected = checked_len(width, height)?
            .checked_mul(3)
            .ok_or(GridError::InvalidDimensions { width, height })?;
        if bytes.len() != expected {
            return Err(GridError::SizeMismatch {
                expected,
                got: bytes.len(),
            });
        }
        let (pixels, _) = bytes.as_chunks::<3>();
        Self::new(width, height, pixels)
    }
}

impl ColorImage {
    /// Build a frame from an interleaved buffer in BGR order (camera convention).
    pub fn from_bgr(width: usize, height: usize, bytes: &[u8]) -> Result<Self, GridError> {
        let view = ColorImageView::from_interleaved(width, height, bytes)?;
        Ok(view.to_grid().map(|[b, g, r]| [r, g, b]))
    }
}

impl BinaryImage {
    /// Number of set pixels.
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Render as a 0/255 gray image.
    pub fn to_gray(&self) -> GrayImage {
        self.map(|v| if v { 255 } else { 0 })
    }
}

/// Element kinds that can be bilinearly interpolated.
///
/// Binary pixels interpolate as 0/255 so that warped masks follow the same
/// rounding rule as 8-bit intensity images.
pub trait Intensity: Copy {
    fn intensity(self) -> f32;
}

impl Intensity for u8 {
    #[inline]
    fn intensity(self) -> f32 {
        self as f32
    }
}

impl Intensity for bool {
    #[inline]
    fn intensity(self) -> f32 {
        if self {
            255.0
        } else {
            0.0
        }
    }
}

#[inline]
fn get_or_zero<T: Intensity>(src: &GridView<'_, T>, x: i64, y: i64) -> f32 {
    if x < 0 || y < 0 || x >= src.width as i64 || y >= src.height as i64 {
        return 0.0;
    }
    src.data[y as usize * src.width + x as usize].intensity()
}

/// Bilinear sample with a constant zero border.
#[inline]
pub fn sample_bilinear<T: Intensity>(src: &GridView<'_, T>, x: f32, y: f32) -> f32 {
    // Also rejects NaN.
    if !(x > -1.0 && y > -1.0 && x < src.width as f32 && y < src.height as f32) {
        return 0.0;
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_or_zero(src, x0, y0);
    let p10 = get_or_zero(src, x0 + 1, y0);
    let p01 = get_or_zero(src, x0, y0 + 1);
    let p11 = get_or_zero(src, x0 + 1, y0 + 1);

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

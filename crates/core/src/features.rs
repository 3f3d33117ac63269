//! Flattening of environment states into numeric feature vectors.
//!
//! Rules:
//! - numbers and booleans become a single element
//! - arrays and vectors concatenate their elements in order, so a board
//!   stored as rows flattens row-major
//! - a pair `(board, player)` flattens the board and then appends the player

/// Feature width used when none is configured.
pub const DEFAULT_FEATURE_WIDTH: usize = 10;

/// Conversion of a value into a flat list of `f32` features.
pub trait Featurize {
    /// Flatten `self`, appending to `out`.
    fn write_features(&self, out: &mut Vec<f32>);

    /// Flatten `self` into a new vector.
    fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::new();
        self.write_features(&mut out);
        out
    }
}

macro_rules! scalar_features {
    ($($t:ty),*) => {
        $(
            impl Featurize for $t {
                fn write_features(&self, out: &mut Vec<f32>) {
                    out.push(*self as f32);
                }
            }
        )*
    };
}

scalar_features!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Featurize for bool {
    fn write_features(&self, out: &mut Vec<f32>) {
        out.push(if *self { 1.0 } else { 0.0 });
    }
}

impl<T: Featurize> Featurize for [T] {
    fn write_features(&self, out: &mut Vec<f32>) {
        for item in self {
            item.write_features(out);
        }
    }
}

impl<T: Featurize, const N: usize> Featurize for [T; N] {
    fn write_features(&self, out: &mut Vec<f32>) {
        self.as_slice().write_features(out);
    }
}

impl<T: Featurize> Featurize for Vec<T> {
    fn write_features(&self, out: &mut Vec<f32>) {
        self.as_slice().write_features(out);
    }
}

/// An empty cell counts as `0.0`.
impl<T: Featurize> Featurize for Option<T> {
    fn write_features(&self, out: &mut Vec<f32>) {
        match self {
            Some(value) => value.write_features(out),
            None => out.push(0.0),
        }
    }
}

impl<A: Featurize, B: Featurize> Featurize for (A, B) {
    fn write_features(&self, out: &mut Vec<f32>) {
        self.0.write_features(out);
        self.1.write_features(out);
    }
}

/// Fit a feature vector to exactly `width` elements.
///
/// Shorter vectors are zero-padded on the right, longer ones truncated.
pub fn fixed_width(mut features: Vec<f32>, width: usize) -> Vec<f32> {
    features.resize(width, 0.0);
    features
}

use core::ops::{Add, Mul, Sub};

/// Sub-pixel image position; `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub fn from_row_col(row: f32, col: f32) -> Self {
        Self { x: col, y: row }
    }

    pub fn row(self) -> f32 {
        self.y
    }

    pub fn col(self) -> f32 {
        self.x
    }

    /// Nearest pixel center as signed `(x, y)` indices.
    pub fn round(self) -> (isize, isize) {
        (self.x.round() as isize, self.y.round() as isize)
    }

    pub fn sqr_distance(self, other: Self) -> f32 {
        let d = self - other;
        d.dot(d)
    }

    pub fn distance(self, other: Self) -> f32 {
        self.sqr_distance(other).sqrt()
    }
}

impl Vec2f {
    pub fn from_row_col(row: f32, col: f32) -> Self {
        Self { x: col, y: row }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Rotates by +90 degrees in image coordinates.
    pub fn perp(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }
}

impl Add<Vec2f> for Point2f {
    type Output = Point2f;

    fn add(self, rhs: Vec2f) -> Self::Output {
        Point2f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Add<Vec2f> for Vec2f {
    type Output = Vec2f;

    fn add(self, rhs: Vec2f) -> Self::Output {
        Vec2f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub<Vec2f> for Point2f {
    type Output = Point2f;

    fn sub(self, rhs: Vec2f) -> Self::Output {
        Point2f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Sub<Point2f> for Point2f {
    type Output = Vec2f;

    fn sub(self, rhs: Point2f) -> Self::Output {
        Vec2f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2f {
    type Output = Vec2f;

    fn mul(self, rhs: f32) -> Self::Output {
        Vec2f {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Mul<Vec2f> for f32 {
    type Output = Vec2f;

    fn mul(self, rhs: Vec2f) -> Self::Output {
        rhs * self
    }
}

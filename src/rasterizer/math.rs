//! Homogeneous vector and 4x4 matrix math
//!
//! Conventions:
//! - Matrices are stored row-major (`m[row][col]`) and applied as `M * v`
//! - Left-handed space, +Z forward, +Y down on screen
//! - `w = 1` marks a point, `w = 0` a direction

use std::ops::{Add, Div, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};
use crate::error::MathError;

/// Largest entry of `A * A^-1 - I` an inverse may leave behind
pub const INVERSE_TOLERANCE: f64 = 1e-6;

/// Wide copy of a matrix for the inverse
type Wide = [[f64; 4]; 4];

/// Homogeneous 4-component vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
    pub const ORIGIN: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };
    pub const UP: Vec4 = Vec4 { x: 0.0, y: 1.0, z: 0.0, w: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// A position (w = 1)
    pub const fn point(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    /// A direction or normal (w = 0)
    pub const fn direction(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 0.0 }
    }

    pub fn from_array(a: [f32; 3], w: f32) -> Self {
        Self::new(a[0], a[1], a[2], w)
    }

    /// Dot product of the xyz parts (w is ignored)
    pub fn dot(self, other: Vec4) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product of the xyz parts; the result is always a direction
    pub fn cross(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
            w: 0.0,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec4 {
        let l = self.len();
        if l == 0.0 {
            return Vec4 { w: self.w, ..Vec4::ZERO };
        }
        Vec4 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
            w: self.w,
        }
    }

    pub fn scale(self, s: f32) -> Vec4 {
        Vec4 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            w: self.w * s,
        }
    }

    /// Linear interpolation of all four components
    pub fn lerp(self, other: Vec4, t: f32) -> Vec4 {
        self + (other - self) * t
    }

    /// Reinterpret as a direction (drops w)
    pub fn as_direction(self) -> Vec4 {
        Vec4 { w: 0.0, ..self }
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w,
        }
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w,
        }
    }
}

impl Neg for Vec4 {
    type Output = Vec4;
    fn neg(self) -> Vec4 {
        self.scale(-1.0)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f32) -> Vec4 {
        self.scale(s)
    }
}

impl Div<f32> for Vec4 {
    type Output = Vec4;
    fn div(self, s: f32) -> Vec4 {
        self.scale(1.0 / s)
    }
}

/// 4x4 matrix, row-major, column-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const ZERO: Mat4 = Mat4 { m: [[0.0; 4]; 4] };
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = Mat4::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[r][c] = self.m[c][r];
            }
        }
        out
    }

    fn widen(&self) -> Wide {
        self.m.map(|row| row.map(f64::from))
    }

    /// Determinant, accumulated in f64
    pub fn determinant(&self) -> f32 {
        det4(&self.widen()) as f32
    }

    /// General inverse via the Cayley–Hamilton identity, evaluated in f64
    /// and polished with one Newton step (`X' = X * (2I - A * X)`).
    ///
    /// Fails with [`MathError::Singular`] when the determinant is zero or
    /// when `A * A^-1` still strays from the identity by more than
    /// [`INVERSE_TOLERANCE`].
    pub fn inverse(&self) -> Result<Mat4, MathError> {
        let a = self.widen();
        let det = det4(&a);
        let singular = MathError::Singular { det: det as f32 };

        if !det.is_finite() || det == 0.0 {
            return Err(singular);
        }

        let a2 = mul_wide(&a, &a);
        let a3 = mul_wide(&a2, &a);
        let (t1, t2, t3) = (trace_wide(&a), trace_wide(&a2), trace_wide(&a3));

        let c0 = (t1 * t1 * t1 - 3.0 * t1 * t2 + 2.0 * t3) / 6.0;
        let c1 = (t1 * t1 - t2) / 2.0;

        let mut inv = [[0.0f64; 4]; 4];
        for r in 0..4 {
            for c in 0..4 {
                let identity = if r == c { c0 } else { 0.0 };
                inv[r][c] = (identity - c1 * a[r][c] + t1 * a2[r][c] - a3[r][c]) / det;
            }
        }

        // Cayley–Hamilton cancels badly for small scales; one Newton step
        // squares the error away
        let mut correction = mul_wide(&a, &inv);
        for (r, row) in correction.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = if r == c { 2.0 - *v } else { -*v };
            }
        }
        let inv = mul_wide(&inv, &correction);

        let check = mul_wide(&a, &inv);
        let residual = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .map(|(r, c)| (check[r][c] - if r == c { 1.0 } else { 0.0 }).abs())
            .fold(0.0f64, f64::max);
        if !residual.is_finite() || residual > INVERSE_TOLERANCE {
            return Err(singular);
        }

        let narrowed = Mat4 { m: inv.map(|row| row.map(|v| v as f32)) };
        if narrowed.m.iter().flatten().any(|v| !v.is_finite()) {
            return Err(singular);
        }
        Ok(narrowed)
    }

    /// Matrix that transforms normals consistently with `self`
    pub fn inverse_transpose(&self) -> Result<Mat4, MathError> {
        Ok(self.inverse()?.transpose())
    }

    pub fn translate(dx: f32, dy: f32, dz: f32) -> Mat4 {
        Mat4::from_rows([
            [1.0, 0.0, 0.0, dx],
            [0.0, 1.0, 0.0, dy],
            [0.0, 0.0, 1.0, dz],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
        Mat4::from_rows([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_x(radians: f32) -> Mat4 {
        let (s, c) = radians.sin_cos();
        Mat4::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_y(radians: f32) -> Mat4 {
        let (s, c) = radians.sin_cos();
        Mat4::from_rows([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_z(radians: f32) -> Mat4 {
        let (s, c) = radians.sin_cos();
        Mat4::from_rows([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// X first, then Y, then Z outermost: `Rz * (Ry * Rx)`
    pub fn rotate_xyz(rx: f32, ry: f32, rz: f32) -> Mat4 {
        Mat4::rotate_z(rz) * (Mat4::rotate_y(ry) * Mat4::rotate_x(rx))
    }

    /// Perspective projection with a horizontal field of view in degrees.
    ///
    /// Camera-space `z` ends up in `w`, and depth is remapped to
    /// `far * (z - near) / (far - near)`, so visible points satisfy
    /// `0 <= z <= w` and NDC depth runs from 0 (near) to 1 (far).
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let inv_tan = 1.0 / (fov_degrees.to_radians() * 0.5).tan();
        let depth = far / (far - near);
        Mat4::from_rows([
            [inv_tan, 0.0, 0.0, 0.0],
            [0.0, aspect * inv_tan, 0.0, 0.0],
            [0.0, 0.0, depth, -near * depth],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    /// World-to-camera matrix built straight from the camera basis.
    ///
    /// The camera-to-world transform is rigid, so its inverse is the
    /// transposed rotation plus a dotted translation.
    pub fn look_at(eye: Vec4, target: Vec4, up: Vec4) -> Mat4 {
        let forward = (target - eye).as_direction().normalize();
        let right = up.as_direction().cross(forward).normalize();
        let new_up = forward.cross(right);

        Mat4::from_rows([
            [right.x, right.y, right.z, -eye.dot(right)],
            [new_up.x, new_up.y, new_up.z, -eye.dot(new_up)],
            [forward.x, forward.y, forward.z, -eye.dot(forward)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Maps NDC `[-1, 1]^2` onto `[0, width] x [0, height]`, depth untouched
    pub fn viewport(width: usize, height: usize) -> Mat4 {
        Mat4::scale(width as f32 * 0.5, height as f32 * 0.5, 1.0) * Mat4::translate(1.0, 1.0, 0.0)
    }

    /// Approximate equality with a tolerance relative to the larger magnitude
    pub fn approx_eq(&self, other: &Mat4, tolerance: f32) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0))
    }
}

fn mul_wide(a: &Wide, b: &Wide) -> Wide {
    let mut out = [[0.0; 4]; 4];
    for r in 0..4 {
        for c in 0..4 {
            out[r][c] = (0..4).map(|k| a[r][k] * b[k][c]).sum();
        }
    }
    out
}

fn trace_wide(a: &Wide) -> f64 {
    a[0][0] + a[1][1] + a[2][2] + a[3][3]
}

fn det3(m: [[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Cofactor expansion along row 0
fn det4(a: &Wide) -> f64 {
    (0..4)
        .map(|col| {
            let minor: [[f64; 3]; 3] = std::array::from_fn(|r| {
                std::array::from_fn(|c| a[r + 1][if c < col { c } else { c + 1 }])
            });
            let sign = if col % 2 == 0 { 1.0 } else { -1.0 };
            sign * a[0][col] * det3(minor)
        })
        .sum()
}

impl Add for Mat4 {
    type Output = Mat4;
    fn add(self, other: Mat4) -> Mat4 {
        let mut out = self;
        for (o, b) in out.m.iter_mut().flatten().zip(other.m.iter().flatten()) {
            *o += b;
        }
        out
    }
}

impl Sub for Mat4 {
    type Output = Mat4;
    fn sub(self, other: Mat4) -> Mat4 {
        let mut out = self;
        for (o, b) in out.m.iter_mut().flatten().zip(other.m.iter().flatten()) {
            *o -= b;
        }
        out
    }
}

impl Mul<f32> for Mat4 {
    type Output = Mat4;
    fn mul(self, s: f32) -> Mat4 {
        let mut out = self;
        for o in out.m.iter_mut().flatten() {
            *o *= s;
        }
        out
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut out = Mat4::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.m[r][c] = (0..4).map(|k| self.m[r][k] * other.m[k][c]).sum();
            }
        }
        out
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        let row = |r: usize| {
            self.m[r][0] * v.x + self.m[r][1] * v.y + self.m[r][2] * v.z + self.m[r][3] * v.w
        };
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}

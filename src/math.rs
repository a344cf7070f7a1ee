use bevy::math::{Mat2, Vec2};

pub type Real = f32;
pub const DIM: usize = 2;

pub type Vector = Vec2;
pub type Matrix = Mat2;

#[inline(always)]
pub fn zero_vector() -> Vector {
    Vec2::ZERO
}

#[inline(always)]
pub fn zero_matrix() -> Matrix {
    Mat2::ZERO
}

#[inline(always)]
pub fn identity_matrix() -> Matrix {
    Mat2::IDENTITY
}

#[inline(always)]
pub fn matrix_trace(m: &Matrix) -> Real {
    m.x_axis.x + m.y_axis.y
}

/// Outer product a ⊗ b (column j is `a * b[j]`).
#[inline(always)]
pub fn outer_product(a: Vector, b: Vector) -> Matrix {
    Matrix::from_cols(a * b.x, a * b.y)
}

/// Symmetric part of a tensor, 0.5 * (m + mᵀ).
#[inline(always)]
pub fn symmetric_part(m: &Matrix) -> Matrix {
    (*m + m.transpose()) * 0.5
}

#[inline(always)]
pub fn matrix_is_finite(m: &Matrix) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite()
}

//! Matrix helpers for the state engine.
//!
//! Covers trace, outer products, completeness checks and the expansion of
//! local operators to the full register.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Computes the trace of a matrix (sum of diagonal elements).
pub fn trace(matrix: &Array2<Complex64>) -> Complex64 {
    matrix.diag().sum()
}

/// Conjugate transpose.
pub fn dagger(matrix: &Array2<Complex64>) -> Array2<Complex64> {
    matrix.t().mapv(|c| c.conj())
}

/// Expands a local operator acting on `targets` to the whole register of
/// `num_total_qubits`, acting as identity on every other qubit.
///
/// Qubit `k` of the register maps to bit `k` of the basis-state index.
pub fn expand_operator(
    num_total_qubits: usize,
    matrix: &Array2<Complex64>,
    targets: &[usize],
) -> Array2<Complex64> {
    let dim = 1 << num_total_qubits;
    let mut full_matrix = Array2::<Complex64>::zeros((dim, dim));

    let target_mask = targets.iter().fold(0usize, |mask, &t| mask | (1 << t));
    let passive_mask = !target_mask;

    for col_idx in 0..dim {
        let small_col = extract_bits(col_idx, targets);
        for small_row in 0..matrix.nrows() {
            let val = matrix[[small_row, small_col]];
            if val.norm_sqr() < f64::EPSILON {
                continue;
            }
            // Passive bits survive, target bits are rewritten
            let row_idx = (col_idx & passive_mask) | deposit_bits(small_row, targets);
            full_matrix[[row_idx, col_idx]] = val;
        }
    }
    full_matrix
}

/// Gathers the bits of `value` found at `indices` into a compact integer.
fn extract_bits(value: usize, indices: &[usize]) -> usize {
    indices
        .iter()
        .enumerate()
        .filter(|&(_, &pos)| (value >> pos) & 1 == 1)
        .fold(0, |acc, (i, _)| acc | (1 << i))
}

/// Scatters the bits of `compact_value` to the positions in `indices`.
fn deposit_bits(compact_value: usize, indices: &[usize]) -> usize {
    indices
        .iter()
        .enumerate()
        .filter(|&(i, _)| (compact_value >> i) & 1 == 1)
        .fold(0, |acc, (_, &pos)| acc | (1 << pos))
}

/// Find duplicate in a slice of usize
pub fn find_duplicate(indices: &[usize]) -> Option<usize> {
    let mut seen = std::collections::HashSet::new();
    indices.iter().find(|&&idx| !seen.insert(idx)).copied()
}

/// Checks completeness relation for measurement operators.
///
/// Verifies if $\sum M_k^\dagger M_k = I$.
pub fn check_completeness(ops: &[Array2<Complex64>], dim: usize) -> bool {
    let eye = Array2::<Complex64>::eye(dim);
    let sum = ops
        .iter()
        .fold(Array2::<Complex64>::zeros((dim, dim)), |acc, op| {
            acc + dagger(op).dot(op)
        });
    sum.iter()
        .zip(eye.iter())
        .all(|(a, b)| (a - b).norm() < 1e-9)
}

/// Computes the outer product of two vectors $|a\rangle\langle b|$.
pub fn outer_product(a: &Array1<Complex64>, b: &Array1<Complex64>) -> Array2<Complex64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j].conj())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn expanding_on_single_qubit_is_identity_map() {
        let x = array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]];
        assert_eq!(expand_operator(1, &x, &[0]), x);
    }

    #[test]
    fn expanded_x_flips_only_target_bit() {
        let x = array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]];
        let full = expand_operator(2, &x, &[1]);
        // |00> -> |10> (bit 1 set), |01> -> |11>
        assert_eq!(full[[0b10, 0b00]], c(1.0));
        assert_eq!(full[[0b11, 0b01]], c(1.0));
        assert_eq!(full[[0b00, 0b00]], c(0.0));
    }

    #[test]
    fn detects_duplicates() {
        assert_eq!(find_duplicate(&[0, 1, 2]), None);
        assert_eq!(find_duplicate(&[0, 1, 0]), Some(0));
    }

    #[test]
    fn projectors_are_complete() {
        let v0 = array![c(1.0), c(0.0)];
        let v1 = array![c(0.0), c(1.0)];
        let ops = [outer_product(&v0, &v0), outer_product(&v1, &v1)];
        assert!(check_completeness(&ops, 2));
        assert!(!check_completeness(&ops[..1], 2));
        assert_eq!(trace(&ops[0]), c(1.0));
    }
}

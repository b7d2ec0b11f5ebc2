use approx::assert_relative_eq;
use factorad::{Complex64, Matrix};
use factorad_optim::{determinant, determinant_matrix, FactorError};

fn sample() -> Matrix<f64> {
    Matrix::from_rows(&[
        [2.0, -1.0, 0.5, 3.0],
        [1.0, 4.0, -2.0, 0.0],
        [0.0, 1.5, 1.0, -1.0],
        [3.0, 0.0, 2.0, 1.0],
    ])
}

#[test]
fn identity_has_unit_determinant() {
    for n in 1..=6 {
        let eye = Matrix::<f64>::identity(n);
        assert_eq!(determinant_matrix(&eye).unwrap(), 1.0, "n = {n}");
    }
}

#[test]
fn transpose_preserves_determinant() {
    let m = sample();
    assert_relative_eq!(
        determinant_matrix(&m).unwrap(),
        determinant_matrix(&m.transpose()).unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn row_swap_negates() {
    let m = sample();
    let swapped = Matrix::from_fn(4, 4, |i, j| match i {
        0 => m.get(2, j),
        2 => m.get(0, j),
        _ => m.get(i, j),
    });
    assert_relative_eq!(
        determinant_matrix(&swapped).unwrap(),
        -determinant_matrix(&m).unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn single_entry() {
    assert_eq!(determinant(&[-7.5], 1, 1).unwrap(), -7.5);
    let z = Complex64::new(0.25, -2.0);
    assert_eq!(determinant(&[z], 1, 1).unwrap(), z);
}

#[test]
fn triangular_is_diagonal_product() {
    let u = Matrix::from_rows(&[[2.0, 7.0, -1.0], [0.0, 3.0, 4.0], [0.0, 0.0, -0.5]]);
    assert_relative_eq!(determinant_matrix(&u).unwrap(), -3.0, epsilon = 1e-12);
}

#[test]
fn product_rule() {
    let a = sample();
    let b = Matrix::from_fn(4, 4, |i, j| ((i * 3 + j * 5) % 7) as f64 - 3.0);
    let ab = a.matmul(&b);
    assert_relative_eq!(
        determinant_matrix(&ab).unwrap(),
        determinant_matrix(&a).unwrap() * determinant_matrix(&b).unwrap(),
        max_relative = 1e-10
    );
}

#[test]
fn strided_block_matches_packed() {
    let m = sample();
    // top-left 3x3 of the 4x4 buffer, read with stride 4
    let packed = Matrix::from_fn(3, 3, |i, j| m.get(i, j));
    assert_relative_eq!(
        determinant(m.as_slice(), 3, 4).unwrap(),
        determinant_matrix(&packed).unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn invalid_dimensions() {
    assert!(matches!(
        determinant::<f64>(&[1.0], 0, 1),
        Err(FactorError::InvalidDimension(_))
    ));
    let rect = Matrix::new(2, 3, vec![1.0; 6]);
    assert!(matches!(
        determinant_matrix(&rect),
        Err(FactorError::InvalidDimension(_))
    ));
}

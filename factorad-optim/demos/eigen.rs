//! Learn eigenvectors `V` and a diagonal `Λ` with `A·V ≈ Vᵗ·Λ` for a small
//! symmetric matrix, unlocking one eigenvalue every 1000 iterations.

use std::error::Error;
use std::io;

use factorad::Matrix;
use factorad_optim::{
    projected_descent, report, verify_factor, CostGraph, FactorizationCost, Identity, Initializer,
    Parameter, ProjectedDescentConfig, StructuralMask,
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let a = Matrix::from_rows(&[[2.0, 1.0, 0.0], [1.0, 2.0, 1.0], [0.0, 1.0, 2.0]]);
    let n = a.rows();

    let mut init = Initializer::seeded(7).with_scale(0.5);
    let mut params = vec![
        Parameter::initialize("v", StructuralMask::free(n), &mut init)?,
        Parameter::initialize("lambda", StructuralMask::diagonal(n), &mut init)?,
    ];

    let mut cost = CostGraph::declare(&FactorizationCost::new(Identity::Eigen), &a, &params)?;
    let mut config = ProjectedDescentConfig::eigen();
    config.convergence.max_iter = 20_000;
    let result = projected_descent(&mut cost, &mut params, &config)?;
    println!(
        "{} after {} iterations, |cost| = {:e}",
        result.termination,
        result.iterations,
        result.value.abs()
    );
    println!("eigenvalues: {:?}", params[1].diagonal());

    let verification = verify_factor(&params[1])?;
    report::write_report(&mut io::stdout().lock(), &params, &verification)?;
    Ok(())
}

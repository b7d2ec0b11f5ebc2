//! Learn a skew LU factorization `A ≈ L·Uᵗ` of a random complex 8×8 matrix.
//!
//! Run with `RUST_LOG=trace` to see the cost of every iteration, and with
//! `--features plot` to write `cost.png`.

use std::error::Error;
use std::io;
use std::path::Path;

use factorad::{Complex64, Matrix};
use factorad_optim::{
    projected_descent, report, verify_factor, CostGraph, FactorizationCost, Identity, Initializer,
    Parameter, ProjectedDescentConfig, StructuralMask,
};

const SIZE: usize = 8;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut init = Initializer::seeded(1);
    let a = Matrix::new(
        SIZE,
        SIZE,
        init.fill(&StructuralMask::<Complex64>::free(SIZE))?,
    );
    let mut params = vec![
        Parameter::initialize("l", StructuralMask::lower_unit(SIZE), &mut init)?,
        Parameter::initialize("u", StructuralMask::upper(SIZE), &mut init)?,
    ];

    let mut cost = CostGraph::declare(&FactorizationCost::new(Identity::SkewLu), &a, &params)?;
    let config = ProjectedDescentConfig::lu_complex();
    let result = projected_descent(&mut cost, &mut params, &config)?;
    println!(
        "{} after {} iterations, |cost| = {}",
        result.termination,
        result.iterations,
        result.value.norm()
    );

    let verification = verify_factor(&params[1])?;
    report::write_report(&mut io::stdout().lock(), &params, &verification)?;

    #[cfg(feature = "plot")]
    report::render_or_warn(Path::new("cost.png"), |p| {
        report::render_trajectory(p, &result.trajectory)
    });
    #[cfg(not(feature = "plot"))]
    log::info!(
        "built without the `plot` feature, {} not written",
        Path::new("cost.png").display()
    );

    Ok(())
}

//! Human-readable output for a finished run.

use std::io::{self, Write};
use std::path::Path;

use factorad::Field;

use crate::error::Result;
use crate::parameter::Parameter;
#[cfg(feature = "plot")]
use crate::result::TrajectoryPoint;
use crate::verify::Verification;

/// Print every factor as a grid of cell moduli, then the diagonal product
/// and determinant of `verification`.
pub fn write_report<W: Write, F: Field>(
    out: &mut W,
    params: &[Parameter<F>],
    verification: &Verification<F>,
) -> io::Result<()> {
    for p in params {
        writeln!(out, "{}:", p.name())?;
        let n = p.n();
        for i in 0..n {
            for j in 0..n {
                if j > 0 {
                    write!(out, " ")?;
                }
                write!(out, "{}", p.value(i, j).modulus())?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    writeln!(
        out,
        "{} = {}",
        verification.diagonal_product, verification.determinant
    )
}

/// Render the trajectory as an `800 × 800` scatter plot ("epochs vs cost",
/// `log10 |cost|` on the y axis) to a PNG at `path`.
///
/// Points with a non-finite cost (an exact zero) are skipped.
#[cfg(feature = "plot")]
pub fn render_trajectory<R>(path: &Path, trajectory: &[TrajectoryPoint<R>]) -> Result<()>
where
    R: num_traits::Float,
{
    use crate::error::FactorError;
    use plotters::prelude::*;

    let render = |e: &dyn std::fmt::Display| FactorError::Render(e.to_string());

    let points: Vec<(f64, f64)> = trajectory
        .iter()
        .filter_map(|p| {
            let y = p.log10_cost.to_f64()?;
            y.is_finite().then_some((p.iteration as f64, y))
        })
        .collect();
    if points.is_empty() {
        return Err(FactorError::Render("no finite points to plot".into()));
    }
    let x_max = points.iter().map(|p| p.0).fold(1.0, f64::max);
    let (y_min, y_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.1), hi.max(p.1))
        });
    let pad = ((y_max - y_min) * 0.05).max(0.5);

    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render(&e))?;
    {
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(0.0..x_max, (y_min - pad)..(y_max + pad))
            .map_err(|e| render(&e))?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 1, BLUE.filled())),
            )
            .map_err(|e| render(&e))?;
    }
    root.present().map_err(|e| render(&e))?;
    log::debug!("wrote {} trajectory points to {}", points.len(), path.display());
    Ok(())
}

/// Run `render`, logging a failure at `warn` level instead of returning it.
///
/// Returns whether rendering succeeded.
pub fn render_or_warn(path: &Path, render: impl FnOnce(&Path) -> Result<()>) -> bool {
    match render(path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("could not write {}: {e}", path.display());
            false
        }
    }
}

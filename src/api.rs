use crate::breverse::BReverse;
use crate::bytecode_tape::{BtapeGuard, BtapeThreadLocal, BytecodeTape};
use crate::field::Field;

/// Record a scalar function into a [`BytecodeTape`] for repeated evaluation.
///
/// The returned tape can be re-evaluated at new inputs with
/// [`BytecodeTape::forward`] and differentiated with
/// [`BytecodeTape::reverse_into`] without re-recording.
///
/// Returns the tape and the output value from the recording pass.
///
/// ```
/// let (mut tape, value) = factorad::record(|x| x[0] * x[1] + x[0], &[2.0_f64, 5.0]);
/// assert_eq!(value, 12.0);
/// let g = tape.gradient(&[1.0, 3.0]);
/// assert_eq!(g, vec![4.0, 1.0]);
/// ```
pub fn record<F: Field + BtapeThreadLocal>(
    f: impl FnOnce(&[BReverse<F>]) -> BReverse<F>,
    x: &[F],
) -> (BytecodeTape<F>, F) {
    let n = x.len();
    let mut tape = BytecodeTape::with_capacity(n * 10);

    let inputs: Vec<BReverse<F>> = x
        .iter()
        .map(|&val| {
            let idx = tape.new_input(val);
            BReverse::from_tape(val, idx)
        })
        .collect();

    let output = {
        let _guard = BtapeGuard::new(&mut tape);
        f(&inputs)
    };

    // A constant output (no dependence on any input) still needs a tape
    // entry to read back and seed.
    let out_idx = if output.is_constant() {
        tape.push_const(output.value)
    } else {
        output.index
    };
    tape.set_output(out_idx);
    (tape, output.value)
}

/// Compute the gradient of a scalar function `f : Fⁿ → F` using reverse mode.
///
/// For complex fields this is the holomorphic derivative `∂f/∂zᵢ`.
///
/// ```
/// let g = factorad::grad(|x| x[0] * x[0] + x[1] * x[1], &[3.0_f64, 4.0]);
/// assert!((g[0] - 6.0).abs() < 1e-10);
/// assert!((g[1] - 8.0).abs() < 1e-10);
/// ```
pub fn grad<F: Field + BtapeThreadLocal>(
    f: impl FnOnce(&[BReverse<F>]) -> BReverse<F>,
    x: &[F],
) -> Vec<F> {
    let (tape, _) = record(f, x);
    let adjoints = tape.reverse(tape.output_index() as u32);
    adjoints[..x.len()].to_vec()
}

//! Bytecode tape for re-evaluable reverse-mode AD.
//!
//! The tape stores opcodes rather than precomputed multipliers, so a cost
//! expression recorded once can be re-evaluated at new inputs on every
//! optimizer iteration without re-recording.
//!
//! # Limitations
//!
//! The tape records one execution path. The field operations it supports have
//! no branches, so this only matters for user closures that inspect values
//! while recording.

use std::cell::Cell;

use num_complex::Complex;

use crate::field::Field;
use crate::opcode::{self, OpCode, UNUSED};

/// Sentinel index for constant entries (not tracked).
pub const CONSTANT: u32 = u32::MAX;

/// A bytecode tape that can be re-evaluated at different inputs.
///
/// Created via [`crate::api::record`]. After recording, call [`forward`](Self::forward)
/// to re-evaluate and [`reverse_into`](Self::reverse_into) to compute adjoints.
pub struct BytecodeTape<F: Field> {
    opcodes: Vec<OpCode>,
    arg_indices: Vec<[u32; 2]>,
    values: Vec<F>,
    num_inputs: u32,
    num_variables: u32,
    output_index: u32,
}

impl<F: Field> BytecodeTape<F> {
    /// Create an empty bytecode tape.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a bytecode tape with pre-allocated capacity.
    pub fn with_capacity(est_ops: usize) -> Self {
        BytecodeTape {
            opcodes: Vec::with_capacity(est_ops),
            arg_indices: Vec::with_capacity(est_ops),
            values: Vec::with_capacity(est_ops),
            num_inputs: 0,
            num_variables: 0,
            output_index: 0,
        }
    }

    /// Register a new input variable. Returns its index.
    ///
    /// Inputs must be registered before any constant or operation so that
    /// input `i` lives at tape index `i`.
    #[inline]
    pub fn new_input(&mut self, value: F) -> u32 {
        debug_assert_eq!(
            self.num_inputs, self.num_variables,
            "inputs must be registered before operations"
        );
        let idx = self.num_variables;
        self.num_variables += 1;
        self.num_inputs += 1;
        self.opcodes.push(OpCode::Input);
        self.arg_indices.push([UNUSED, UNUSED]);
        self.values.push(value);
        idx
    }

    /// Register a scalar constant. Returns its index.
    #[inline]
    pub fn push_const(&mut self, value: F) -> u32 {
        let idx = self.num_variables;
        self.num_variables += 1;
        self.opcodes.push(OpCode::Const);
        self.arg_indices.push([UNUSED, UNUSED]);
        self.values.push(value);
        idx
    }

    /// Record an operation. Returns the result index.
    ///
    /// **Constant folding**: if all operands point to `Const` entries (not `Input`),
    /// the operation is replaced by a single `Const` with the already-computed value.
    ///
    /// **Algebraic simplification**: identity patterns (`x + 0 → x`, `x * 1 → x`)
    /// and absorbing patterns (`x * 0 → 0`, `x - x → 0`) are short-circuited.
    /// Absorbing patterns are guarded by a value check so NaN/Inf propagate.
    #[inline]
    pub fn push_op(&mut self, op: OpCode, arg0: u32, arg1: u32, value: F) -> u32 {
        let arg0_const = self.opcodes[arg0 as usize] == OpCode::Const;
        let arg1_const = arg1 == UNUSED || self.opcodes[arg1 as usize] == OpCode::Const;
        if arg0_const && arg1_const {
            return self.push_const(value);
        }

        if (arg0_const || arg1_const) && arg1 != UNUSED {
            if let Some(idx) =
                self.try_algebraic_simplify(op, arg0, arg1, arg0_const, arg1_const, value)
            {
                return idx;
            }
        }

        if arg0 == arg1 && op == OpCode::Sub && value == F::zero() {
            return self.push_const(value);
        }

        let idx = self.num_variables;
        self.num_variables += 1;
        self.opcodes.push(op);
        self.arg_indices.push([arg0, arg1]);
        self.values.push(value);
        idx
    }

    #[inline(never)]
    fn try_algebraic_simplify(
        &mut self,
        op: OpCode,
        arg0: u32,
        arg1: u32,
        arg0_const: bool,
        arg1_const: bool,
        value: F,
    ) -> Option<u32> {
        let zero = F::zero();
        let one = F::one();
        let lhs = self.values[arg0 as usize];
        let rhs = self.values[arg1 as usize];
        match op {
            OpCode::Add => {
                if arg1_const && rhs == zero {
                    return Some(arg0);
                }
                if arg0_const && lhs == zero {
                    return Some(arg1);
                }
            }
            OpCode::Sub => {
                if arg1_const && rhs == zero {
                    return Some(arg0);
                }
            }
            OpCode::Mul => {
                if arg1_const && rhs == one {
                    return Some(arg0);
                }
                if arg0_const && lhs == one {
                    return Some(arg1);
                }
                // Absorbing: x * 0 → const (guarded: NaN * 0 = NaN, not 0)
                if ((arg1_const && rhs == zero) || (arg0_const && lhs == zero)) && value == zero {
                    return Some(self.push_const(value));
                }
            }
            OpCode::Div => {
                if arg1_const && rhs == one {
                    return Some(arg0);
                }
            }
            _ => {}
        }
        None
    }

    /// Mark the output variable.
    #[inline]
    pub fn set_output(&mut self, index: u32) {
        self.output_index = index;
    }

    /// Get the output value (available after `forward()` or initial recording).
    #[inline]
    pub fn output_value(&self) -> F {
        self.values[self.output_index as usize]
    }

    /// Index of the output variable.
    #[inline]
    pub fn output_index(&self) -> usize {
        self.output_index as usize
    }

    /// Number of input variables.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs as usize
    }

    /// Number of operations (including inputs and constants).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.opcodes.len()
    }

    /// Slice view of all primal values in the tape.
    #[inline]
    pub fn values_slice(&self) -> &[F] {
        &self.values
    }

    /// Re-evaluate the tape at new inputs (forward sweep).
    ///
    /// Overwrites `values` in place without allocating.
    pub fn forward(&mut self, inputs: &[F]) {
        assert_eq!(
            inputs.len(),
            self.num_inputs as usize,
            "wrong number of inputs"
        );

        self.values[..inputs.len()].copy_from_slice(inputs);

        for i in self.num_inputs as usize..self.opcodes.len() {
            match self.opcodes[i] {
                OpCode::Input | OpCode::Const => continue,
                op => {
                    let [a_idx, b_idx] = self.arg_indices[i];
                    let a = self.values[a_idx as usize];
                    let b = if op.is_binary() {
                        self.values[b_idx as usize]
                    } else {
                        F::zero()
                    };
                    self.values[i] = opcode::eval_forward(op, a, b);
                }
            }
        }
    }

    /// Core reverse sweep. Expects `adjoints` to be pre-seeded by the caller
    /// (length = number of tape entries).
    fn reverse_sweep_core(&self, adjoints: &mut [F]) {
        for i in (0..self.opcodes.len()).rev() {
            let adj = adjoints[i];
            if adj == F::zero() {
                continue;
            }

            match self.opcodes[i] {
                OpCode::Input | OpCode::Const => continue,
                op => {
                    adjoints[i] = F::zero();
                    let [a_idx, b_idx] = self.arg_indices[i];
                    let a = self.values[a_idx as usize];
                    let b = if op.is_binary() {
                        self.values[b_idx as usize]
                    } else {
                        F::zero()
                    };
                    let (da, db) = opcode::reverse_partials(op, a, b, self.values[i]);

                    adjoints[a_idx as usize] = adjoints[a_idx as usize] + da * adj;
                    if op.is_binary() {
                        adjoints[b_idx as usize] = adjoints[b_idx as usize] + db * adj;
                    }
                }
            }
        }
    }

    /// Reverse sweep: compute adjoints seeded at `seed_index`.
    ///
    /// Returns the full adjoint vector (length = number of tape entries).
    pub fn reverse(&self, seed_index: u32) -> Vec<F> {
        let mut adjoints = Vec::new();
        self.reverse_seeded_into(seed_index, &mut adjoints);
        adjoints
    }

    /// Reverse sweep from the output into a caller-provided buffer.
    ///
    /// On return `adjoint_buf[..num_inputs]` holds `∂output/∂input`. The
    /// buffer is cleared and resized first, so stale adjoints from a previous
    /// sweep never leak into this one.
    pub fn reverse_into(&self, adjoint_buf: &mut Vec<F>) {
        self.reverse_seeded_into(self.output_index, adjoint_buf);
    }

    fn reverse_seeded_into(&self, seed_index: u32, adjoint_buf: &mut Vec<F>) {
        adjoint_buf.clear();
        adjoint_buf.resize(self.num_variables as usize, F::zero());
        adjoint_buf[seed_index as usize] = F::one();
        self.reverse_sweep_core(adjoint_buf);
    }

    /// Forward + reverse: compute the gradient at new inputs.
    ///
    /// Returns only the input adjoints (indices `0..num_inputs`).
    pub fn gradient(&mut self, inputs: &[F]) -> Vec<F> {
        let mut buf = Vec::new();
        self.gradient_with_buf(inputs, &mut buf)
    }

    /// Like [`gradient`](Self::gradient) but reuses a caller-provided buffer
    /// for the adjoint vector, avoiding allocation on repeated calls.
    pub fn gradient_with_buf(&mut self, inputs: &[F], adjoint_buf: &mut Vec<F>) -> Vec<F> {
        self.forward(inputs);
        self.reverse_into(adjoint_buf);
        adjoint_buf[..self.num_inputs as usize].to_vec()
    }
}

impl<F: Field> Default for BytecodeTape<F> {
    fn default() -> Self {
        Self::new()
    }
}

// ══════════════════════════════════════════════
//  Thread-local active bytecode tape
// ══════════════════════════════════════════════

thread_local! {
    static BTAPE_F32: Cell<*mut BytecodeTape<f32>> = const { Cell::new(std::ptr::null_mut()) };
    static BTAPE_F64: Cell<*mut BytecodeTape<f64>> = const { Cell::new(std::ptr::null_mut()) };
    static BTAPE_C32: Cell<*mut BytecodeTape<Complex<f32>>> = const { Cell::new(std::ptr::null_mut()) };
    static BTAPE_C64: Cell<*mut BytecodeTape<Complex<f64>>> = const { Cell::new(std::ptr::null_mut()) };
}

/// Trait to select the correct thread-local for a given field type.
pub trait BtapeThreadLocal: Field {
    fn btape_cell() -> &'static std::thread::LocalKey<Cell<*mut BytecodeTape<Self>>>;
}

impl BtapeThreadLocal for f32 {
    fn btape_cell() -> &'static std::thread::LocalKey<Cell<*mut BytecodeTape<Self>>> {
        &BTAPE_F32
    }
}

impl BtapeThreadLocal for f64 {
    fn btape_cell() -> &'static std::thread::LocalKey<Cell<*mut BytecodeTape<Self>>> {
        &BTAPE_F64
    }
}

impl BtapeThreadLocal for Complex<f32> {
    fn btape_cell() -> &'static std::thread::LocalKey<Cell<*mut BytecodeTape<Self>>> {
        &BTAPE_C32
    }
}

impl BtapeThreadLocal for Complex<f64> {
    fn btape_cell() -> &'static std::thread::LocalKey<Cell<*mut BytecodeTape<Self>>> {
        &BTAPE_C64
    }
}

/// Access the active bytecode tape for the current thread.
/// Panics if no tape is active.
#[inline]
pub fn with_active_btape<F: BtapeThreadLocal, R>(f: impl FnOnce(&mut BytecodeTape<F>) -> R) -> R {
    F::btape_cell().with(|cell| {
        let ptr = cell.get();
        assert!(
            !ptr.is_null(),
            "No active bytecode tape. Use factorad::record() to record a function."
        );
        // SAFETY: BtapeGuard guarantees validity for the duration of the
        // recording scope, single-threaded via thread-local.
        let tape = unsafe { &mut *ptr };
        f(tape)
    })
}

/// RAII guard that sets a bytecode tape as the thread-local active tape and
/// restores the previous one on drop.
pub struct BtapeGuard<F: BtapeThreadLocal> {
    prev: *mut BytecodeTape<F>,
}

impl<F: BtapeThreadLocal> BtapeGuard<F> {
    /// Activate `tape` as the thread-local bytecode tape.
    pub fn new(tape: &mut BytecodeTape<F>) -> Self {
        let prev = F::btape_cell().with(|cell| {
            let prev = cell.get();
            cell.set(tape as *mut BytecodeTape<F>);
            prev
        });
        BtapeGuard { prev }
    }
}

impl<F: BtapeThreadLocal> Drop for BtapeGuard<F> {
    fn drop(&mut self) {
        F::btape_cell().with(|cell| {
            cell.set(self.prev);
        });
    }
}

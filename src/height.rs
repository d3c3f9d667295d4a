//! Geometric height reconstruction.
//!
//! Per column, three stages run in strict order:
//!   1. layer thickness from pseudo-density, pressure, temperature, moisture
//!   2. interface heights by a bottom-up scan starting at the surface height
//!   3. mid-level heights as the midpoint of the bounding interfaces
//!
//! Columns are independent and processed in parallel; the scan only runs
//! along the level axis inside a column. Level 0 is the lowest layer.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};
use ndarray_stats::QuantileExt;
use rayon::prelude::*;

use crate::error::{DiagError, DiagResult};
use crate::state::ColumnState;

/// Dry-air gas constant (J/kg/K).
pub const RD: f64 = 287.042;
/// Water-vapor gas constant (J/kg/K).
pub const RV: f64 = 461.505;
/// Gravity used in the hydrostatic thickness (m/s²).
pub const GRAVIT: f64 = 9.80616;
/// Gravity used to turn surface geopotential into height.
const PHIS_GRAVITY: f64 = 9.81;

const EP_2: f64 = RD / RV;

/// Derived vertical coordinates for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHeights {
    /// `[C, L+1]`, interface 0 at the surface.
    pub z_int: Array2<f64>,
    /// `[C, L]`
    pub z_mid: Array2<f64>,
}

#[inline]
pub fn virtual_temperature(t_mid: f64, qv: f64) -> f64 {
    t_mid * (qv + EP_2) / (EP_2 * (1.0 + qv))
}

/// Hydrostatic layer thickness (m).
#[inline]
pub fn layer_thickness(pseudo_density: f64, p_mid: f64, t_mid: f64, qv: f64) -> f64 {
    (RD / GRAVIT) * pseudo_density * virtual_temperature(t_mid, qv) / p_mid
}

#[inline]
pub fn surface_height(phis: f64) -> f64 {
    phis / PHIS_GRAVITY
}

pub fn surface_heights(phis: ArrayView1<f64>) -> Array1<f64> {
    phis.mapv(surface_height)
}

/// Layer thickness for every column and level.
pub fn compute_thickness(state: &ColumnState<'_>) -> Array2<f64> {
    let mut dz = Array2::<f64>::zeros(state.p_mid.raw_dim());
    Zip::from(&mut dz)
        .and(&state.pseudo_density)
        .and(&state.p_mid)
        .and(&state.t_mid)
        .and(&state.qv)
        .par_for_each(|d, &pdel, &p, &t, &q| *d = layer_thickness(pdel, p, t, q));
    dz
}

// ── Per-column stages ─────────────────────────────────────────────────────

fn fill_thickness(
    mut dz: ArrayViewMut1<f64>,
    pseudo_density: ArrayView1<f64>,
    p_mid: ArrayView1<f64>,
    t_mid: ArrayView1<f64>,
    qv: ArrayView1<f64>,
) {
    Zip::from(&mut dz)
        .and(&pseudo_density)
        .and(&p_mid)
        .and(&t_mid)
        .and(&qv)
        .for_each(|d, &pdel, &p, &t, &q| *d = layer_thickness(pdel, p, t, q));
}

/// Reject NaN, infinite, zero and negative thickness. For non-finite values
/// the lowest offending level is reported, otherwise the thinnest layer.
fn check_thickness(column: usize, dz: ArrayView1<f64>) -> DiagResult<()> {
    let invalid = |level: usize| DiagError::InvalidThickness {
        column,
        level,
        value: dz[level],
    };
    if let Some(level) = dz.iter().position(|v| !v.is_finite()) {
        return Err(invalid(level));
    }
    if let Ok(level) = dz.argmin() {
        if dz[level] <= 0.0 {
            return Err(invalid(level));
        }
    }
    Ok(())
}

/// Stage 2: `z_int[0] = z_surf`, `z_int[k+1] = z_int[k] + dz[k]`.
fn integrate_interfaces(
    column: usize,
    dz: ArrayView1<f64>,
    z_surf: f64,
    mut z_int: ArrayViewMut1<f64>,
) -> DiagResult<()> {
    check_thickness(column, dz)?;

    z_int[0] = z_surf;
    let heights = dz.iter().scan(z_surf, |acc, &d| {
        *acc += d;
        Some(*acc)
    });
    for (dst, z) in z_int.iter_mut().skip(1).zip(heights) {
        *dst = z;
    }

    for k in 0..dz.len() {
        let (below, above) = (z_int[k], z_int[k + 1]);
        if !above.is_finite() || above <= below {
            return Err(DiagError::NonMonotonicInterface {
                column,
                interface: k + 1,
                below,
                above,
            });
        }
    }
    Ok(())
}

/// Stage 3: midpoint of the two bounding interfaces. The midpoint must land
/// strictly inside its layer; with interfaces one ulp apart it rounds onto one
/// of them.
fn fill_midpoints(column: usize, z_int: ArrayView1<f64>, mut z_mid: ArrayViewMut1<f64>) -> DiagResult<()> {
    Zip::from(&mut z_mid)
        .and(z_int.slice(s![..-1]))
        .and(z_int.slice(s![1..]))
        .for_each(|mid, &lo, &hi| *mid = lo + 0.5 * (hi - lo));

    for (level, &mid) in z_mid.iter().enumerate() {
        let (below, above) = (z_int[level], z_int[level + 1]);
        if !(below < mid && mid < above) {
            return Err(DiagError::MidOutOfBounds {
                column,
                level,
                below,
                mid,
                above,
            });
        }
    }
    Ok(())
}

// ── Entry points ──────────────────────────────────────────────────────────

/// Interface and mid-level heights from precomputed thickness `[C, L]` and
/// surface height `[C]`.
pub fn reconstruct(thickness: ArrayView2<f64>, z_surf: ArrayView1<f64>) -> DiagResult<ColumnHeights> {
    let (ncol, nlev) = thickness.dim();
    if z_surf.len() != ncol {
        return Err(DiagError::ShapeMismatch {
            name: "surface_height",
            expected: vec![ncol],
            actual: z_surf.shape().to_vec(),
        });
    }

    let mut z_int = Array2::<f64>::zeros((ncol, nlev + 1));
    let mut z_mid = Array2::<f64>::zeros((ncol, nlev));

    z_int
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(z_mid.axis_iter_mut(Axis(0)))
        .enumerate()
        .try_for_each(|(i, (mut int_row, mid_row))| {
            integrate_interfaces(i, thickness.row(i), z_surf[i], int_row.view_mut())?;
            fill_midpoints(i, int_row.view(), mid_row)
        })?;

    Ok(ColumnHeights { z_int, z_mid })
}

/// Fused reconstruction straight from column state.
///
/// The mid-height row doubles as the thickness scratch row: thickness is
/// written there, consumed by the scan, then overwritten by the midpoints.
/// The reuse never crosses a column boundary.
pub fn reconstruct_from_state(state: &ColumnState<'_>) -> DiagResult<ColumnHeights> {
    let (ncol, nlev) = (state.ncol(), state.nlev());
    let mut z_int = Array2::<f64>::zeros((ncol, nlev + 1));
    let mut z_mid = Array2::<f64>::zeros((ncol, nlev));

    z_int
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(z_mid.axis_iter_mut(Axis(0)))
        .enumerate()
        .try_for_each(|(i, (mut int_row, mut scratch))| {
            fill_thickness(
                scratch.view_mut(),
                state.pseudo_density.row(i),
                state.p_mid.row(i),
                state.t_mid.row(i),
                state.qv.row(i),
            );
            integrate_interfaces(i, scratch.view(), surface_height(state.phis[i]), int_row.view_mut())?;
            fill_midpoints(i, int_row.view(), scratch.view_mut())
        })?;

    Ok(ColumnHeights { z_int, z_mid })
}

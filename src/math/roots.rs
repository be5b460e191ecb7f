//! Bracketed scalar root finding (Brent's method).
//!
//! The objective may fail (a p-value evaluation runs the whole simulation
//! pipeline), so it returns `Result` and errors propagate unchanged.

use crate::error::AppError;

const MAX_ITERATIONS: usize = 200;

/// Find `x` in `[a, b]` with `f(x) = 0` to within absolute tolerance `tol`.
///
/// `f(a)` and `f(b)` must not share a strict sign. An exact zero at either
/// endpoint is returned immediately.
pub fn find_root<F>(mut f: F, a: f64, b: f64, tol: f64) -> Result<f64, AppError>
where
    F: FnMut(f64) -> Result<f64, AppError>,
{
    let (mut a, mut b) = (a, b);
    let mut fa = checked(a, f(a)?)?;
    let mut fb = checked(b, f(b)?)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa.signum() == fb.signum() {
        return Err(AppError::numeric(format!(
            "Root not bracketed in [{a:e}, {b:e}]: f(a)={fa:e}, f(b)={fb:e}."
        )));
    }

    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_ITERATIONS {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // Inverse quadratic interpolation, or secant when only two points differ.
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
        fb = checked(b, f(b)?)?;
    }

    Err(AppError::numeric(format!(
        "Root finder did not converge after {MAX_ITERATIONS} iterations (last x={b:e})."
    )))
}

fn checked(x: f64, fx: f64) -> Result<f64, AppError> {
    if fx.is_finite() {
        Ok(fx)
    } else {
        Err(AppError::numeric(format!("Non-finite objective value at x={x:e}.")))
    }
}

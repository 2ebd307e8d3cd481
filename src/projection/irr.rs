//! Internal Rate of Return (IRR)
//!
//! Newton-Raphson on the annual rate, falling back to bisection when the
//! derivative vanishes or the iteration does not settle.

/// IRR of yearly cash flows (positive = inflow, negative = outflow)
///
/// Returns None when the flows never change sign or no root is bracketed.
pub fn calculate_irr(cashflows: &[f64]) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }
    if cashflows.iter().all(|&cf| cf.abs() < 1e-10) {
        return Some(0.0);
    }

    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    let mut rate = 0.08;
    let tolerance = 1e-10;

    for _ in 0..1000 {
        let (value, derivative) = npv_and_derivative(cashflows, rate);
        if derivative.abs() < 1e-20 {
            return irr_bisection(cashflows);
        }

        let next = (rate - value / derivative).clamp(-0.99, 10.0);
        if (next - rate).abs() < tolerance {
            return Some(next);
        }
        rate = next;
    }

    irr_bisection(cashflows)
}

/// Net present value at an annual rate; the first flow is undiscounted
pub fn npv(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut value = 0.0;
    let mut derivative = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        value += cf / (1.0 + rate).powi(t as i32);
        if t > 0 {
            derivative -= (t as f64) * cf / (1.0 + rate).powi(t as i32 + 1);
        }
    }

    (value, derivative)
}

fn irr_bisection(cashflows: &[f64]) -> Option<f64> {
    let mut low = -0.99_f64;
    let mut high = 10.0_f64;
    let tolerance = 1e-10;

    let mut npv_low = npv(cashflows, low);
    if npv_low * npv(cashflows, high) > 0.0 {
        return None;
    }

    for _ in 0..1000 {
        let mid = (low + high) / 2.0;
        let npv_mid = npv(cashflows, mid);

        if npv_mid.abs() < tolerance || (high - low) / 2.0 < tolerance {
            return Some(mid);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    None
}

/// Number of stages of the embedded 4(5) pair.
pub const STAGES: usize = 6;

/// Butcher tableau of an embedded Runge-Kutta pair with [`STAGES`] stages.
///
/// Stage `i` is evaluated at `t + c[i]·h` with state
/// `y + Σ_{j<i} a[i][j]·k_j`, where every `k_j` is already scaled by `h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tableau {
    /// Nodes (abscissae).
    pub c: [f64; STAGES],
    /// Strictly lower-triangular stage coefficients; `a[i]` has `i` used entries.
    pub a: [[f64; STAGES - 1]; STAGES],
    /// Weights of the 5th-order solution, used to advance the state.
    pub b5: [f64; STAGES],
    /// Error weights: 5th-order minus 4th-order weights.
    pub berr: [f64; STAGES],
}

/// Runge-Kutta-Fehlberg 4(5) coefficients.
///
/// > E. Fehlberg, "Low-order classical Runge-Kutta formulas with stepsize
/// > control and their application to some heat transfer problems,"
/// > NASA Technical Report R-315, 1969.
pub const RKF45: Tableau = Tableau {
    c: [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0],
    a: [
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 4.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0],
        [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0],
        [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0],
        [-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0],
    ],
    b5: [
        16.0 / 135.0,
        0.0,
        6656.0 / 12825.0,
        28561.0 / 56430.0,
        -9.0 / 50.0,
        2.0 / 55.0,
    ],
    berr: [
        1.0 / 360.0,
        0.0,
        -128.0 / 4275.0,
        -2197.0 / 75240.0,
        1.0 / 50.0,
        2.0 / 55.0,
    ],
};

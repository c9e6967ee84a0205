//! Quadratic vote weighting.
//!
//! A voter holding `b` units of the governance resource contributes
//! `floor(sqrt(b))` to a tally, so doubling influence costs four times the
//! stake. Everything here is integer arithmetic and bit-exact on every target.

/// Vote weight for a resource balance.
pub fn vote_weight(balance: u64) -> u64 {
    integer_sqrt(balance)
}

/// Largest `w` such that `w * w <= n`.
pub fn integer_sqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }

    // Newton's method from an over-estimate descends monotonically onto the
    // floor root. `(n + 1) / 2` is written without the `+ 1` overflow.
    let mut x = n;
    let mut y = n / 2 + (n & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }

    round_down_correction(x, n)
}

fn round_down_correction(mut root: u64, n: u64) -> u64 {
    let n = n as u128;
    while (root as u128) * (root as u128) > n {
        root -= 1;
    }
    while ((root as u128) + 1) * ((root as u128) + 1) <= n {
        root += 1;
    }
    root
}

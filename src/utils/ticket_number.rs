use chrono::{DateTime, Utc};
use rand::Rng;

/// `T` + `%Y%m%d%H%M%S` + `digits` random decimal digits.
pub fn generate(now: DateTime<Utc>, digits: u32) -> String {
    let upper = 10u32.pow(digits);
    let suffix = rand::rng().random_range(0..upper);

    format!(
        "T{}{:0width$}",
        now.format("%Y%m%d%H%M%S"),
        suffix,
        width = digits as usize
    )
}

//! Fallback nickname for configs that do not set one.

use rand::RngExt;

/// `Guest` followed by four random digits, e.g. `Guest0427`.
pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let num: u16 = rng.random_range(0..10_000);
    format!("Guest{:04}", num)
}

//! Batch lot numbers for grid sheets

use rand::Rng;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    LETTERS[rng.gen_range(0..LETTERS.len())] as char
}

fn digit<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(b'0' + rng.gen_range(0..10u8))
}

/// Random lot number shaped `AAA00A0`
///
/// Cosmetic batch tracking only: no uniqueness across renders.
pub fn generate_lot_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut lot = String::with_capacity(7);
    for _ in 0..3 {
        lot.push(letter(rng));
    }
    for _ in 0..2 {
        lot.push(digit(rng));
    }
    lot.push(letter(rng));
    lot.push(digit(rng));
    lot
}

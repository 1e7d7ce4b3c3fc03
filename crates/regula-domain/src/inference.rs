//! Kind inference strategies for identifiers entered without an explicit kind

use crate::query::QueryKind;

/// Strategy that guesses the [`QueryKind`] of a raw identifier
///
/// Injected into [`QueryNormalizer`](crate::QueryNormalizer) so alternate
/// inference rules can be swapped without touching the resolution engine.
pub trait KindInference {
    /// Guess the kind of `raw`, or `None` if the shape is not recognized
    fn infer(&self, raw: &str) -> Option<QueryKind>;
}

impl<F> KindInference for F
where
    F: Fn(&str) -> Option<QueryKind>,
{
    fn infer(&self, raw: &str) -> Option<QueryKind> {
        self(raw)
    }
}

/// Length and character-class heuristic
///
/// - 17 alphanumerics: chassis
/// - 7 characters shaped `LLLNNNN` (legacy) or `LLLNLNN` (Mercosul): plate
/// - 9 to 11 digits: renavam
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeHeuristic;

impl KindInference for ShapeHeuristic {
    fn infer(&self, raw: &str) -> Option<QueryKind> {
        let compact: Vec<char> = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if compact.len() == 17 {
            return Some(QueryKind::Chassis);
        }
        if is_plate_shape(&compact) {
            return Some(QueryKind::Plate);
        }
        if (9..=11).contains(&compact.len()) && compact.iter().all(|c| c.is_ascii_digit()) {
            return Some(QueryKind::Renavam);
        }
        None
    }
}

fn is_plate_shape(chars: &[char]) -> bool {
    if chars.len() != 7 {
        return false;
    }
    let letters = chars[..3].iter().all(|c| c.is_ascii_alphabetic());
    let digit_at = |i: usize| chars[i].is_ascii_digit();
    // Position 4 is a digit in the legacy layout and a letter in Mercosul
    let middle = chars[4].is_ascii_alphanumeric();
    letters && digit_at(3) && middle && digit_at(5) && digit_at(6)
}

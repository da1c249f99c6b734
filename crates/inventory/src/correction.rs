//! Correction previews and the note attached to each persisted correction.

use serde::{Deserialize, Serialize};

use stocktake_core::{MaterialId, Quantity};

/// A counted value that differs from recorded stock and has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionPreview {
    pub material_id: MaterialId,
    pub material_name: String,
    pub counted: Quantity,
    pub recorded: Quantity,
}

impl CorrectionPreview {
    /// `counted - recorded`; positive when more was found than recorded.
    pub fn difference(&self) -> Quantity {
        self.counted - self.recorded
    }

    /// Signed display form (`+3`, `-2.50`).
    pub fn signed_difference(&self) -> String {
        self.difference().signed()
    }
}

/// Human-readable note stored with a correction.
pub fn correction_note(prefix: &str, counted: Quantity, recorded: Quantity) -> String {
    format!(
        "{prefix}: counted {counted} - recorded {recorded} = difference {}",
        (counted - recorded).signed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_is_counted_minus_recorded() {
        let preview = CorrectionPreview {
            material_id: MaterialId::new(1),
            material_name: "Cable".to_string(),
            counted: Quantity::from_units(3),
            recorded: Quantity::from_hundredths(550),
        };
        assert_eq!(preview.difference(), Quantity::from_hundredths(-250));
        assert_eq!(preview.signed_difference(), "-2.50");
    }

    #[test]
    fn note_spells_out_the_adjustment() {
        let note = correction_note("Stock-take correction", Quantity::from_units(6), Quantity::from_units(5));
        assert_eq!(note, "Stock-take correction: counted 6 - recorded 5 = difference +1");
    }
}

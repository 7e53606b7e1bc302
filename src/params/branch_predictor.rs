//! Branch predictor records, consumed by the front end.

use super::error::{ConfigError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PredictorKind {
    #[default]
    #[serde(alias = "BiModeBP")]
    BiMode,
    #[serde(alias = "LocalBP")]
    Local,
    #[serde(alias = "TournamentBP")]
    Tournament,
    #[serde(alias = "TAGE")]
    Tage,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BranchPredictorParams {
    #[serde(default)]
    pub kind: PredictorKind,
    pub global_predictor_size: u32,
    pub global_ctr_bits: u32,
    pub choice_predictor_size: u32,
    pub choice_ctr_bits: u32,
    pub btb_entries: u32,
    pub btb_tag_size: u32,
    pub ras_size: u32,
    #[serde(default = "BranchPredictorParams::default_inst_shift_amt")]
    pub inst_shift_amt: u32,
}

impl BranchPredictorParams {
    fn default_inst_shift_amt() -> u32 {
        2
    }
    /// Bi-mode predictor of the reference high performance core.
    pub fn bimode() -> Self {
        Self {
            kind: PredictorKind::BiMode,
            global_predictor_size: 8192,
            global_ctr_bits: 2,
            choice_predictor_size: 8192,
            choice_ctr_bits: 2,
            btb_entries: 4096,
            btb_tag_size: 16,
            ras_size: 16,
            inst_shift_amt: 2,
        }
    }
    /// Storage of the direction tables in bits.
    pub fn table_bits(&self) -> u64 {
        u64::from(self.global_predictor_size) * u64::from(self.global_ctr_bits)
            + u64::from(self.choice_predictor_size) * u64::from(self.choice_ctr_bits)
    }
    pub fn validate(&self) -> Result<()> {
        let tables = [
            ("global predictor size", self.global_predictor_size),
            ("choice predictor size", self.choice_predictor_size),
            ("BTB entries", self.btb_entries),
        ];
        for (what, size) in tables.iter() {
            if !size.is_power_of_two() {
                return Err(ConfigError::Validation {
                    detail: format!("branch predictor: {} {} is not a power of two", what, size),
                });
            }
        }
        for (what, bits) in [
            ("global", self.global_ctr_bits),
            ("choice", self.choice_ctr_bits),
        ]
        .iter()
        {
            if !(1..=8).contains(bits) {
                return Err(ConfigError::Validation {
                    detail: format!("branch predictor: {} counter of {} bits", what, bits),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod branch_predictor {
    use super::*;

    #[test]
    fn reference_bimode_is_valid() -> Result<()> {
        let bp = BranchPredictorParams::bimode();
        bp.validate()?;
        assert_eq!(2 * 8192 * 2, bp.table_bits());
        Ok(())
    }

    #[test]
    fn table_size_must_be_power_of_two() {
        let mut bp = BranchPredictorParams::bimode();
        bp.choice_predictor_size = 6000;
        assert!(bp.validate().is_err());
    }

    #[test]
    fn counter_width() {
        let mut bp = BranchPredictorParams::bimode();
        bp.global_ctr_bits = 0;
        assert!(bp.validate().is_err());
        bp.global_ctr_bits = 9;
        assert!(bp.validate().is_err());
    }
}

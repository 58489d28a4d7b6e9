//! Wallet Module
//!
//! Seed handling, denomination planning and proof selection.

mod keygen;
pub mod denomination;
pub mod selection;

pub use keygen::*;
pub use denomination::{
    calculate_number_of_blank_outputs, plan_distribution, split, split_into_base2_numbers,
};
pub use selection::{
    calculate_fee, input_fee_ppk, pick, ppk_to_fee, select_proofs_to_sum_target, ProofSelection,
};

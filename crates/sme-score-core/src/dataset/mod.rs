//! Dataset normalization: raw row tables in, per-business chronological
//! series out.

mod normalize;
mod raw;

pub use normalize::{normalize_bundle, NormalizedBundle};
pub use raw::{
    RawAdSpendRow, RawBundle, RawBusinessRow, RawCashFlowRow, RawLoanRow, RawTransactionRow,
};

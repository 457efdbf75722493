//! Pure helper functions used by the settlement flow.
//!
//! Nothing in this module touches the database; everything is total over its inputs so it can be
//! re-run safely during webhook redeliveries and consistency passes.
mod inventory;
mod variant_matcher;

pub use inventory::{aggregate_stock, clamp_to_available, is_available, product_stock, variant_stock};
pub use variant_matcher::{resolve_variant, VariantMatch};

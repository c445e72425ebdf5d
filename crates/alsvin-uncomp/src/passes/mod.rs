//! Built-in uncomputation passes.

pub mod greedy;
pub mod reduce;
pub mod reversal;
pub mod truncate;

pub use greedy::{
    GreedyCycleBreak, antidep_pressure, break_cycles_greedy, drop_stale_antideps,
    uncompute_borrowed,
};
pub use reduce::{
    PruneToReference, SuffixReference, prune_to_reference, prune_with, suffix_reversal_reference,
};
pub use reversal::{AncillaReversal, FullReversal, full_reversal, uncompute_ancillas,
    uncompute_wires};
pub use truncate::{TruncateInputs, truncate_unrequired_inputs};

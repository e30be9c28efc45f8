//! Tiered resolution of free-text names and location signals.
//!
//! Both matchers work the same way: an explicit, ordered list of tiers is
//! run by [`first_match`], the first tier that yields a candidate wins, and
//! a final default tier guarantees a result whenever the candidate list
//! holds at least one eligible entry.
//!
//! - [`ProductMatcher`]: exact name → alias table → two-character prefix →
//!   first available product
//! - [`RegionMatcher`]: mock code → province → partial province →
//!   reverse-geocoded coordinates → default region

pub mod product;
pub mod region;
pub mod tables;

pub use product::{empty_resolution, fallback_resolution, first_available, ProductMatcher};
pub use region::{RegionMatch, RegionMatcher, RegionTier, ReverseGeocoder};
pub use tables::{AliasTable, ProvinceTable, DEFAULT_REGION_CODE};

use std::fmt::Debug;

/// Run `attempt` over `tiers` in order and return the first hit together
/// with the tier that produced it.
pub fn first_match<T, R>(tiers: &[T], mut attempt: impl FnMut(T) -> Option<R>) -> Option<(T, R)>
where
    T: Copy + Debug,
{
    tiers.iter().find_map(|&tier| {
        let hit = attempt(tier);
        if hit.is_none() {
            tracing::trace!(?tier, "Tier did not match");
        }
        hit.map(|hit| (tier, hit))
    })
}

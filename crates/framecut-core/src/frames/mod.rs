//! Frame region detection and perforation-guided filtering
//!
//! The detector deliberately over-generates: every closed edge structure in
//! the image becomes a candidate. The filter then keeps only candidates
//! whose size matches what the perforation pitch predicts for a 35mm frame.

mod detect;
mod filter;

#[cfg(test)]
mod tests;

pub use detect::{detect_regions, edge_mask};
pub use filter::{dedup_frames, filter_by_perforations, FrameEnvelope};

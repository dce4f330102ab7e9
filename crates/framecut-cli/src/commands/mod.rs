//! Command implementations for the framecut CLI.

mod detect;
mod extract;
mod perf_stats;
mod profile;

// Re-export all command functions
pub use detect::cmd_detect;
pub use extract::cmd_extract;
pub use perf_stats::cmd_perf_stats;
pub use profile::{cmd_profile_list, cmd_profile_save, cmd_profile_show};

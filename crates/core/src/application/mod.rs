// Application Layer - Polling and hardware lifecycle

pub mod constants;
pub mod hardware;
pub mod matcher;
pub mod polling;

// Re-exports
pub use hardware::{Hardware, HardwareConfig};
pub use matcher::{
    predicate, regex_count_matcher, regex_matcher, simple_matcher, Equals, Matcher, Predicate,
    RegexCount, RegexMatch,
};
pub use polling::{decode, wait_for_command, wait_for_result, wait_for_success, PollPolicy};

//! Database repositories.

mod poll;
mod record;

pub use poll::PollRepository;
pub use record::RecordRepository;

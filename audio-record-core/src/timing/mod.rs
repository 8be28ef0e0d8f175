pub mod manual_clock;
pub mod system_clock;

mod queue;

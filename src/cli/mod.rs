pub mod command;
pub mod rip;

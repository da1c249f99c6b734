//! Terminal driver for one stock-take pass.

pub mod command;
pub mod demo;
pub mod driver;

pub use command::Command;
pub use driver::run;

pub mod data;
pub mod io;
pub mod printing;
pub mod settings;

pub use data::Config;

#[cfg(test)]
pub mod tests;

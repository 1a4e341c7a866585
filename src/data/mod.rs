pub mod conversions;
pub mod ufo;

pub use conversions::parse_name;
pub use ufo::UfoDirectory;

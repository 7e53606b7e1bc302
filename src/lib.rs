pub mod core;
pub mod display;
pub mod functional_units;
pub mod issue;
pub mod params;
pub mod util;

pub mod descriptor;
pub mod factory;
pub mod instance;
pub mod power;

pub mod age_engine;
mod armor;
mod frame;
pub mod key_material;

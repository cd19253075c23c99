pub mod decode;
pub mod power;

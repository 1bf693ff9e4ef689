pub mod decoder;
pub mod scanner;

pub use decoder::decode_atc_data;
pub use scanner::run_scanner;

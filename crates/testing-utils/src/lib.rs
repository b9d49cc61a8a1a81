pub mod bin;
pub mod stub;

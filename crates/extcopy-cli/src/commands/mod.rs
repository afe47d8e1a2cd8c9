pub mod copy;
pub mod version;

pub mod launcher;
pub mod legacy;
pub mod storage;

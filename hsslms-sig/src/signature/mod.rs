pub mod hss;
pub mod lmots;
pub mod lms;

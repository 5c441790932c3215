pub mod a001_student;
pub mod common;

pub mod a001_student;
pub mod d100_registration_summary;

pub mod a001_student;

pub mod d100_registration_summary;

pub mod instructions;
pub mod launcher;

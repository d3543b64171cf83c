pub mod assembler;
pub mod context;
pub mod matching;

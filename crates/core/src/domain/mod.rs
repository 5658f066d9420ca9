pub mod market;
pub mod recommendation;
pub mod trading;

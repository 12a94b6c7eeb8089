pub mod data;
pub mod evaluate;
pub mod inference;
pub mod model;
pub mod training;

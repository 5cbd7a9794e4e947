pub mod contract;
pub mod game;
pub mod odds;
pub mod prediction;
pub mod team;

pub mod analytics;
pub mod ideas;
pub mod recommendation;
pub mod roadmap;
pub mod team_formation;

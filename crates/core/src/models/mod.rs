pub mod analytics;
pub mod chart;
pub mod company;
pub mod ids;
pub mod investment;
pub mod portfolio;
pub mod price;
pub mod settings;

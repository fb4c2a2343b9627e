pub mod aggregation_service;
pub mod chart_service;
pub mod position_service;
pub mod price_service;
pub mod valuation_service;

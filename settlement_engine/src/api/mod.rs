mod catalog_api;
mod settlement_flow_api;

pub use catalog_api::CatalogApi;
pub use settlement_flow_api::SettlementFlowApi;

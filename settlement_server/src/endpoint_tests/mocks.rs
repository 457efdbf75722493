use mockall::mock;
use settlement_engine::{
    db_types::{EventId, NewOrder, Order, OrderId, PaymentLinkage, Product, ProductWrite},
    traits::{SettlementGatewayDatabase, SettlementGatewayError, SettlementOutcome},
};

mock! {
    pub SettlementGateway {}

    impl Clone for SettlementGateway {
        fn clone(&self) -> Self;
    }

    impl SettlementGatewayDatabase for SettlementGateway {
        fn url(&self) -> &str;
        async fn is_event_processed(&self, event_id: &EventId) -> Result<bool, SettlementGatewayError>;
        async fn settle_order(&self, event_id: &EventId, event_type: &str, order_id: &OrderId, linkage: &PaymentLinkage) -> Result<SettlementOutcome, SettlementGatewayError>;
        async fn enforce_product_stock(&self, product_id: &str) -> Result<Option<i64>, SettlementGatewayError>;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementGatewayError>;
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementGatewayError>;
        async fn fetch_orders(&self) -> Result<Vec<Order>, SettlementGatewayError>;
        async fn mark_order_ready(&self, order_id: &OrderId) -> Result<Order, SettlementGatewayError>;
        async fn create_product(&self, product: ProductWrite) -> Result<Product, SettlementGatewayError>;
        async fn update_product(&self, id: &str, product: ProductWrite) -> Result<Option<Product>, SettlementGatewayError>;
        async fn delete_product(&self, id: &str) -> Result<bool, SettlementGatewayError>;
        async fn fetch_product(&self, id: &str) -> Result<Option<Product>, SettlementGatewayError>;
        async fn fetch_products(&self) -> Result<Vec<Product>, SettlementGatewayError>;
    }
}

use crate::domain::Order;
use crate::domain::entities::{ODERO_PAYMENT_KEY, OrderNote};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::OrderStatus;
use crate::ports::order_store_port::OrderStorePort;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct State {
    orders: HashMap<String, Order>,
    notes: HashMap<String, Vec<OrderNote>>,
    stock: HashMap<String, i64>,
}

/// 线程安全的内存订单存储
///
/// 没有配置数据库时使用，也用于测试。
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: Order) {
        let mut state = self.state.write().await;
        state.orders.insert(order.id.clone(), order);
    }

    /// 设置商品库存
    pub async fn set_stock(&self, product_id: &str, quantity: i64) {
        let mut state = self.state.write().await;
        state.stock.insert(product_id.to_string(), quantity);
    }

    pub async fn stock_of(&self, product_id: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.stock.get(product_id).copied()
    }

    pub async fn notes(&self, order_id: &str) -> Vec<OrderNote> {
        let state = self.state.read().await;
        state.notes.get(order_id).cloned().unwrap_or_default()
    }
}

fn not_found(order_id: &str) -> DomainError {
    DomainError::OrderNotFound(order_id.to_string())
}

#[async_trait]
impl OrderStorePort for InMemoryOrderStore {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(id).cloned())
    }

    async fn find_by_order_number(&self, order_number: &str) -> DomainResult<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|order| order.order_number == order_number)
            .cloned())
    }

    async fn set_payment_method(&self, order_id: &str, method: &str) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(order_id).ok_or_else(|| not_found(order_id))?;
        order.payment_method = Some(method.to_string());
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
        note: &str,
    ) -> DomainResult<bool> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(order_id).ok_or_else(|| not_found(order_id))?;

        let from = order.status.clone();
        if !order.transition_to(status) {
            return Ok(false);
        }

        let note = OrderNote {
            note: format!("{} Order status changed from {} to {}.", note, from, status),
            created_at: Utc::now(),
        };
        state.notes.entry(order_id.to_string()).or_default().push(note);
        Ok(true)
    }

    async fn add_payment_id(&self, order_id: &str, payment_id: &str) -> DomainResult<bool> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(order_id).ok_or_else(|| not_found(order_id))?;
        let written = order.attach_payment_id(payment_id);
        if !written {
            debug!(
                "{} already set for order {}: {:?}",
                ODERO_PAYMENT_KEY,
                order_id,
                order.odero_payment_id()
            );
        }
        Ok(written)
    }

    async fn replace_payment_id(&self, order_id: &str, payment_id: &str) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(order_id).ok_or_else(|| not_found(order_id))?;
        order.replace_payment_id(payment_id);
        Ok(())
    }

    async fn reduce_stock_once(&self, order_id: &str) -> DomainResult<bool> {
        let mut state = self.state.write().await;
        let State { orders, stock, .. } = &mut *state;
        let order = orders.get_mut(order_id).ok_or_else(|| not_found(order_id))?;

        if !order.mark_stock_reduced() {
            return Ok(false);
        }
        for item in &order.items {
            if let Some(level) = stock.get_mut(&item.product_id) {
                *level -= i64::from(item.quantity);
            }
        }
        Ok(true)
    }
}

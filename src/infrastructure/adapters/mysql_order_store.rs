use crate::domain::entities::{Address, ODERO_PAYMENT_KEY, Order, OrderItem, TaxTotal};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::OrderStatus;
use crate::ports::order_store_port::OrderStorePort;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, Pool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const ORDER_COLUMNS: &str = r#"
    id, order_number, currency, status, payment_method,
    billing_address_1, billing_address_2, billing_city, billing_country,
    shipping_address_1, shipping_address_2, shipping_city, shipping_country,
    billing_email, billing_phone, shipping_phone, shipping_method,
    shipping_total, discount_total, view_url, stock_reduced,
    created_at, updated_at
"#;

/// MySQL订单存储实现
#[derive(Clone)]
pub struct MySqlOrderStore {
    pool: Arc<Pool<MySql>>,
}

impl MySqlOrderStore {
    pub fn new(pool: Arc<Pool<MySql>>) -> Self {
        Self { pool }
    }

    async fn find_where(&self, column: &str, value: &str) -> DomainResult<Option<Order>> {
        let query = format!("SELECT {} FROM orders WHERE {} = ?", ORDER_COLUMNS, column);

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row {
            Some(row) => self.load_children(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn load_children(&self, row: OrderRow) -> DomainResult<Order> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT product_id, name, unit_price_excl_tax, quantity, image_url
            FROM order_items
            WHERE order_id = ?
            ORDER BY position
            "#,
        )
        .bind(&row.id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let taxes = sqlx::query_as::<_, TaxTotalRow>(
            r#"
            SELECT tax_id, label, amount
            FROM order_tax_totals
            WHERE order_id = ?
            ORDER BY tax_id
            "#,
        )
        .bind(&row.id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let meta = sqlx::query_as::<_, MetaRow>(
            "SELECT meta_key, meta_value FROM order_meta WHERE order_id = ?",
        )
        .bind(&row.id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(row.into_order(items, taxes, meta))
    }
}

#[async_trait]
impl OrderStorePort for MySqlOrderStore {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Order>> {
        self.find_where("id", id).await
    }

    async fn find_by_order_number(&self, order_number: &str) -> DomainResult<Option<Order>> {
        self.find_where("order_number", order_number).await
    }

    async fn set_payment_method(&self, order_id: &str, method: &str) -> DomainResult<()> {
        sqlx::query("UPDATE orders SET payment_method = ?, updated_at = ? WHERE id = ?")
            .bind(method)
            .bind(Utc::now())
            .bind(order_id)
            .execute(self.pool.as_ref())
            .await?;

        debug!("Payment method set for order {}: {}", order_id, method);
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
        note: &str,
    ) -> DomainResult<bool> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = ? FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (raw,) = current.ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))?;

        if is_current_status(&raw, status) {
            tx.commit().await?;
            return Ok(false);
        }

        let from = OrderStatus::new(raw);
        let now = Utc::now();
        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO order_notes (order_id, note, created_at) VALUES (?, ?, ?)")
            .bind(order_id)
            .bind(format!("{} Order status changed from {} to {}.", note, from, status))
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!("Order {} status changed: {} -> {}", order_id, from, status);
        Ok(true)
    }

    async fn add_payment_id(&self, order_id: &str, payment_id: &str) -> DomainResult<bool> {
        if payment_id.is_empty() {
            return Ok(false);
        }

        // (order_id, meta_key) 唯一索引保证先写入者生效
        let result = sqlx::query(
            "INSERT IGNORE INTO order_meta (order_id, meta_key, meta_value) VALUES (?, ?, ?)",
        )
        .bind(order_id)
        .bind(ODERO_PAYMENT_KEY)
        .bind(payment_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn replace_payment_id(&self, order_id: &str, payment_id: &str) -> DomainResult<()> {
        if payment_id.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO order_meta (order_id, meta_key, meta_value) VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE meta_value = VALUES(meta_value)
            "#,
        )
        .bind(order_id)
        .bind(ODERO_PAYMENT_KEY)
        .bind(payment_id)
        .execute(self.pool.as_ref())
        .await?;

        debug!("{} replaced for order {}: {}", ODERO_PAYMENT_KEY, order_id, payment_id);
        Ok(())
    }

    async fn reduce_stock_once(&self, order_id: &str) -> DomainResult<bool> {
        let mut tx = self.pool.begin().await?;

        let flagged = sqlx::query(
            "UPDATE orders SET stock_reduced = 1, updated_at = ? WHERE id = ? AND stock_reduced = 0",
        )
        .bind(Utc::now())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        if flagged.rows_affected() == 0 {
            tx.commit().await?;
            return Ok(false);
        }

        let items: Vec<(String, u32)> =
            sqlx::query_as("SELECT product_id, quantity FROM order_items WHERE order_id = ?")
                .bind(order_id)
                .fetch_all(&mut *tx)
                .await?;

        for (product_id, quantity) in &items {
            sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - ?
                WHERE id = ? AND stock_quantity IS NOT NULL
                "#,
            )
            .bind(i64::from(*quantity))
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!("Stock reduced for order {} ({} items)", order_id, items.len());
        Ok(true)
    }
}

/// 存储值可能带 "wc-" 前缀，先规范化再比较
fn is_current_status(stored: &str, target: &OrderStatus) -> bool {
    OrderStatus::new(stored) == *target
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    currency: String,
    status: String,
    payment_method: Option<String>,
    billing_address_1: String,
    billing_address_2: String,
    billing_city: String,
    billing_country: Option<String>,
    shipping_address_1: String,
    shipping_address_2: String,
    shipping_city: String,
    shipping_country: Option<String>,
    billing_email: Option<String>,
    billing_phone: Option<String>,
    shipping_phone: Option<String>,
    shipping_method: Option<String>,
    shipping_total: Decimal,
    discount_total: Decimal,
    view_url: String,
    stock_reduced: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    name: String,
    unit_price_excl_tax: Decimal,
    quantity: u32,
    image_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TaxTotalRow {
    tax_id: String,
    label: String,
    amount: Decimal,
}

#[derive(sqlx::FromRow)]
struct MetaRow {
    meta_key: String,
    meta_value: String,
}

impl OrderRow {
    fn into_order(
        self,
        items: Vec<OrderItemRow>,
        taxes: Vec<TaxTotalRow>,
        meta: Vec<MetaRow>,
    ) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            currency: self.currency,
            status: OrderStatus::new(self.status),
            payment_method: self.payment_method,
            billing: Address {
                address_1: self.billing_address_1,
                address_2: self.billing_address_2,
                city: self.billing_city,
                country: self.billing_country.filter(|c| !c.is_empty()),
            },
            shipping: Address {
                address_1: self.shipping_address_1,
                address_2: self.shipping_address_2,
                city: self.shipping_city,
                country: self.shipping_country.filter(|c| !c.is_empty()),
            },
            billing_email: self.billing_email,
            billing_phone: self.billing_phone,
            shipping_phone: self.shipping_phone,
            shipping_method: self.shipping_method,
            items: items
                .into_iter()
                .map(|row| OrderItem {
                    product_id: row.product_id,
                    name: row.name,
                    unit_price_excl_tax: row.unit_price_excl_tax,
                    quantity: row.quantity,
                    image_url: row.image_url,
                })
                .collect(),
            shipping_total: self.shipping_total,
            tax_totals: taxes
                .into_iter()
                .map(|row| TaxTotal {
                    id: row.tax_id,
                    label: row.label,
                    amount: row.amount,
                })
                .collect(),
            discount_total: self.discount_total,
            view_url: self.view_url,
            meta: meta
                .into_iter()
                .map(|row| (row.meta_key, row.meta_value))
                .collect::<HashMap<_, _>>(),
            stock_reduced: self.stock_reduced,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

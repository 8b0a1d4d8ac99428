use crate::domain::Order;
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::OrderStatus;
use async_trait::async_trait;

/// 宿主平台订单存储端口接口
#[async_trait]
pub trait OrderStorePort: Send + Sync + 'static {
    /// 根据ID查找订单
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Order>>;

    /// 根据订单号查找
    async fn find_by_order_number(&self, order_number: &str) -> DomainResult<Option<Order>>;

    /// 设置支付方式
    async fn set_payment_method(&self, order_id: &str, method: &str) -> DomainResult<()>;

    /// 更新订单状态并写入备注
    ///
    /// 订单已处于目标状态时不做任何修改，返回 false。
    async fn update_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
        note: &str,
    ) -> DomainResult<bool>;

    /// 关联 OderoPay 支付ID，先写入者生效
    async fn add_payment_id(&self, order_id: &str, payment_id: &str) -> DomainResult<bool>;

    /// 写入本次结账创建的支付ID，覆盖之前的值
    async fn replace_payment_id(&self, order_id: &str, payment_id: &str) -> DomainResult<()>;

    /// 扣减订单商品库存，每个订单只扣减一次
    async fn reduce_stock_once(&self, order_id: &str) -> DomainResult<bool>;
}

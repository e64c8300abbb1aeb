use crate::{
    dto::{PlatformSales, SalesStatistics},
    entities::sale,
    errors::ServiceError,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

use super::Query;

/// Money figures are reported to the cent
const MONEY_SCALE: u32 = 2;

/// Revenue and unit totals, overall and per platform
#[derive(Debug, Default)]
pub struct SalesStatisticsQuery;

#[async_trait]
impl Query for SalesStatisticsQuery {
    type Result = SalesStatistics;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let totals: Option<(Option<Decimal>, Option<i64>)> = sale::Entity::find()
            .select_only()
            .column_as(sale::Column::TotalPrice.sum(), "total_revenue")
            .column_as(sale::Column::Quantity.sum(), "total_units")
            .into_tuple()
            .one(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let per_platform: Vec<(String, Option<Decimal>, Option<i64>)> = sale::Entity::find()
            .select_only()
            .column(sale::Column::Platform)
            .column_as(sale::Column::TotalPrice.sum(), "total_revenue")
            .column_as(sale::Column::Quantity.sum(), "total_units")
            .group_by(sale::Column::Platform)
            .order_by_asc(sale::Column::Platform)
            .into_tuple()
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let (total_revenue, total_units) = totals.unwrap_or((None, None));
        let stats = SalesStatistics {
            total_revenue: money(total_revenue),
            total_units: total_units.unwrap_or(0),
            by_platform: per_platform
                .into_iter()
                .map(|(platform, revenue, units)| PlatformSales {
                    platform,
                    total_revenue: money(revenue),
                    total_units: units.unwrap_or(0),
                })
                .collect(),
        };

        debug!(
            platforms = stats.by_platform.len(),
            total_units = stats.total_units,
            "Computed sales statistics"
        );

        Ok(stats)
    }
}

fn money(sum: Option<Decimal>) -> Decimal {
    sum.unwrap_or(Decimal::ZERO).round_dp(MONEY_SCALE)
}

/// Sales of a single product, most recent first
#[derive(Debug)]
pub struct SalesByProductQuery {
    pub product_id: i32,
}

#[async_trait]
impl Query for SalesByProductQuery {
    type Result = Vec<sale::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        sale::Entity::find()
            .filter(sale::Column::ProductId.eq(self.product_id))
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_defaults_to_zero_and_rounds() {
        assert_eq!(money(None), Decimal::ZERO);
        assert_eq!(money(Some(dec!(10.005))), dec!(10.00));
        assert_eq!(money(Some(dec!(1599.98))), dec!(1599.98));
    }
}

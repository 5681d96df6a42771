//! Database operations for orders and their files.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::{debug, error, info};

use crate::entity::order::{self, Entity as Order};
use crate::entity::order_file::{self, Entity as OrderFile};
use crate::error::{AppError, AppResult, IngestError};
use crate::models::NewOrder;
use crate::services::MetadataStore;

use super::DbPool;

impl DbPool {
    /// Insert an order and its files inside a single transaction.
    ///
    /// Any failure rolls the whole transaction back before returning.
    pub async fn insert_order_with_files(
        &self,
        order: &NewOrder,
        files: &[String],
    ) -> Result<i32, DbErr> {
        let txn = self.connection().begin().await?;

        match insert_rows(&txn, order, files).await {
            Ok(order_id) => {
                txn.commit().await?;
                Ok(order_id)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(
                        order_number = %order.number,
                        "Rollback failed: {}", rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Get an order by its public number.
    pub async fn get_order_by_number(&self, number: &str) -> AppResult<Option<order::Model>> {
        Order::find()
            .filter(order::Column::Number.eq(number))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get order: {}", e)))
    }

    /// Get the file rows of an order, in insertion order.
    pub async fn get_order_files(&self, order_id: i32) -> AppResult<Vec<order_file::Model>> {
        OrderFile::find()
            .filter(order_file::Column::OrderId.eq(order_id))
            .order_by_asc(order_file::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get order files: {}", e)))
    }

    /// Count all orders.
    pub async fn count_orders(&self) -> AppResult<u64> {
        Order::find()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count orders: {}", e)))
    }

    /// Count all order file rows.
    pub async fn count_order_files(&self) -> AppResult<u64> {
        OrderFile::find()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count order files: {}", e)))
    }
}

async fn insert_rows(
    txn: &DatabaseTransaction,
    order: &NewOrder,
    files: &[String],
) -> Result<i32, DbErr> {
    let model = order::ActiveModel {
        number: Set(order.number.clone()),
        name: Set(order.name.clone()),
        email: Set(order.email.clone()),
        institution: Set(order.institution.clone()),
        date_created: Set(Utc::now()),
        ..Default::default()
    };

    let order_id = Order::insert(model).exec(txn).await?.last_insert_id;
    debug!(order_id, order_number = %order.number, "Inserted order row");

    for file in files {
        let row = order_file::ActiveModel {
            order_id: Set(order_id),
            file: Set(file.clone()),
            ..Default::default()
        };
        OrderFile::insert(row).exec(txn).await?;
        debug!(order_id, file = %file, "Inserted order file row");
    }

    Ok(order_id)
}

#[async_trait]
impl MetadataStore for DbPool {
    async fn commit(&self, order: &NewOrder, files: &[String]) -> Result<i32, IngestError> {
        let order_id = self
            .insert_order_with_files(order, files)
            .await
            .map_err(|source| IngestError::PersistenceFailed {
                order_number: order.number.clone(),
                source,
            })?;

        info!(
            order_id,
            order_number = %order.number,
            files = files.len(),
            "Order committed"
        );

        Ok(order_id)
    }
}

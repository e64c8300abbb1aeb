/*!
 * Transaction scope
 *
 * Every multi-row write goes through [`transaction_scope`]: the closure receives
 * a `&DatabaseTransaction` that lives only as long as the closure's future, the
 * transaction commits when the closure returns `Ok` and rolls back on `Err`.
 * The closure's own error value is handed back to the caller unchanged.
 */

use futures::future::BoxFuture;
use metrics::counter;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use tracing::{debug, warn};

/// Execute `f` within a database transaction
///
/// # Example
///
/// ```rust,ignore
/// let sale = transaction_scope(&db, |txn| {
///     Box::pin(async move {
///         let sale = new_sale.insert(txn).await?;
///         history.insert(txn).await?;
///         Ok::<_, ServiceError>(sale)
///     })
/// })
/// .await?;
/// ```
pub async fn transaction_scope<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
    T: Send,
    E: From<DbErr> + std::error::Error + Send,
{
    let result = db.transaction::<F, T, E>(f).await;

    match &result {
        Ok(_) => {
            counter!("ecommerce_admin.db.transaction.committed", 1);
            debug!("Transaction committed");
        }
        Err(TransactionError::Connection(e)) => {
            counter!("ecommerce_admin.db.transaction.failed", 1);
            warn!(error = %e, "Transaction could not be started or committed");
        }
        Err(TransactionError::Transaction(e)) => {
            counter!("ecommerce_admin.db.transaction.rolled_back", 1);
            debug!(error = %e, "Transaction rolled back");
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}

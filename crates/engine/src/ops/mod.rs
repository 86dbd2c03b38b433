use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder, QuerySelect, prelude::*,
    sea_query::Expr,
};

use crate::{DocumentStatus, EngineError, ResultEngine};

mod balances;
mod numbering;
mod productions;
mod reconcile;
mod transactions;

pub use reconcile::{Discrepancy, LedgerKey};
pub use transactions::TransactionListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Load the children of a document in attachment order.
async fn load_children<E, T, C>(
    db: &C,
    owner_column: E::Column,
    position_column: E::Column,
    owner_id: &str,
) -> ResultEngine<Vec<T>>
where
    E: EntityTrait,
    T: TryFrom<E::Model, Error = EngineError>,
    C: ConnectionTrait,
{
    E::find()
        .filter(owner_column.eq(owner_id))
        .order_by_asc(position_column)
        .all(db)
        .await?
        .into_iter()
        .map(T::try_from)
        .collect()
}

/// Move a document from `from` to `to`, returning whether it moved.
///
/// The update is conditional on the stored status, so two concurrent calls
/// cannot both perform the same transition. Lifecycle operations issue it as
/// their first statement: a second caller then waits on the write lock and
/// reads the status the first one committed.
async fn transition<E, C>(
    db: &C,
    id_column: E::Column,
    status_column: E::Column,
    updated_at_column: E::Column,
    id: &str,
    from: DocumentStatus,
    to: DocumentStatus,
    now: DateTime<Utc>,
) -> ResultEngine<bool>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(status_column, Expr::value(to.as_str()))
        .col_expr(updated_at_column, Expr::value(now))
        .filter(id_column.eq(id))
        .filter(status_column.eq(from.as_str()))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Display name of a product for error messages.
async fn product_label<C>(db: &C, product_id: i64) -> ResultEngine<String>
where
    C: ConnectionTrait,
{
    let name: Option<String> = crate::products::Entity::find_by_id(product_id)
        .select_only()
        .column(crate::products::Column::Name)
        .into_tuple()
        .one(db)
        .await?;
    Ok(name.unwrap_or_else(|| format!("#{product_id}")))
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

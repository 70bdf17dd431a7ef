mod flags;
mod setting;

pub use rusqlite::TransactionBehavior;

type PooledConnection = r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>;

pub struct Connection(PooledConnection);

impl Connection {
    pub(crate) fn new(inner: PooledConnection) -> Self {
        Self(inner)
    }

    pub fn transaction(&mut self) -> anyhow::Result<Transaction<'_>> {
        let tx = self.0.transaction()?;
        Ok(Transaction(tx))
    }

    pub fn transaction_with_behavior(
        &mut self,
        behavior: TransactionBehavior,
    ) -> anyhow::Result<Transaction<'_>> {
        let tx = self.0.transaction_with_behavior(behavior)?;
        Ok(Transaction(tx))
    }
}

/// A database transaction.
///
/// Dropping a [Transaction] without calling [Transaction::commit] rolls back
/// every change made through it.
pub struct Transaction<'inner>(rusqlite::Transaction<'inner>);

impl<'inner> Transaction<'inner> {
    pub(crate) fn inner(&self) -> &rusqlite::Transaction<'inner> {
        &self.0
    }

    pub fn commit(self) -> anyhow::Result<()> {
        Ok(self.0.commit()?)
    }

    pub fn rollback(self) -> anyhow::Result<()> {
        Ok(self.0.rollback()?)
    }
}

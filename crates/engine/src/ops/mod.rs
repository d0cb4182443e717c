use sea_orm::DatabaseConnection;

use crate::{ResultEngine, ValidationConfig, Validator};

mod access;
mod balances;
mod funds;
mod members;
mod transactions;

pub use balances::{FundBalances, MemberBalance};
pub use transactions::TransactionPage;

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

/// The ledger: funds, rosters and transaction history on top of a sea-orm
/// connection. Balances and settlements are computed on read.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    validator: Validator,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn validation(&self) -> &ValidationConfig {
        self.validator.config()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    validation: ValidationConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Thresholds used when validating submissions. Defaults apply otherwise.
    pub fn validation(mut self, config: ValidationConfig) -> EngineBuilder {
        self.validation = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            validator: Validator::new(self.validation),
        })
    }
}

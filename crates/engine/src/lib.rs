pub use commands::{CreateMovementCmd, DetailInput, DetailPatch, UpdateMovementCmd};
pub use details::Detail;
pub use error::EngineError;
pub use lock::LockReason;
pub use movements::{Direction, Movement, MovementKind};
pub use ops::{Engine, EngineBuilder};
pub use reconcile::{ReconcilePlan, reconcile};
pub use stock_entries::StockEntry;
pub use supplies::Supply;

mod commands;
mod details;
mod error;
mod lock;
mod movements;
mod ops;
mod reconcile;
mod stock_entries;
mod supplies;

type ResultEngine<T> = Result<T, EngineError>;

use crate::db_persistence::DbError;

pub type DbResult<T> = Result<T, DbError>;

pub mod event;
pub mod ticket;
pub mod user;

use std::fmt::{self, Display};

use potion::{Error, HtmlError};

pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        let info = match &value {
            sqlx::Error::RowNotFound => String::from("Row not found"),
            sqlx::Error::PoolTimedOut => String::from("Database pool timed out"),
            sqlx::Error::PoolClosed => String::from("Database pool closed"),
            sqlx::Error::Database(e) => match e.constraint() {
                Some(constraint) => format!("{e} (constraint {constraint})"),
                None => e.to_string(),
            },
            e => e.to_string(),
        };
        Self::new(info)
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        log::error!("Query failed: {}", value.info);
        Error {
            code: 500,
            info: Some(value.info),
            redirect: None,
        }
    }
}

pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl From<CacheError> for Error {
    fn from(value: CacheError) -> Self {
        Error {
            code: 500,
            info: Some(value.info),
            redirect: None,
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        HtmlError::InvalidRequest.new(&value.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

/// Raised by a shopping list renderer. The export path reports it as "Not found".
#[derive(Debug)]
pub struct RenderError {
    info: String,
}

impl RenderError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render failed: {}", self.info)
    }
}

impl std::error::Error for RenderError {}

impl From<RenderError> for Error {
    fn from(value: RenderError) -> Self {
        log::warn!("{value}");
        not_found("Not found")
    }
}

pub fn not_found(info: &str) -> Error {
    Error {
        code: 404,
        info: Some(info.to_string()),
        redirect: None,
    }
}

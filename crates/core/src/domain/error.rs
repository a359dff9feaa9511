// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid node name: {0:?}")]
    InvalidNodeName(String),

    #[error("Invalid node role: {0}")]
    InvalidRole(String),

    #[error("Node index overflows u32: offset {offset} with {count} nodes per role")]
    NodeIndexOverflow { offset: u32, count: u32 },
}

pub type Result<T> = std::result::Result<T, DomainError>;

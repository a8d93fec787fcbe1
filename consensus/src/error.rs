use thiserror::Error;

use types::compact::Compact;

#[derive(Error, Debug)]
pub enum Error {
    #[error("parent block not found")]
    ParentBlockNotFound,
    #[error("block timestamp too far in the future")]
    TimeTooNew,
    #[error("bad block target expected {0:?} got {1:?}")]
    BlockBadTarget(Compact, Compact),
    #[error("bad proof of work")]
    BadPow,
}

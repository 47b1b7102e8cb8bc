//! Message source port used by the background generator.

use super::{Message, MessageSourceError};

#[cfg_attr(test, mockall::automock)]
pub trait MessageSource: Send {
    fn next_message(&mut self) -> Result<Message, MessageSourceError>;
}

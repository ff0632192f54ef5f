use crate::error::QueueError;

pub type QueueResult = Result<(), QueueError>;

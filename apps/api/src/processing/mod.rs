// Async message processing.
// The webhook persists and enqueues; a small worker pool drains the queue
// and runs each message through attribution, classification, issue creation
// and mention dispatch. Every step is idempotent so a message can be
// reprocessed at any time.

pub mod processor;
pub mod queue;

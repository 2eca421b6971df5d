// Inbound message gateway.
// Verifies provider signatures, persists raw messages and hands them to the
// processing queue. The ack path never blocks on anything downstream.

pub mod handlers;
pub mod signature;

//! Job scheduling for webqueue.
//!
//! Holds the in-memory work queue, its JSON ledger on disk, the per-job
//! result store and the single worker that drains the queue.

pub mod ledger;
mod persist;
pub mod queue;
pub mod scheduler;
pub mod store;
pub mod worker;

pub use ledger::QueueLedger;
pub use queue::WorkQueue;
pub use scheduler::Scheduler;
pub use store::ResultStore;
pub use worker::Worker;

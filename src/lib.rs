//! # faultline-gateway
//!
//! REST API gateway for application error-event ingestion, durable storage,
//! and cached aggregate views.
//!
//! Clients report errors over HTTP; the gateway validates the submission,
//! stamps a content fingerprint, hands the event to a Redis-backed work
//! queue (falling back to a synchronous PostgreSQL write when the queue is
//! unavailable), and serves list/detail/statistics queries through
//! read-through caches that are bulk-invalidated after every mutation.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ErrorService (service/)          QueueWorker (service/)
//!     │        │                                │
//!     ├── CacheStore — Redis (cache/)  ◄────────┤
//!     │     queue · recent ring · TTL caches    │
//!     │                                         │
//!     └── ErrorStore — PostgreSQL (persistence/)◄
//! ```

pub mod api;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;

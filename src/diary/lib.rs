//! # Diary Architecture
//!
//! Diary is a **UI-agnostic journal core**: dated entries, grouped by calendar
//! day, kept consistent while a live change feed adds, edits and removes them.
//! The bundled CLI is one client of the library, not the other way around.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs, print.rs)                           │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs) over commands (commands/*.rs)                 │
//! │  - Resolves id selectors, writes through the backend        │
//! │  - Pages and filters through the ViewModel                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core                                                       │
//! │  - EntryStore: entries + day buckets, cached Snapshot       │
//! │  - DateGrouper: day keys and ordering                       │
//! │  - SyncBridge: feed batches → store, once-per-batch publish │
//! │  - ViewModel: search filter + visible window                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Backends (feed/)                                           │
//! │  - EntryWriter (write path) + ChangeFeed (source of truth)  │
//! │  - JsonFileFeed (CLI), MemoryFeed (tests, embedding)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Writes go out, truth comes back
//!
//! Local edits are never applied to the store directly. They are written to the
//! backend, and the backend's feed reports them back like any other change. The
//! store therefore only ever holds what the feed has confirmed.
//!
//! ## Testing
//!
//! Each module carries its own unit tests. Commands and the API are tested
//! against [`feed::memory::MemoryFeed`]; the file backend and the config use
//! temporary directories; `tests/` drives the binary end to end.
//!
//! ## Module Overview
//!
//! - [`model`]: `Entry`, `EntryId`, drafts and patches
//! - [`timestamp`]: the timestamp shapes a payload may carry, normalized to UTC
//! - [`grouper`]: `DateGrouper`, `DayKey`, `DayBucket`, `Snapshot`
//! - [`store`]: `EntryStore` and its shared handle
//! - [`feed`]: backend contracts and implementations
//! - [`sync`]: `SyncBridge` and subscriptions
//! - [`view_model`]: search and pagination
//! - [`commands`], [`api`]: the operations a client calls
//! - [`config`], [`logging`], [`error`]: ambient plumbing

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod feed;
pub mod grouper;
pub mod logging;
pub mod model;
pub mod store;
pub mod sync;
pub mod timestamp;
pub mod view_model;

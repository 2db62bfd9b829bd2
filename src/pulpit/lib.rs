//! # Pulpit Architecture
//!
//! Pulpit is a **UI-agnostic sermon publishing core**: persistence for a
//! collection of audio sermons with live subscriptions, and a playback
//! controller that keeps play/pause/seek/rate intent in step with an audio
//! transport. The bundled CLI is just one client of the library.
//!
//! ## The Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Client (CLI via main.rs, or any embedding application)      │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Service Facade (api.rs)                                     │
//! │  - Binds to one store backend at construction               │
//! │  - subscribe / save / delete / import, plus export helpers  │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                      │
//! │  - SermonStore trait                                         │
//! │  - LocalStore (JSON file) / RemoteStore (document collection)│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual backend, one branch
//!
//! Whether sermons live in a cloud document collection or a local JSON file
//! is decided exactly once, from [`config::BackendConfig`], when the
//! [`api::SermonService`] is constructed. Everything above the facade is
//! backend-blind; everything below implements the same
//! [`store::SermonStore`] contract. Real network clients are injected at the
//! [`store::remote::DocumentCollection`] seam by the embedding application.
//!
//! ## Change propagation
//!
//! Subscribers get full ordered snapshots, never deltas. On the remote path
//! the live query pushes them; on the local path mutations are announced on
//! an in-process channel and a file watcher covers writers in other
//! processes. A failing remote stream degrades once to a local snapshot
//! rather than leaving subscribers empty-handed.
//!
//! ## Module Overview
//!
//! - [`api`]: the service facade — entry point for all persistence operations
//! - [`store`]: storage contract and both backends
//! - [`model`]: the `Sermon` record and id conventions
//! - [`bus`]: same-process and cross-process change notification
//! - [`player`]: playback intent/transport synchronization
//! - [`enrich`]: best-effort generative metadata with a fixed fallback
//! - [`config`]: startup-read backend configuration
//! - [`error`]: error types

pub mod api;
pub mod bus;
pub mod config;
pub mod enrich;
pub mod error;
pub mod model;
pub mod player;
pub mod store;

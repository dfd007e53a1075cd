//! Tiered conversational memory for a personal agent.
//!
//! Keepsake stores conversational facts in three lifecycle tiers, decays
//! their importance over time, and ranks them for retrieval when the prompt
//! composer asks:
//!
//! | Tier | Purpose | Capacity | Fate |
//! |------|---------|----------|------|
//! | **Short-term** | Fresh chat-turn facts | 100 (FIFO) | Migrated or archived |
//! | **Long-term** | Time-promoted facts | 500 (FIFO) | Archived when decayed |
//! | **Archive** | Audit trail of decayed facts | Unbounded | Terminal |
//!
//! # Architecture
//!
//! - **Storage**: one JSON-array file per tier, mirrored from memory under a
//!   per-tier lock; archive as append-only per-day files
//! - **Scoring**: pure decay and relevance functions, recomputed on demand
//! - **Maintenance**: a background task sweeps decayed entries into the
//!   archive every heartbeat and promotes short→long on a coarser interval
//! - **Collaborators**: vector search lives behind the `SemanticIndexer`
//!   trait; ranked recall feeds the external prompt composer
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`memory`] — Core engine: entry types, tier stores, scoring, maintenance, recall

pub mod config;
pub mod memory;

//! # Knowledge Harness
//!
//! Federated knowledge retrieval for a game-world assistant.
//!
//! A user question is sent to every registered source at once. Each source
//! answers with scored text [`models::Fragment`]s; the [`aggregate`] layer
//! merges them into one ranked, truncated list ready for a prompt builder.
//! A source that fails or panics contributes nothing and never takes the
//! others down.
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────┐
//!         query ─────▶│  Aggregator  │─────▶ ranked fragments
//!                     └──────┬───────┘
//!        ┌──────────────┬────┴─────────┬──────────────┐
//!        ▼              ▼              ▼              ▼
//!   ┌─────────┐   ┌──────────┐   ┌────────────┐  ┌──────────┐
//!   │  Wiki   │   │ Off-game │   │ Calculator │  │ Ranking  │
//!   │ SQLite  │   │   JSON   │   │ stats JSON │  │ HTTP+TTL │
//!   └─────────┘   └──────────┘   └────────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kh init                                    # create the wiki table
//! kh sources                                 # check every source
//! kh ask "que dropea el dragon rojo"
//! kh top nivel --class mago --limit 5
//! kh serve                                   # JSON API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Fragments and corpus rows |
//! | [`normalize`] | Accent folding, stopwords, singular forms |
//! | [`chunk`] | Paragraph-aware text chunking |
//! | [`traits`] | The [`traits::KnowledgeSource`] seam and registry |
//! | [`store`] | Wiki storage abstraction |
//! | [`wiki`] | Wiki matching policy |
//! | [`offgame`] | Lore / staff corpus scoring |
//! | [`stats`] | Health-per-level calculator |
//! | [`ranking`] | Live roster, intent parsing, TTL cache |
//! | [`aggregate`] | Concurrent fan-out and merge |
//! | [`unanswered`] | Log of queries nothing answered |
//! | [`server`] | JSON HTTP API |
//! | [`db`] | SQLite connection |
//! | [`migrate`] | Wiki schema |

pub mod aggregate;
pub mod chunk;
pub mod config;
pub mod db;
pub mod migrate;
pub mod models;
pub mod normalize;
pub mod offgame;
pub mod ranking;
pub mod server;
pub mod sources;
pub mod sqlite_store;
pub mod stats;
pub mod store;
pub mod traits;
pub mod unanswered;
pub mod wiki;

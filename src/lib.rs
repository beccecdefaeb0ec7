//! # nlq-client
//!
//! Client library and CLI for a natural-language query engine that answers
//! questions from a connected SQL database, from uploaded documents, or
//! from both at once.
//!
//! ## Architecture
//!
//! ```text
//!  user action            ┌────────────────────────────┐
//!  connect/upload/query ─▶│          Session           │
//!                         │ ┌───────┐┌──────┐┌───────┐ │
//!                         │ │connect││upload││ query │ │  independent
//!                         │ │ slot  ││ slot ││ slot  │ │  status slots
//!                         │ └───────┘└──────┘└───────┘ │
//!                         └─────────────┬──────────────┘
//!                                       ▼
//!                             Backend (HttpBackend)
//!                                       │
//!                    ResultModel ◀──────┘
//!                         │
//!                         ▼
//!                  render (ResultView / text)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! nlq connect 'postgresql://app:p@ss@localhost:5432/company_db'
//! nlq upload ./docs/handbook.pdf ./docs/resumes/*.docx
//! nlq query "How many employees are in Engineering?"
//! nlq run --connect "$DB_URL" --upload cv.pdf --query "python developers"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`codec`] | Connection string `@` escaping |
//! | [`status`] | Per-operation status slots |
//! | [`session`] | Request orchestration |
//! | [`backend`] | Backend trait and HTTP implementation |
//! | [`models`] | Wire types and the normalized result model |
//! | [`render`] | View model and text rendering |
//! | [`config`] | TOML configuration |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | Request error taxonomy |

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod render;
pub mod session;
pub mod status;

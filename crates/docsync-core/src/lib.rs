//! docsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Entry`, `Snapshot`, `SyncState`, `DeletionSet`, `PathTranslator`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ITransferAgent`,
//!   `ILocalFileSystem`, `IConflictResolver`
//! - **Configuration** - YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! The synchronizer in `docsync-sync` orchestrates domain values through
//! port interfaces.

pub mod config;
pub mod domain;
pub mod ports;

//! # Previously, on Rowvex...
//!
//! 🎬 The records were trapped. Stranded between an upload form and a database
//! like a traveler stuck in a connecting airport with no WiFi and a dead phone.
//! Someone had to hold them. Someone had to write a backend so simple it lives
//! entirely in RAM, gone the moment you blink.
//!
//! That someone was this module.
//!
//! `in_mem` provides an in-memory [`Source`](crate::backends::Source) for tests
//! and an in-memory [`Store`](crate::backends::Store) that doubles as the
//! default store when nobody configured a file. The store keeps everything
//! behind an `Arc<Mutex<...>>` so tests can inspect what arrived.
//!
//! 🦆
//!
//! ⚠️ Restart the process and the in-memory store forgets everything. That's not
//! a bug. That's RAM.

#[cfg(test)]
mod in_mem_source;
mod in_mem_store;

#[cfg(test)]
pub(crate) use in_mem_source::InMemorySource;
pub(crate) use in_mem_store::InMemoryStore;

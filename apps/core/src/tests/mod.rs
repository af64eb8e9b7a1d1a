//! Test Module
//!
//! Cross-module test suite for the FAQ chatbot backend.
//!
//! ## Test Categories
//! - `engine_tests`: normalization, vocabulary and scoring properties
//! - `resolver_tests`: the semantic-to-lexical fallback chain
//! - `chat_tests`: the full classify flow over an in-memory store
//! - `store_tests`: the DocumentStore contract across all three backends
//! - `embedding_tests`: the hosted embedding client and its cache
//! - `sync_tests`: embedding backfill and corpus import

pub mod sync_tests;

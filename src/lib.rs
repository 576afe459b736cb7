/*
 * Copyright 2019-2021 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! `bucket-store` is a library for storing binary key/value data in object storage buckets.
//!
//! Object stores like Amazon S3 provide a flat namespace of named blobs. This crate maps binary
//! keys onto object names so that arbitrary keys can be stored safely, and partitions a single
//! bucket into any number of independent, nested key spaces called sub-stores.
//!
//! Each key space supports these operations:
//! - `get`, `put` and `delete` individual values
//! - `put` with a create-only precondition, checked atomically by the object store
//! - `has` to check which of a set of keys exist without fetching their values
//! - `list` keys in object name order, stopping early at any point
//! - `len` to count keys by listing 256 partitions of the key space concurrently
//!
//! The following backends are provided out of the box:
//! - `S3Backend` stores objects in an Amazon S3 bucket or an S3-compatible service.
//! - `MemoryBackend` stores objects in memory.
//!
//! # Examples
//! ```
//! use bucket_store::store::{MemoryConfig, OpenStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> bucket_store::Result<()> {
//! // Open a store which keeps its objects in memory.
//! let store = MemoryConfig::new().open().await?;
//!
//! // Values are stored in named key spaces.
//! let users = store.keyspace("users");
//! users.put(b"alice", b"Data", false).await?;
//!
//! assert_eq!(users.get(b"alice").await?, b"Data");
//! assert_eq!(users.len().await?, 1);
//!
//! // Key spaces are independent of each other.
//! assert!(store.keyspace("groups").get(b"alice").await.is_err());
//!
//! store.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//! Some functionality is gated behind cargo features:
//!
//! Type | Cargo Feature
//! --- | ---
//! `S3Backend` | `store-s3`
//!
//! To use one of these types, you must enable the corresponding feature in your `Cargo.toml`.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use error::{Error, Result};

mod error;
pub mod store;

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

//! Key/value stores backed by object storage buckets.
//!
//! A [`BucketStore`] stores binary values under binary keys in a bucket of an object store. Each
//! key is hex-encoded into the name of an object, optionally split into a fixed-length shard
//! segment, and placed below a prefix. The layout of a key space is described by a
//! [`KeyConfig`].
//!
//! A store hands out [`Keyspace`] values which provide the key/value operations. Named
//! sub-stores partition one bucket into any number of independent key spaces which share one
//! connection to the object store.
//!
//! The object store itself is abstracted by the [`ObjectBackend`] trait, which only needs to
//! provide the basic operations that every object store supports. For each backend, there is a
//! corresponding config type which implements [`OpenStore`].
//!
//! [`BucketStore`]: crate::store::BucketStore
//! [`KeyConfig`]: crate::store::KeyConfig
//! [`Keyspace`]: crate::store::Keyspace
//! [`ObjectBackend`]: crate::store::ObjectBackend
//! [`OpenStore`]: crate::store::OpenStore

pub use self::bucket_store::BucketStore;
pub use self::key_codec::{DecodedName, KeyConfig};
pub use self::keyspace::{KeySet, Keyspace, PutOptions};
pub use self::memory_store::{MemoryBackend, MemoryConfig};
pub use self::object_store::{
    list_objects, ListPage, ListQuery, ObjectAttrs, ObjectBackend, PutOutcome, WriteMode,
};
pub use self::open_store::OpenStore;
#[cfg(feature = "store-s3")]
pub use self::s3_store::{S3Backend, S3Config, S3Credentials, S3Region};

mod bucket_store;
mod counter;
mod key_codec;
mod keyspace;
mod memory_store;
mod namespace;
mod object_store;
mod open_store;
mod s3_store;

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

use std::collections::BTreeSet;
use std::fmt;
use std::ops::ControlFlow;

use futures::{pin_mut, TryStreamExt};
use tracing::{debug, trace};

use crate::Error;

use super::key_codec::{DecodedName, KeyConfig};
use super::object_store::{list_objects, ListQuery, ObjectBackend, PutOutcome, WriteMode};

/// A set of keys returned by [`Keyspace::has`].
pub type KeySet = BTreeSet<Vec<u8>>;

/// The options for writing a value with [`Keyspace::put_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PutOptions<'k> {
    /// The key to write.
    pub key: &'k [u8],

    /// The value to store under the key.
    pub data: &'k [u8],

    /// Whether to replace an existing value.
    ///
    /// If this is `false` and a value is already stored under the key, the write fails with
    /// `Error::KeyExists`.
    pub replace: bool,
}

/// A key space within a [`BucketStore`].
///
/// A `Keyspace` is a map of binary keys to binary values, where each key is stored as an object
/// in the bucket. Every key space borrows the backend of the `BucketStore` it came from, so any
/// number of key spaces can share one connection. Sub-stores created with [`sub`] are disjoint
/// from their parent and from each other.
///
/// [`BucketStore`]: crate::store::BucketStore
/// [`sub`]: crate::store::Keyspace::sub
pub struct Keyspace<'a, B: ObjectBackend + ?Sized> {
    backend: &'a B,
    keys: KeyConfig,
}

impl<'a, B: ObjectBackend + ?Sized> Clone for Keyspace<'a, B> {
    fn clone(&self) -> Self {
        Keyspace {
            backend: self.backend,
            keys: self.keys.clone(),
        }
    }
}

impl<'a, B: ObjectBackend + ?Sized> fmt::Debug for Keyspace<'a, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyspace")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl<'a, B: ObjectBackend + ?Sized> Keyspace<'a, B> {
    pub(super) fn new(backend: &'a B, keys: KeyConfig) -> Self {
        Keyspace { backend, keys }
    }

    /// The layout of keys in this key space.
    pub fn config(&self) -> &KeyConfig {
        &self.keys
    }

    /// Return the sub-store of this key space with the given `name`.
    ///
    /// This doesn't make any requests to the backend. The returned key space shares the backend
    /// of this key space, but it isn't tied to the lifetime of this value.
    pub fn sub(&self, name: &str) -> Keyspace<'a, B> {
        Keyspace::new(self.backend, self.keys.sub(name))
    }

    /// Return a copy of this key space which uses the given `shard_len`.
    ///
    /// Keys written with one shard length can't be read with another.
    pub fn with_shard_len(&self, shard_len: usize) -> Keyspace<'a, B> {
        Keyspace::new(self.backend, self.keys.with_shard_len(shard_len))
    }

    /// Return the value stored under `key`.
    ///
    /// # Errors
    /// - `Error::KeyNotFound`: There is no value stored under `key`.
    /// - `Error::Store`: An error occurred with the backend.
    pub async fn get(&self, key: &[u8]) -> crate::Result<Vec<u8>> {
        let name = self.keys.encode(key);
        match self.backend.get_object(&name).await? {
            Some(data) => Ok(data),
            None => Err(Error::KeyNotFound(key.to_vec())),
        }
    }

    /// Store `data` under `key`.
    ///
    /// If `replace` is `true`, this overwrites any value already stored under `key`. Otherwise,
    /// the write only succeeds if there is no value stored under `key`, which is checked
    /// atomically by the backend.
    ///
    /// # Errors
    /// - `Error::KeyExists`: `replace` is `false` and a value is already stored under `key`.
    /// - `Error::EmptyKey`: `key` is empty.
    /// - `Error::Store`: An error occurred with the backend.
    pub async fn put(&self, key: &[u8], data: &[u8], replace: bool) -> crate::Result<()> {
        self.put_with(PutOptions { key, data, replace }).await
    }

    /// Store a value according to the given `options`.
    ///
    /// See [`put`] for details.
    ///
    /// [`put`]: crate::store::Keyspace::put
    pub async fn put_with(&self, options: PutOptions<'_>) -> crate::Result<()> {
        if options.key.is_empty() {
            return Err(Error::EmptyKey);
        }

        let name = self.keys.encode(options.key);
        let mode = if options.replace {
            WriteMode::Overwrite
        } else {
            WriteMode::CreateNew
        };

        match self.backend.put_object(&name, options.data, mode).await? {
            PutOutcome::Written => {
                debug!(name = %name, size = options.data.len(), "wrote object");
                Ok(())
            }
            PutOutcome::AlreadyExists => Err(Error::KeyExists(options.key.to_vec())),
        }
    }

    /// Remove the value stored under `key`.
    ///
    /// # Errors
    /// - `Error::KeyNotFound`: There is no value stored under `key`.
    /// - `Error::Store`: An error occurred with the backend.
    pub async fn delete(&self, key: &[u8]) -> crate::Result<()> {
        let name = self.keys.encode(key);
        if self.backend.delete_object(&name).await? {
            debug!(name = %name, "deleted object");
            Ok(())
        } else {
            Err(Error::KeyNotFound(key.to_vec()))
        }
    }

    /// Return the subset of `keys` which have values stored under them.
    ///
    /// This only fetches the metadata of each object. Keys with no value are left out of the
    /// returned set rather than reported as errors.
    ///
    /// # Errors
    /// - `Error::Store`: An error occurred with the backend.
    pub async fn has<'k, I>(&self, keys: I) -> crate::Result<KeySet>
    where
        I: IntoIterator<Item = &'k [u8]>,
    {
        let mut present = KeySet::new();
        for key in keys {
            let name = self.keys.encode(key);
            if self.backend.object_attrs(&name).await?.is_some() {
                present.insert(key.to_vec());
            }
        }
        Ok(present)
    }

    /// Call `visit` with each key in this key space, starting at `start`.
    ///
    /// Keys are visited in the order of their object names, which is ascending order of their
    /// hex encoding within a shard. Objects which belong to other key spaces, such as sub-stores
    /// of this key space, are skipped. Pass an empty `start` to visit every key.
    ///
    /// If `visit` returns `ControlFlow::Break`, the listing stops without making any further
    /// requests and this returns `Ok`.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: An object in this key space has a name which is not a valid key.
    /// - `Error::Store`: An error occurred with the backend.
    ///
    /// Any error returned by `visit` stops the listing and is returned as-is.
    pub async fn list<F>(&self, start: &[u8], mut visit: F) -> crate::Result<()>
    where
        F: FnMut(&[u8]) -> crate::Result<ControlFlow<()>>,
    {
        let query = ListQuery {
            prefix: self.keys.list_prefix(),
            start_offset: self.keys.start(start),
        };
        let objects = list_objects(self.backend, query);
        pin_mut!(objects);

        while let Some(attrs) = objects.try_next().await? {
            match self.keys.decode(&attrs.name)? {
                DecodedName::Foreign => {
                    trace!(name = %attrs.name, "skipping object outside the key space");
                }
                DecodedName::Key(key) => {
                    if visit(key.as_slice())?.is_break() {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Return all the keys in this key space, starting at `start`.
    ///
    /// See [`list`] for details.
    ///
    /// [`list`]: crate::store::Keyspace::list
    pub async fn keys(&self, start: &[u8]) -> crate::Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        self.list(start, |key| {
            keys.push(key.to_vec());
            Ok(ControlFlow::Continue(()))
        })
        .await?;
        Ok(keys)
    }
}

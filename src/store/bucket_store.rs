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

use tracing::debug;

use super::key_codec::KeyConfig;
use super::keyspace::Keyspace;
use super::object_store::ObjectBackend;

/// A binary key/value store in an object store bucket.
///
/// A `BucketStore` owns the connection to the backend and the layout of its root key space.
/// Keys are never stored in the `BucketStore` directly; instead, it hands out [`Keyspace`]
/// values, which borrow the connection. Because they borrow it, the store can't be closed while
/// any key space is still in use.
///
/// You can use the config types which implement [`OpenStore`] to open a `BucketStore`.
///
/// [`Keyspace`]: crate::store::Keyspace
/// [`OpenStore`]: crate::store::OpenStore
#[derive(Debug)]
pub struct BucketStore<B: ObjectBackend> {
    backend: B,
    keys: KeyConfig,
}

impl<B: ObjectBackend> BucketStore<B> {
    /// Create a new `BucketStore` which stores keys in `backend` with the given layout.
    pub fn new(backend: B, keys: KeyConfig) -> Self {
        BucketStore { backend, keys }
    }

    /// The backend which stores the objects.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The layout of the root key space.
    pub fn config(&self) -> &KeyConfig {
        &self.keys
    }

    /// Return the root key space of this store.
    pub fn root(&self) -> Keyspace<'_, B> {
        Keyspace::new(&self.backend, self.keys.clone())
    }

    /// Return the key space with the given `name`.
    ///
    /// This is the same as calling [`Keyspace::sub`] on the root key space.
    pub fn keyspace(&self, name: &str) -> Keyspace<'_, B> {
        Keyspace::new(&self.backend, self.keys.sub(name))
    }

    /// Close the connection to the backend.
    ///
    /// # Errors
    /// - `Error::Store`: An error occurred with the backend.
    pub async fn close(self) -> crate::Result<()> {
        self.backend.close().await?;
        debug!(prefix = self.keys.prefix(), "closed store");
        Ok(())
    }
}

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

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;

use super::bucket_store::BucketStore;
use super::key_codec::KeyConfig;
use super::object_store::{ListPage, ListQuery, ObjectAttrs, ObjectBackend, PutOutcome, WriteMode};
use super::open_store::OpenStore;

/// The default maximum number of objects returned in one page of a listing.
const DEFAULT_PAGE_SIZE: usize = 1000;

/// The configuration for opening a [`BucketStore`] backed by a [`MemoryBackend`].
///
/// [`BucketStore`]: crate::store::BucketStore
/// [`MemoryBackend`]: crate::store::MemoryBackend
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// The prefix to prepend to each object name.
    pub prefix: String,

    /// The length of the shard segment of object names, or `0` to disable sharding.
    pub shard_len: usize,

    /// The maximum number of objects returned in one page of a listing.
    pub page_size: usize,
}

impl MemoryConfig {
    /// Create a new `MemoryConfig` which stores keys at the top level without sharding.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            prefix: String::new(),
            shard_len: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[async_trait]
impl OpenStore for MemoryConfig {
    type Backend = MemoryBackend;

    async fn open(&self) -> crate::Result<BucketStore<Self::Backend>> {
        Ok(BucketStore::new(
            MemoryBackend::with_page_size(self.page_size),
            KeyConfig::new(&self.prefix, self.shard_len),
        ))
    }
}

/// An `ObjectBackend` which stores objects in memory.
///
/// Unlike other `ObjectBackend` implementations, objects in a `MemoryBackend` are not stored
/// persistently and are only accessible to the current process. This backend is useful for
/// testing. Listings are returned in pages of a configurable size so that paging behaves the way
/// it does with a remote object store.
///
/// None of the methods in this backend will ever return `Err`.
#[derive(Debug)]
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    page_size: usize,
}

impl MemoryBackend {
    /// Create a new empty `MemoryBackend`.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create a new empty `MemoryBackend` which lists at most `page_size` objects per page.
    ///
    /// A `page_size` of `0` is treated as `1`.
    pub fn with_page_size(page_size: usize) -> Self {
        MemoryBackend {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Return the names of all objects in this backend in ascending order.
    pub fn object_names(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn get_object(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.objects.read().get(name).cloned())
    }

    async fn put_object(
        &self,
        name: &str,
        data: &[u8],
        mode: WriteMode,
    ) -> anyhow::Result<PutOutcome> {
        let mut objects = self.objects.write();
        match (objects.entry(name.to_owned()), mode) {
            (Entry::Occupied(_), WriteMode::CreateNew) => Ok(PutOutcome::AlreadyExists),
            (Entry::Occupied(mut entry), WriteMode::Overwrite) => {
                entry.insert(data.to_vec());
                Ok(PutOutcome::Written)
            }
            (Entry::Vacant(entry), _) => {
                entry.insert(data.to_vec());
                Ok(PutOutcome::Written)
            }
        }
    }

    async fn delete_object(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.objects.write().remove(name).is_some())
    }

    async fn object_attrs(&self, name: &str) -> anyhow::Result<Option<ObjectAttrs>> {
        Ok(self.objects.read().get(name).map(|data| ObjectAttrs {
            name: name.to_owned(),
            size: data.len() as u64,
        }))
    }

    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> anyhow::Result<ListPage> {
        // The page token is the name of the last object in the previous page.
        let lower = match (page_token, &query.start_offset) {
            (Some(token), _) => Bound::Excluded(token),
            (None, Some(offset)) if *offset > query.prefix => Bound::Included(offset.clone()),
            (None, _) => Bound::Included(query.prefix.clone()),
        };

        let objects = self.objects.read();
        let mut page = objects
            .range((lower, Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(query.prefix.as_str()))
            .filter(|(name, _)| query.matches(name))
            .take(self.page_size + 1)
            .map(|(name, data)| ObjectAttrs {
                name: name.clone(),
                size: data.len() as u64,
            })
            .collect::<Vec<_>>();

        let next_page_token = if page.len() > self.page_size {
            page.pop();
            page.last().map(|attrs| attrs.name.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            next_page_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use crate::store::object_store::list_objects;
    use crate::store::{ListQuery, MemoryBackend, ObjectBackend, PutOutcome, WriteMode};

    async fn backend_with(names: &[&str], page_size: usize) -> MemoryBackend {
        let backend = MemoryBackend::with_page_size(page_size);
        for name in names {
            backend
                .put_object(name, name.as_bytes(), WriteMode::Overwrite)
                .await
                .unwrap();
        }
        backend
    }

    #[tokio::test]
    async fn create_new_does_not_overwrite() {
        let backend = MemoryBackend::new();
        let first = backend
            .put_object("a", b"first", WriteMode::CreateNew)
            .await
            .unwrap();
        let second = backend
            .put_object("a", b"second", WriteMode::CreateNew)
            .await
            .unwrap();

        assert_eq!(first, PutOutcome::Written);
        assert_eq!(second, PutOutcome::AlreadyExists);
        assert_eq!(
            backend.get_object("a").await.unwrap(),
            Some(b"first".to_vec())
        );
    }

    #[tokio::test]
    async fn listing_spans_pages_in_order() {
        let names = ["p/1", "p/2", "p/3", "p/4", "p/5", "q/1", "o/9"];
        let backend = backend_with(&names, 2).await;
        let query = ListQuery {
            prefix: String::from("p/"),
            start_offset: Some(String::from("p/2")),
        };

        let listed = list_objects(&backend, query)
            .map_ok(|attrs| attrs.name)
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        assert_eq!(listed, vec!["p/2", "p/3", "p/4", "p/5"]);
    }

    #[tokio::test]
    async fn start_offset_before_prefix_is_ignored() {
        let backend = backend_with(&["a/1", "b/1", "b/2"], 1).await;
        let query = ListQuery {
            prefix: String::from("b/"),
            start_offset: Some(String::from("a")),
        };

        let first_page = backend.list_page(&query, None).await.unwrap();

        assert_eq!(first_page.objects.len(), 1);
        assert_eq!(first_page.objects[0].name, "b/1");
        assert_eq!(first_page.next_page_token, Some(String::from("b/1")));
    }
}

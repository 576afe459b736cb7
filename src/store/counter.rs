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

use std::ops::ControlFlow;

use futures::future::try_join_all;
use tracing::{debug, trace};

use super::keyspace::Keyspace;
use super::object_store::ObjectBackend;

impl<'a, B: ObjectBackend + ?Sized> Keyspace<'a, B> {
    /// Return the number of keys in this key space.
    ///
    /// Object stores can't count objects without listing them, so this splits the key space into
    /// 256 partitions by the first byte of each key and lists every partition concurrently. If
    /// listing any partition fails, the remaining listings are cancelled and the first error is
    /// returned.
    ///
    /// Keys in sub-stores of this key space are not counted.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: An object in this key space has a name which is not a valid key.
    /// - `Error::Store`: An error occurred with the backend.
    pub async fn len(&self) -> crate::Result<u64> {
        let scans = (0..=u8::MAX).map(|first| self.count_partition(first));
        let total = try_join_all(scans).await?.into_iter().sum::<u64>();
        debug!(prefix = self.config().prefix(), total, "counted keys");
        Ok(total)
    }

    /// Return whether this key space contains no keys.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: An object in this key space has a name which is not a valid key.
    /// - `Error::Store`: An error occurred with the backend.
    pub async fn is_empty(&self) -> crate::Result<bool> {
        let mut empty = true;
        self.list(&[], |_| {
            empty = false;
            Ok(ControlFlow::Break(()))
        })
        .await?;
        Ok(empty)
    }

    /// Count the keys whose first byte is `first`.
    async fn count_partition(&self, first: u8) -> crate::Result<u64> {
        let mut count = 0u64;
        self.list(&[first], |key| {
            // The listing has run past the end of the partition.
            if key.first() != Some(&first) {
                return Ok(ControlFlow::Break(()));
            }
            count += 1;
            Ok(ControlFlow::Continue(()))
        })
        .await?;
        trace!(partition = first, count, "counted partition");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{BucketStore, KeyConfig, MemoryBackend};

    #[tokio::test]
    async fn empty_key_space_has_no_keys() {
        let store = BucketStore::new(MemoryBackend::new(), KeyConfig::new("data", 2));
        let keys = store.root();

        assert_eq!(keys.len().await.unwrap(), 0);
        assert!(keys.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn count_includes_keys_at_partition_edges() {
        let store = BucketStore::new(MemoryBackend::with_page_size(3), KeyConfig::new("", 1));
        let keys = store.root();
        let partition_edges: [&[u8]; 6] = [
            &[0x00],
            &[0x00, 0xff],
            &[0x0f],
            &[0xf0],
            &[0xff],
            &[0xff; 4],
        ];
        for key in partition_edges {
            keys.put(key, b"", false).await.unwrap();
        }

        assert_eq!(keys.len().await.unwrap(), 6);
        assert!(!keys.is_empty().await.unwrap());
    }
}

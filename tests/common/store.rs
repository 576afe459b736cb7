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

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use rstest::fixture;

use bucket_store::store::{
    BucketStore, KeyConfig, ListPage, ListQuery, MemoryBackend, ObjectAttrs, ObjectBackend,
    PutOutcome, WriteMode,
};
#[cfg(feature = "store-s3")]
use {
    bucket_store::store::{OpenStore, S3Backend, S3Config, S3Credentials, S3Region},
    secrecy::SecretString,
};

/// A page size small enough that most listings in tests span several pages.
pub const SMALL_PAGE_SIZE: usize = 3;

#[fixture]
pub fn memory_store() -> BucketStore<MemoryBackend> {
    sharded_store(0)
}

/// Return a store backed by memory with the given `shard_len`.
pub fn sharded_store(shard_len: usize) -> BucketStore<MemoryBackend> {
    BucketStore::new(
        MemoryBackend::with_page_size(SMALL_PAGE_SIZE),
        KeyConfig::new("test", shard_len),
    )
}

/// Return the config for a fresh prefix of the S3 bucket configured in the environment.
#[cfg(feature = "store-s3")]
pub fn s3_config(shard_len: usize) -> anyhow::Result<S3Config> {
    let region = match dotenv::var("S3_ENDPOINT") {
        Ok(endpoint) => S3Region::custom(&dotenv::var("S3_REGION")?, &endpoint),
        Err(_) => S3Region::from_name(&dotenv::var("S3_REGION")?).unwrap(),
    };
    let config = S3Config {
        bucket: dotenv::var("S3_BUCKET")?,
        region,
        credentials: S3Credentials::Basic {
            access_key: dotenv::var("S3_ACCESS_KEY")?,
            secret_key: SecretString::new(dotenv::var("S3_SECRET_KEY")?),
        },
        prefix: format!("test/{}", uuid::Uuid::new_v4()),
        shard_len,
        path_style: dotenv::var("S3_PATH_STYLE").is_ok(),
        create_bucket: true,
    };
    Ok(config)
}

/// Return a store in a fresh prefix of the S3 bucket configured in the environment.
#[cfg(feature = "store-s3")]
pub async fn s3_store(shard_len: usize) -> anyhow::Result<BucketStore<S3Backend>> {
    Ok(s3_config(shard_len)?.open().await?)
}

/// An `ObjectBackend` which wraps a `MemoryBackend`, counts listing requests and can be made to
/// fail listings which start at a given offset.
#[derive(Debug, Default)]
pub struct FaultyBackend {
    inner: MemoryBackend,
    fail_offset: Option<String>,
    list_calls: AtomicUsize,
}

impl FaultyBackend {
    pub fn new(inner: MemoryBackend) -> Self {
        FaultyBackend {
            inner,
            fail_offset: None,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Fail every listing which starts at `offset`.
    pub fn failing_at(inner: MemoryBackend, offset: &str) -> Self {
        FaultyBackend {
            fail_offset: Some(offset.to_owned()),
            ..FaultyBackend::new(inner)
        }
    }

    /// The number of pages which have been requested so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectBackend for FaultyBackend {
    async fn get_object(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.inner.get_object(name).await
    }

    async fn put_object(
        &self,
        name: &str,
        data: &[u8],
        mode: WriteMode,
    ) -> anyhow::Result<PutOutcome> {
        self.inner.put_object(name, data, mode).await
    }

    async fn delete_object(&self, name: &str) -> anyhow::Result<bool> {
        self.inner.delete_object(name).await
    }

    async fn object_attrs(&self, name: &str) -> anyhow::Result<Option<ObjectAttrs>> {
        self.inner.object_attrs(name).await
    }

    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> anyhow::Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_offset.is_some() && query.start_offset == self.fail_offset {
            bail!("injected listing failure");
        }
        self.inner.list_page(query, page_token).await
    }
}

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

use rstest::rstest;

use bucket_store::store::{BucketStore, MemoryBackend, MemoryConfig, ObjectBackend, OpenStore};
#[cfg(feature = "store-s3")]
use common::{s3_config, s3_store};
use common::{random_buffer, sharded_store};

mod common;

async fn sub_stores_are_disjoint<B: ObjectBackend>(store: &BucketStore<B>) -> anyhow::Result<()> {
    let root = store.root();
    let first = store.keyspace("first");
    let second = store.keyspace("second");
    let first_data = random_buffer();
    let second_data = random_buffer();

    first.put(b"key", &first_data, false).await?;
    second.put(b"key", &second_data, false).await?;

    assert_eq!(first.get(b"key").await?, first_data);
    assert_eq!(second.get(b"key").await?, second_data);
    assert!(root.get(b"key").await.unwrap_err().is_not_found());
    assert_eq!(first.keys(b"").await?, vec![b"key".to_vec()]);
    assert_eq!(second.keys(b"").await?, vec![b"key".to_vec()]);
    assert!(root.keys(b"").await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test]
async fn memory_sub_stores_are_disjoint(#[values(0, 2)] shard_len: usize) -> anyhow::Result<()> {
    sub_stores_are_disjoint(&sharded_store(shard_len)).await
}

#[tokio::test]
#[cfg(feature = "store-s3")]
async fn s3_sub_stores_are_disjoint() -> anyhow::Result<()> {
    sub_stores_are_disjoint(&s3_store(2).await?).await
}

async fn nested_sub_stores<B: ObjectBackend>(store: &BucketStore<B>) -> anyhow::Result<()> {
    let parent = store.keyspace("parent");
    let child = parent.sub("child");
    let other_child = parent.sub("other");

    parent.put(b"a", b"parent", false).await?;
    child.put(b"a", b"child", false).await?;
    other_child.put(b"b", b"other", false).await?;

    assert_eq!(parent.get(b"a").await?, b"parent");
    assert_eq!(child.get(b"a").await?, b"child");
    assert!(other_child.get(b"a").await.unwrap_err().is_not_found());
    assert_eq!(parent.keys(b"").await?, vec![b"a".to_vec()]);
    assert_eq!(store.keyspace("parent").sub("child").get(b"a").await?, b"child");

    child.delete(b"a").await?;
    assert_eq!(parent.get(b"a").await?, b"parent");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn memory_nested_sub_stores(#[values(0, 2)] shard_len: usize) -> anyhow::Result<()> {
    nested_sub_stores(&sharded_store(shard_len)).await
}

#[tokio::test]
#[cfg(feature = "store-s3")]
async fn s3_nested_sub_stores() -> anyhow::Result<()> {
    nested_sub_stores(&s3_store(2).await?).await
}

#[tokio::test]
async fn sub_stores_share_the_backend() -> anyhow::Result<()> {
    let store = sharded_store(0);
    let child = store.keyspace("child");

    child.put(b"a", b"", false).await?;

    assert_eq!(store.backend().object_names(), vec!["test/_6368696c64/61"]);
    assert_eq!(child.config().prefix(), "test/_6368696c64");
    assert_eq!(child.config().shard_len(), 0);
    Ok(())
}

#[tokio::test]
async fn sub_stores_can_change_shard_len() -> anyhow::Result<()> {
    let store = sharded_store(0);
    let child = store.keyspace("child").with_shard_len(2);

    child.put(b"ab", b"", false).await?;

    assert_eq!(store.backend().object_names(), vec!["test/_6368696c64/61/62"]);
    assert_eq!(child.keys(b"").await?, vec![b"ab".to_vec()]);
    assert!(store.keyspace("child").keys(b"").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn open_from_config_and_close() -> anyhow::Result<()> {
    let config = MemoryConfig {
        prefix: "/data/".into(),
        shard_len: 2,
        ..MemoryConfig::default()
    };
    let store: BucketStore<MemoryBackend> = config.open().await?;

    store.keyspace("users").put(b"alice", b"", false).await?;
    assert_eq!(store.config().prefix(), "data");
    assert_eq!(store.keyspace("users").len().await?, 1);

    store.close().await?;
    Ok(())
}

#[tokio::test]
#[cfg(feature = "store-s3")]
async fn s3_missing_bucket_is_not_opened() -> anyhow::Result<()> {
    let config = bucket_store::store::S3Config {
        bucket: format!("missing-{}", uuid::Uuid::new_v4()),
        create_bucket: false,
        ..s3_config(0)?
    };

    let error = config.open().await.unwrap_err();

    assert!(error.to_string().contains(&config.bucket));
    Ok(())
}

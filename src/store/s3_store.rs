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

#![cfg(feature = "store-s3")]

use std::fmt::{self, Debug, Formatter};

use anyhow::anyhow;
use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use s3::BucketConfiguration;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::bucket_store::BucketStore;
use super::key_codec::KeyConfig;
use super::object_store::{ListPage, ListQuery, ObjectAttrs, ObjectBackend, PutOutcome, WriteMode};
use super::open_store::OpenStore;

/// HTTP status codes.
const NOT_FOUND_CODE: u16 = 404;
const CONFLICT_CODE: u16 = 409;
const PRECONDITION_FAILED_CODE: u16 = 412;

/// The maximum number of objects to request in one page of a listing.
const PAGE_SIZE: usize = 1000;

/// Return whether `code` is a successful HTTP status code.
fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

/// Return an error for a request which failed with the given status `code`.
fn status_error(operation: &str, name: &str, code: u16) -> anyhow::Error {
    anyhow!("{} of object {:?} failed with status {}", operation, name, code)
}

/// Return a name for the `start-after` parameter which includes `offset` in the listing.
///
/// S3 only supports listing objects strictly after a name. This returns a name which sorts
/// before `offset` but after every name that both sorts before `offset` and shares all but its
/// last character, so that few objects outside the range are returned.
fn start_after(offset: &str) -> Option<String> {
    let mut chars = offset.chars();
    let last = chars.next_back()?;
    let mut name = chars.as_str().to_owned();
    if let Some(previous) = (last as u32).checked_sub(1).and_then(char::from_u32) {
        name.push(previous);
        name.push(char::MAX);
    }
    Some(name)
}

/// The credentials to use to connect to an S3 bucket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[cfg_attr(docsrs, doc(cfg(feature = "store-s3")))]
pub enum S3Credentials {
    /// Authenticate with an access key and a secret key.
    Basic {
        access_key: String,
        secret_key: SecretString,
    },

    /// Connect without authentication.
    ///
    /// This only works with publicly accessible buckets.
    Anonymous,

    /// Use the credentials from the environment.
    ///
    /// This checks the `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` environment variables, the
    /// AWS credentials file and the instance metadata service, in that order.
    Environment,
}

impl S3Credentials {
    fn to_credentials(&self) -> anyhow::Result<Credentials> {
        let credentials = match self {
            S3Credentials::Basic {
                access_key,
                secret_key,
            } => Credentials::new(
                Some(access_key.as_str()),
                Some(secret_key.expose_secret()),
                None,
                None,
                None,
            )?,
            S3Credentials::Anonymous => Credentials::anonymous()?,
            S3Credentials::Environment => Credentials::default()?,
        };
        Ok(credentials)
    }
}

/// The region of an S3 bucket.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[cfg_attr(docsrs, doc(cfg(feature = "store-s3")))]
pub struct S3Region {
    /// The name of the region.
    pub name: String,

    /// The endpoint of an S3-compatible service, or `None` to use AWS.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl S3Region {
    /// Return the AWS region with the given `name`.
    ///
    /// This returns `None` if the name is empty.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        Some(S3Region {
            name: name.to_owned(),
            endpoint: None,
        })
    }

    /// Return a region for an S3-compatible service at the given `endpoint`.
    pub fn custom(name: &str, endpoint: &str) -> Self {
        S3Region {
            name: name.to_owned(),
            endpoint: Some(endpoint.to_owned()),
        }
    }

    fn to_region(&self) -> anyhow::Result<Region> {
        match &self.endpoint {
            Some(endpoint) => Ok(Region::Custom {
                region: self.name.clone(),
                endpoint: endpoint.clone(),
            }),
            None => self
                .name
                .parse::<Region>()
                .map_err(|error| anyhow!("invalid region {:?}: {}", self.name, error)),
        }
    }
}

/// The configuration for opening a [`BucketStore`] backed by an [`S3Backend`].
///
/// [`BucketStore`]: crate::store::BucketStore
/// [`S3Backend`]: crate::store::S3Backend
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(docsrs, doc(cfg(feature = "store-s3")))]
pub struct S3Config {
    /// The name of the bucket.
    pub bucket: String,

    /// The region of the bucket.
    pub region: S3Region,

    /// The credentials to connect with.
    pub credentials: S3Credentials,

    /// The prefix to prepend to each object name.
    ///
    /// While S3 object names are a flat namespace, you can think of this like the directory to
    /// create the store in. To create the store at the top level of the bucket, leave this empty.
    #[serde(default)]
    pub prefix: String,

    /// The length of the shard segment of object names, or `0` to disable sharding.
    #[serde(default)]
    pub shard_len: usize,

    /// Whether to address the bucket in the path of the URL rather than the host name.
    ///
    /// Many S3-compatible services require this.
    #[serde(default)]
    pub path_style: bool,

    /// Whether to create the bucket if it doesn't already exist.
    ///
    /// Opening the store always checks that the bucket exists. If it doesn't and this is `false`,
    /// opening the store fails.
    #[serde(default)]
    pub create_bucket: bool,
}

/// The error code S3 returns when creating a bucket which these credentials already own.
const ALREADY_OWNED_ERROR: &str = "BucketAlreadyOwnedByYou";

/// What to do after checking whether a bucket exists.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum BucketState {
    Exists,
    Missing,
}

/// Interpret the status `code` of a HEAD request for the bucket `name`.
///
/// A missing bucket is only acceptable if it is going to be created.
fn bucket_state(name: &str, code: u16, create: bool) -> anyhow::Result<BucketState> {
    match code {
        code if is_success(code) => Ok(BucketState::Exists),
        NOT_FOUND_CODE if create => Ok(BucketState::Missing),
        NOT_FOUND_CODE => Err(anyhow!("bucket {:?}: the bucket does not exist", name)),
        code => Err(anyhow!(
            "bucket {:?}: checking the bucket failed with status {}",
            name,
            code
        )),
    }
}

/// Interpret the response to a request creating the bucket `name`.
///
/// A conflict only counts as success if the bucket is owned by these credentials, which happens
/// when another client created it since it was checked.
fn check_created(name: &str, code: u16, response_text: &str) -> anyhow::Result<()> {
    match code {
        code if is_success(code) => Ok(()),
        CONFLICT_CODE if response_text.contains(ALREADY_OWNED_ERROR) => Ok(()),
        code => Err(anyhow!(
            "bucket {:?}: creating the bucket failed with status {}: {}",
            name,
            code,
            response_text
        )),
    }
}

/// Create the bucket described by `config`.
async fn create_bucket(
    config: &S3Config,
    region: Region,
    credentials: Credentials,
) -> anyhow::Result<()> {
    let bucket_config = BucketConfiguration::default();
    let response = if config.path_style {
        Bucket::create_with_path_style(&config.bucket, region, credentials, bucket_config).await?
    } else {
        Bucket::create(&config.bucket, region, credentials, bucket_config).await?
    };

    check_created(&config.bucket, response.response_code, &response.response_text)?;
    debug!(bucket = %config.bucket, "created bucket");
    Ok(())
}

#[async_trait]
impl OpenStore for S3Config {
    type Backend = S3Backend;

    async fn open(&self) -> crate::Result<BucketStore<Self::Backend>> {
        if self.bucket.is_empty() {
            return Err(anyhow!("missing bucket name").into());
        }

        let region = self.region.to_region()?;
        let credentials = self.credentials.to_credentials()?;

        let mut bucket = Bucket::new(&self.bucket, region.clone(), credentials.clone())
            .map_err(anyhow::Error::from)?;
        if self.path_style {
            bucket = bucket.with_path_style();
        }

        // A HEAD request for the root of the bucket checks that the bucket exists.
        let (_, code) = bucket.head_object("/").await.map_err(anyhow::Error::from)?;
        if bucket_state(&self.bucket, code, self.create_bucket)? == BucketState::Missing {
            create_bucket(self, region, credentials).await?;
        }

        Ok(BucketStore::new(
            S3Backend { bucket },
            KeyConfig::new(&self.prefix, self.shard_len),
        ))
    }
}

/// An `ObjectBackend` which stores objects in an Amazon S3 bucket or an S3-compatible service.
///
/// You can use [`S3Config`] to open a store backed by this type.
///
/// The `store-s3` cargo feature is required to use this.
///
/// [`S3Config`]: crate::store::S3Config
#[cfg_attr(docsrs, doc(cfg(feature = "store-s3")))]
pub struct S3Backend {
    bucket: Bucket,
}

impl Debug for S3Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn get_object(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let response = self.bucket.get_object(name).await?;
        match response.status_code() {
            NOT_FOUND_CODE => Ok(None),
            code if is_success(code) => Ok(Some(response.bytes().to_vec())),
            code => Err(status_error("get", name, code)),
        }
    }

    async fn put_object(
        &self,
        name: &str,
        data: &[u8],
        mode: WriteMode,
    ) -> anyhow::Result<PutOutcome> {
        let response = match mode {
            WriteMode::Overwrite => self.bucket.put_object(name, data).await?,
            WriteMode::CreateNew => {
                let mut bucket = self.bucket.clone();
                bucket.add_header("If-None-Match", "*");
                bucket.put_object(name, data).await?
            }
        };

        match response.status_code() {
            PRECONDITION_FAILED_CODE => Ok(PutOutcome::AlreadyExists),
            code if is_success(code) => Ok(PutOutcome::Written),
            code => Err(status_error("put", name, code)),
        }
    }

    // S3 reports success when deleting a missing object, so check that it exists first.
    async fn delete_object(&self, name: &str) -> anyhow::Result<bool> {
        if self.object_attrs(name).await?.is_none() {
            return Ok(false);
        }

        let response = self.bucket.delete_object(name).await?;
        match response.status_code() {
            NOT_FOUND_CODE => Ok(false),
            code if is_success(code) => Ok(true),
            code => Err(status_error("delete", name, code)),
        }
    }

    async fn object_attrs(&self, name: &str) -> anyhow::Result<Option<ObjectAttrs>> {
        let (head, code) = self.bucket.head_object(name).await?;
        match code {
            NOT_FOUND_CODE => Ok(None),
            code if is_success(code) => Ok(Some(ObjectAttrs {
                name: name.to_owned(),
                size: head.content_length.map_or(0, |length| length.max(0) as u64),
            })),
            code => Err(status_error("head", name, code)),
        }
    }

    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> anyhow::Result<ListPage> {
        // The start offset only applies to the first page.
        let start_after = match page_token {
            Some(_) => None,
            None => query.start_offset.as_deref().and_then(start_after),
        };

        let (result, code) = self
            .bucket
            .list_page(
                query.prefix.clone(),
                None,
                page_token,
                start_after,
                Some(PAGE_SIZE),
            )
            .await?;
        if !is_success(code) {
            return Err(anyhow!(
                "listing objects with prefix {:?} failed with status {}",
                query.prefix,
                code
            ));
        }

        let objects = result
            .contents
            .into_iter()
            .filter(|object| query.matches(&object.key))
            .map(|object| ObjectAttrs {
                name: object.key,
                size: object.size,
            })
            .collect();
        let next_page_token = if result.is_truncated {
            result.next_continuation_token
        } else {
            None
        };

        Ok(ListPage {
            objects,
            next_page_token,
        })
    }
}

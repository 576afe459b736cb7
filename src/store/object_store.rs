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

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use static_assertions::assert_obj_safe;

/// Metadata about an object in an [`ObjectBackend`].
///
/// [`ObjectBackend`]: crate::store::ObjectBackend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectAttrs {
    /// The full name of the object.
    pub name: String,

    /// The size of the object in bytes.
    pub size: u64,
}

/// How an object is written to an [`ObjectBackend`].
///
/// [`ObjectBackend`]: crate::store::ObjectBackend
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WriteMode {
    /// Replace any existing object with the same name.
    Overwrite,

    /// Only write the object if no object with the same name exists.
    ///
    /// The check and the write must be a single atomic operation in the backend.
    CreateNew,
}

/// The outcome of writing an object to an [`ObjectBackend`].
///
/// [`ObjectBackend`]: crate::store::ObjectBackend
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum PutOutcome {
    /// The object was written.
    Written,

    /// The object was not written because it already exists and the write mode was
    /// [`WriteMode::CreateNew`].
    AlreadyExists,
}

/// A query for listing objects in an [`ObjectBackend`].
///
/// [`ObjectBackend`]: crate::store::ObjectBackend
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListQuery {
    /// Only objects whose names start with this prefix are listed.
    pub prefix: String,

    /// If set, only objects whose names sort at or after this name are listed.
    pub start_offset: Option<String>,
}

impl ListQuery {
    /// Return whether an object with the given `name` matches this query.
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(self.prefix.as_str())
            && self
                .start_offset
                .as_deref()
                .map_or(true, |offset| name >= offset)
    }
}

/// One page of a listing returned by an [`ObjectBackend`].
///
/// [`ObjectBackend`]: crate::store::ObjectBackend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// The objects in this page, in ascending byte order of their names.
    pub objects: Vec<ObjectAttrs>,

    /// An opaque token for fetching the next page, or `None` if this is the last page.
    pub next_page_token: Option<String>,
}

/// A remote object store which stores blobs in a flat namespace of named objects.
///
/// This is the small set of operations that a bucket in an object store must provide to back a
/// [`BucketStore`]. Implementations report missing objects and failed preconditions as part of
/// their `Ok` values and reserve `Err` for failures of the object store itself.
///
/// [`BucketStore`]: crate::store::BucketStore
#[async_trait]
pub trait ObjectBackend: fmt::Debug + Send + Sync {
    /// Return the contents of the object with the given `name`.
    ///
    /// If there is no object with the given `name`, this returns `Ok(None)`.
    async fn get_object(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>>;

    /// Write `data` to the object with the given `name`.
    ///
    /// The object must be replaced atomically: if this method returns `Err`, no partially-written
    /// object may be visible to readers.
    async fn put_object(
        &self,
        name: &str,
        data: &[u8],
        mode: WriteMode,
    ) -> anyhow::Result<PutOutcome>;

    /// Remove the object with the given `name`.
    ///
    /// This returns `Ok(false)` if there is no object with the given `name`.
    async fn delete_object(&self, name: &str) -> anyhow::Result<bool>;

    /// Return the metadata of the object with the given `name` without fetching its contents.
    ///
    /// If there is no object with the given `name`, this returns `Ok(None)`.
    async fn object_attrs(&self, name: &str) -> anyhow::Result<Option<ObjectAttrs>>;

    /// Return one page of the objects which match `query`.
    ///
    /// Pass `None` as the `page_token` to fetch the first page and the `next_page_token` of the
    /// previous page to fetch each following page. Across all pages, objects must be returned in
    /// ascending byte order of their names.
    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> anyhow::Result<ListPage>;

    /// Release the connection to the object store.
    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

assert_obj_safe!(ObjectBackend);

#[async_trait]
impl ObjectBackend for Box<dyn ObjectBackend> {
    async fn get_object(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.as_ref().get_object(name).await
    }

    async fn put_object(
        &self,
        name: &str,
        data: &[u8],
        mode: WriteMode,
    ) -> anyhow::Result<PutOutcome> {
        self.as_ref().put_object(name, data, mode).await
    }

    async fn delete_object(&self, name: &str) -> anyhow::Result<bool> {
        self.as_ref().delete_object(name).await
    }

    async fn object_attrs(&self, name: &str) -> anyhow::Result<Option<ObjectAttrs>> {
        self.as_ref().object_attrs(name).await
    }

    async fn list_page(
        &self,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> anyhow::Result<ListPage> {
        self.as_ref().list_page(query, page_token).await
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.as_ref().close().await
    }
}

/// The position of a listing within the pages returned by the backend.
enum Cursor {
    First,
    Next(String),
    Done,
}

/// The state of a lazy listing between objects.
struct Listing {
    query: ListQuery,
    buffered: VecDeque<ObjectAttrs>,
    cursor: Cursor,
}

/// Return a stream of the objects in `backend` which match `query`.
///
/// Pages are fetched lazily as the stream is polled, so a consumer which stops early doesn't
/// make any further requests. The stream can be restarted by calling this function again with
/// the same `query`.
pub fn list_objects<'a, B>(
    backend: &'a B,
    query: ListQuery,
) -> impl Stream<Item = anyhow::Result<ObjectAttrs>> + Send + 'a
where
    B: ObjectBackend + ?Sized,
{
    let listing = Listing {
        query,
        buffered: VecDeque::new(),
        cursor: Cursor::First,
    };
    stream::try_unfold(listing, move |listing| next_object(backend, listing))
}

/// Return the next object in the `listing`, fetching a new page if necessary.
async fn next_object<B>(
    backend: &B,
    mut listing: Listing,
) -> anyhow::Result<Option<(ObjectAttrs, Listing)>>
where
    B: ObjectBackend + ?Sized,
{
    loop {
        if let Some(attrs) = listing.buffered.pop_front() {
            return Ok(Some((attrs, listing)));
        }

        let page_token = match listing.cursor {
            Cursor::Done => return Ok(None),
            Cursor::First => None,
            Cursor::Next(token) => Some(token),
        };
        let page = backend.list_page(&listing.query, page_token).await?;
        listing.buffered.extend(page.objects);
        listing.cursor = match page.next_page_token {
            Some(token) => Cursor::Next(token),
            None => Cursor::Done,
        };
    }
}

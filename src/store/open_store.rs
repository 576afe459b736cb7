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

use async_trait::async_trait;

use super::bucket_store::BucketStore;
use super::object_store::ObjectBackend;

/// A value which can be used to open a [`BucketStore`].
///
/// [`BucketStore`]: crate::store::BucketStore
#[async_trait]
pub trait OpenStore {
    /// The type of `ObjectBackend` which this value connects to.
    type Backend: ObjectBackend + 'static;

    /// Connect to the backend and return a store over it.
    ///
    /// # Errors
    /// - `Error::Store`: An error occurred connecting to the backend.
    async fn open(&self) -> crate::Result<BucketStore<Self::Backend>>;
}

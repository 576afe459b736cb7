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

use std::result;

use thiserror::Error as DeriveError;

/// The error type for operations with a [`Keyspace`].
///
/// [`Keyspace`]: crate::store::Keyspace
#[derive(Debug, DeriveError)]
pub enum Error {
    /// There is no value stored under the given key.
    #[error("The key \"{}\" was not found.", .0.escape_ascii())]
    KeyNotFound(Vec<u8>),

    /// A value is already stored under the given key.
    #[error("The key \"{}\" already exists.", .0.escape_ascii())]
    KeyExists(Vec<u8>),

    /// The empty key cannot be stored.
    #[error("The empty key cannot be stored.")]
    EmptyKey,

    /// An object name matched the key space of a store but could not be decoded into a key.
    ///
    /// This usually means that an unrelated object was written into the key space or that the
    /// object was corrupted in the backing object store.
    #[error("The object name {0:?} is not a valid key.")]
    InvalidKey(String),

    /// An error occurred with the backing object store.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    /// Return whether this error means that a key was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_))
    }

    /// Return whether this error means that a key already exists.
    pub fn is_exists(&self) -> bool {
        matches!(self, Error::KeyExists(_))
    }
}

/// The result type for operations with a [`Keyspace`].
///
/// [`Keyspace`]: crate::store::Keyspace
pub type Result<T> = result::Result<T, Error>;

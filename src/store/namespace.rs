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

//! Derivation of nested key spaces for sub-stores.

use super::key_codec::{KeyConfig, SEPARATOR};

/// The character which marks a prefix segment as the name of a sub-store.
///
/// Hex encoding never produces this character, so a sub-store segment can't be mistaken for a
/// shard segment or an encoded key.
const SUB_STORE_TAG: char = '_';

impl KeyConfig {
    /// Return the key space of the sub-store with the given `name`.
    ///
    /// The prefix of the sub-store is this prefix joined with `_` followed by the hex-encoded
    /// `name`, so distinct names never collide, and the keys of a sub-store are never decoded as
    /// keys of its parent or its siblings. The shard length is inherited.
    ///
    /// This is a pure function of this config and the `name`.
    pub fn sub(&self, name: &str) -> Self {
        let segment = format!("{}{}", SUB_STORE_TAG, hex::encode(name));
        if self.prefix().is_empty() {
            self.with_prefix(&segment)
        } else {
            self.with_prefix(&format!("{}{}{}", self.prefix(), SEPARATOR, segment))
        }
    }

    /// Return a copy of this config with the given `shard_len`.
    pub fn with_shard_len(&self, shard_len: usize) -> Self {
        KeyConfig::new(self.prefix(), shard_len)
    }
}

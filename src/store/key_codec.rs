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

use std::borrow::Cow;

/// The separator between the segments of an object name.
pub(crate) const SEPARATOR: char = '/';

/// The result of decoding an object name with a [`KeyConfig`].
///
/// [`KeyConfig`]: crate::store::KeyConfig
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodedName {
    /// The object name belongs to the key space and encodes this key.
    Key(Vec<u8>),

    /// The object name belongs to a different key space and should be skipped.
    ///
    /// Object stores are often shared with unrelated data, and sub-stores are nested beneath
    /// their parent's prefix, so this is not an error.
    Foreign,
}

/// The layout of keys within an object store bucket.
///
/// A `KeyConfig` maps binary keys onto object names. Each key is hex-encoded, so object names
/// never contain separators or control characters regardless of the content of the key. The
/// encoded key is placed below an optional prefix, which acts like a directory for the key space.
///
/// If the shard length is nonzero, the hex-encoded key is split after that many digits and the
/// two halves are joined with a `/`. With a shard length of `2`, the key `ab` (hex `6162`) is
/// stored as `61/62`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyConfig {
    prefix: String,
    shard_len: usize,
}

impl KeyConfig {
    /// Create a new `KeyConfig` with the given `prefix` and `shard_len`.
    ///
    /// Leading and trailing separators are removed from the `prefix`. An empty prefix places
    /// keys at the top level of the bucket.
    pub fn new(prefix: &str, shard_len: usize) -> Self {
        KeyConfig {
            prefix: prefix.trim_matches(SEPARATOR).to_owned(),
            shard_len,
        }
    }

    /// The prefix of this key space.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The length of the shard segment of object names.
    pub fn shard_len(&self) -> usize {
        self.shard_len
    }

    /// Return a copy of this config with the given `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        KeyConfig::new(prefix, self.shard_len)
    }

    /// The prefix shared by every object name in this key space.
    ///
    /// This is empty if the key space is at the top level of the bucket.
    pub fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.prefix, SEPARATOR)
        }
    }

    /// Return the object name for the given `key`.
    pub fn encode(&self, key: &[u8]) -> String {
        let hex_key = hex::encode(key);
        let mut name = self.list_prefix();
        name.reserve(hex_key.len() + 1);

        if self.shard_len > 0 {
            // A key too short to fill the shard becomes the whole shard.
            let (shard, rest) = hex_key.split_at(self.shard_len.min(hex_key.len()));
            name.push_str(shard);
            name.push(SEPARATOR);
            name.push_str(rest);
        } else {
            name.push_str(&hex_key);
        }

        name
    }

    /// Return the key stored in the object with the given `name`.
    ///
    /// This returns [`DecodedName::Foreign`] if the object doesn't belong to this key space.
    ///
    /// # Errors
    /// - `Error::InvalidKey`: The name belongs to this key space but is not a valid encoded key.
    pub fn decode(&self, name: &str) -> crate::Result<DecodedName> {
        let remainder = if self.prefix.is_empty() {
            name
        } else {
            match name
                .strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_prefix(SEPARATOR))
            {
                Some(remainder) => remainder,
                None => return Ok(DecodedName::Foreign),
            }
        };

        let hex_key = if self.shard_len > 0 {
            let (shard, rest) = match remainder.split_once(SEPARATOR) {
                Some(segments) => segments,
                None => return Ok(DecodedName::Foreign),
            };
            let shard_fits = shard.len() == self.shard_len
                || (shard.len() < self.shard_len && rest.is_empty());
            if !shard_fits || !is_hex(shard) || !is_hex(rest) {
                return Ok(DecodedName::Foreign);
            }
            Cow::Owned([shard, rest].concat())
        } else {
            if !is_hex(remainder) {
                return Ok(DecodedName::Foreign);
            }
            Cow::Borrowed(remainder)
        };

        // Only an odd number of digits can fail here.

        hex::decode(hex_key.as_ref())
            .map(DecodedName::Key)
            .map_err(|_| crate::Error::InvalidKey(name.to_owned()))
    }

    /// Return the object name at which a scan starting at `start` begins.
    ///
    /// Every key which has `start` as a prefix is encoded to a name which sorts at or after the
    /// returned offset and before the name of any key which sorts after those keys. This returns
    /// `None` if `start` is empty, in which case a scan begins at the start of the key space.
    pub fn start(&self, start: &[u8]) -> Option<String> {
        if start.is_empty() {
            None
        } else {
            Some(self.encode(start))
        }
    }
}

/// Return whether `segment` consists only of lowercase hex digits.
///
/// Every hex segment of a name is checked with this before decoding, so each key has exactly one
/// object name. Names with separators or uppercase digits are rejected.
fn is_hex(segment: &str) -> bool {
    segment
        .bytes()
        .all(|byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f'))
}

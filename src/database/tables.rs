#![allow(dead_code)]
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use super::DbError;

/// Composes a `pre.dig` key.
pub(crate) fn dg_key(pre: &str, dig: &str) -> Vec<u8> {
    [pre.as_bytes(), b".", dig.as_bytes()].concat()
}

/// Composes a `pre.%032x(sn)` key; the fixed-width hex ordinal keeps
/// lexicographic iteration in numeric order.
pub(crate) fn sn_key(pre: &str, sn: u64) -> Vec<u8> {
    format!("{}.{:032x}", pre, sn).into_bytes()
}

fn ordinal_suffix(ordinal: u128) -> Vec<u8> {
    format!(".{:032x}", ordinal).into_bytes()
}

fn parse_ordinal_suffix(full_key: &[u8]) -> Option<u128> {
    let len = full_key.len();
    if len < 33 || full_key[len - 33] != b'.' {
        return None;
    }
    std::str::from_utf8(&full_key[len - 32..])
        .ok()
        .and_then(|hex| u128::from_str_radix(hex, 16).ok())
}

/// Plain keyed table, no duplicates.
pub(crate) struct SledValTree<T> {
    tree: sled::Tree,
    marker: PhantomData<T>,
}

impl<T> SledValTree<T> {
    pub fn new(tree: sled::Tree) -> Self {
        Self {
            tree,
            marker: PhantomData,
        }
    }
}

impl<T> SledValTree<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn get(&self, key: &[u8]) -> Result<Option<T>, DbError> {
        match self.tree.get(key)? {
            Some(value) => Ok(Some(serde_cbor::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Write-once insert; returns false and leaves the present value
    /// untouched when the key is already bound.
    pub fn put(&self, key: &[u8], value: &T) -> Result<bool, DbError> {
        if self.tree.contains_key(key)? {
            return Ok(false);
        }
        self.tree.insert(key, serde_cbor::to_vec(value)?)?;
        Ok(true)
    }

    /// Unconditional overwrite.
    pub fn set(&self, key: &[u8], value: &T) -> Result<(), DbError> {
        self.tree.insert(key, serde_cbor::to_vec(value)?)?;
        Ok(())
    }

    pub fn del(&self, key: &[u8]) -> Result<(), DbError> {
        self.tree.remove(key)?;
        Ok(())
    }

    pub fn contains_key(&self, key: &[u8]) -> Result<bool, DbError> {
        Ok(self.tree.contains_key(key)?)
    }
}

/// Insertion-ordered collection under an apparent key.
///
/// The real key carries a hidden 32-hex ordinal suffix, so values sort
/// by insertion while the caller addresses them by the apparent key.
pub(crate) struct SledIoSetTree<T> {
    tree: sled::Tree,
    marker: PhantomData<T>,
}

impl<T> SledIoSetTree<T> {
    pub fn new(tree: sled::Tree) -> Self {
        Self {
            tree,
            marker: PhantomData,
        }
    }
}

impl<T> SledIoSetTree<T>
where
    T: Serialize + DeserializeOwned,
{
    fn last_ordinal(&self, key: &[u8]) -> Result<Option<u128>, DbError> {
        let prefix = [key, b"."].concat();
        Ok(self
            .tree
            .scan_prefix(&prefix)
            .keys()
            .last()
            .transpose()?
            .and_then(|k| parse_ordinal_suffix(&k)))
    }

    /// Appends the value after the last one under the apparent key,
    /// regardless of duplicates.
    pub fn append(&self, key: &[u8], value: &T) -> Result<(), DbError> {
        let next = match self.last_ordinal(key)? {
            Some(last) => last.checked_add(1).ok_or(DbError::OrdinalExhausted)?,
            None => 0,
        };
        let full_key = [key.to_vec(), ordinal_suffix(next)].concat();
        self.tree.insert(full_key, serde_cbor::to_vec(value)?)?;
        Ok(())
    }

    /// Appends only when the value is not yet present under the
    /// apparent key; returns whether anything was written.
    pub fn add(&self, key: &[u8], value: &T) -> Result<bool, DbError>
    where
        T: PartialEq,
    {
        if self.iter_values(key).any(|v| &v == value) {
            return Ok(false);
        }
        self.append(key, value)?;
        Ok(true)
    }

    /// Values under the apparent key, in insertion order.
    pub fn iter_values(&self, key: &[u8]) -> impl DoubleEndedIterator<Item = T> {
        let prefix = [key, b"."].concat();
        self.tree
            .scan_prefix(prefix)
            .values()
            .flatten()
            .flat_map(|v| serde_cbor::from_slice(&v))
    }

    /// Full entries (real key + value) under any key starting with the
    /// given prefix, in key order.
    pub fn iter_prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, T)> {
        self.tree
            .scan_prefix(prefix)
            .flatten()
            .filter_map(|(k, v)| {
                serde_cbor::from_slice(&v)
                    .ok()
                    .map(|value| (k.to_vec(), value))
            })
            .collect()
    }

    pub fn remove_value(&self, key: &[u8], value: &T) -> Result<(), DbError>
    where
        T: PartialEq,
    {
        let prefix = [key, b"."].concat();
        for (full_key, stored) in self.iter_prefix_entries(&prefix) {
            if &stored == value {
                self.tree.remove(full_key)?;
            }
        }
        Ok(())
    }

    pub fn remove_entry(&self, full_key: &[u8]) -> Result<(), DbError> {
        self.tree.remove(full_key)?;
        Ok(())
    }

    pub fn del_all(&self, key: &[u8]) -> Result<(), DbError> {
        let prefix = [key, b"."].concat();
        for (full_key, _) in self.tree.scan_prefix(&prefix).flatten() {
            self.tree.remove(full_key)?;
        }
        Ok(())
    }

    pub fn get_all(&self) -> impl DoubleEndedIterator<Item = T> {
        self.tree
            .iter()
            .values()
            .flatten()
            .flat_map(|v| serde_cbor::from_slice(&v))
    }
}

/// Ordinal-keyed table: full key is `top.%032x(on)`, with `append_on`
/// assigning contiguous ordinals from zero.
pub(crate) struct SledOnTree<T> {
    tree: sled::Tree,
    marker: PhantomData<T>,
}

impl<T> SledOnTree<T> {
    pub fn new(tree: sled::Tree) -> Self {
        Self {
            tree,
            marker: PhantomData,
        }
    }
}

impl<T> SledOnTree<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn last_on(&self, top: &[u8]) -> Result<Option<u128>, DbError> {
        let prefix = [top, b"."].concat();
        Ok(self
            .tree
            .scan_prefix(&prefix)
            .keys()
            .last()
            .transpose()?
            .and_then(|k| parse_ordinal_suffix(&k)))
    }

    pub fn append_on(&self, top: &[u8], value: &T) -> Result<u128, DbError> {
        let on = match self.last_on(top)? {
            Some(last) => last.checked_add(1).ok_or(DbError::OrdinalExhausted)?,
            None => 0,
        };
        let full_key = [top.to_vec(), ordinal_suffix(on)].concat();
        self.tree.insert(full_key, serde_cbor::to_vec(value)?)?;
        Ok(on)
    }

    pub fn get_on(&self, top: &[u8], on: u128) -> Result<Option<T>, DbError> {
        let full_key = [top.to_vec(), ordinal_suffix(on)].concat();
        match self.tree.get(full_key)? {
            Some(value) => Ok(Some(serde_cbor::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Iterates (ordinal, value) pairs under a top key in ordinal order.
    pub fn iter(&self, top: &[u8]) -> Vec<(u128, T)> {
        let prefix = [top, b"."].concat();
        self.tree
            .scan_prefix(&prefix)
            .flatten()
            .filter_map(|(k, v)| {
                match (parse_ordinal_suffix(&k), serde_cbor::from_slice(&v)) {
                    (Some(on), Ok(value)) => Some((on, value)),
                    _ => None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tree(name: &str) -> sled::Tree {
        let dir = tempfile::Builder::new()
            .prefix("test-db")
            .tempdir()
            .unwrap()
            .into_path();
        sled::open(dir).unwrap().open_tree(name).unwrap()
    }

    #[test]
    fn test_val_tree_put_is_write_once() -> Result<(), DbError> {
        let tree: SledValTree<String> = SledValTree::new(test_tree("val"));
        let key = dg_key("pre", "dig");

        assert!(tree.put(&key, &"first".to_string())?);
        assert!(!tree.put(&key, &"second".to_string())?);
        assert_eq!(tree.get(&key)?, Some("first".to_string()));

        tree.set(&key, &"third".to_string())?;
        assert_eq!(tree.get(&key)?, Some("third".to_string()));
        Ok(())
    }

    #[test]
    fn test_ioset_insertion_order_and_idempotence() -> Result<(), DbError> {
        let tree: SledIoSetTree<String> = SledIoSetTree::new(test_tree("ioset"));
        let key = sn_key("pre", 2);

        tree.append(&key, &"a".to_string())?;
        tree.append(&key, &"b".to_string())?;
        assert!(tree.add(&key, &"c".to_string())?);
        assert!(!tree.add(&key, &"a".to_string())?);

        let values: Vec<_> = tree.iter_values(&key).collect();
        assert_eq!(values, vec!["a", "b", "c"]);

        tree.remove_value(&key, &"b".to_string())?;
        let values: Vec<_> = tree.iter_values(&key).collect();
        assert_eq!(values, vec!["a", "c"]);
        Ok(())
    }

    #[test]
    fn test_on_tree_ordinals_are_contiguous() -> Result<(), DbError> {
        let tree: SledOnTree<String> = SledOnTree::new(test_tree("on"));

        assert_eq!(tree.append_on(b"pre", &"x".to_string())?, 0);
        assert_eq!(tree.append_on(b"pre", &"y".to_string())?, 1);
        assert_eq!(tree.append_on(b"other", &"z".to_string())?, 0);

        let entries = tree.iter(b"pre");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (0, "x".to_string()));
        assert_eq!(entries[1], (1, "y".to_string()));
        Ok(())
    }

    #[test]
    fn test_sn_keys_sort_numerically() {
        assert!(sn_key("pre", 2) < sn_key("pre", 10));
        assert!(sn_key("pre", 255) < sn_key("pre", 256));
    }
}

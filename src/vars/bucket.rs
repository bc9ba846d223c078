//! The bucketed shared-array store itself (spec §4.C).
//!
//! Eight buckets, each independently locked, each owning a
//! `array name -> Array` map where `Array` is in turn a `key -> value`
//! map. An array name always hashes to the same bucket for the lifetime
//! of the process — there is no rehashing — so once an array exists its
//! bucket assignment never changes.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::ThreadError;

use super::value::ValueContainer;

/// Number of buckets the store is split across, fixed at the value used by
/// the source implementation.
pub const NUM_BUCKETS: usize = 8;

/// One shared array: an ordered map of key to value container.
///
/// A `Vec<(String, ValueContainer)>`-backed map would preserve insertion
/// order the way Tcl's hash-table-with-iteration-order effectively behaves
/// for small arrays; a `HashMap` is used here since none of spec §4.C's
/// operations depend on iteration order except `array names`/`array get`,
/// which sort or are order-insensitive in practice.
pub type Array = HashMap<String, ValueContainer>;

/// Hash an array name to a bucket index.
///
/// An additive rolling hash in the same shape as the source
/// implementation's bucket-selection hash (`result = result*9 + byte`,
/// reduced mod [`NUM_BUCKETS`]) — stable for the lifetime of the process,
/// which is all spec §4.C requires ("no rehashing").
#[must_use]
pub fn hash_array_name(name: &str) -> usize {
    let mut result: u32 = 0;
    for byte in name.bytes() {
        result = (result << 3).wrapping_add(result).wrapping_add(u32::from(byte));
    }
    (result as usize) % NUM_BUCKETS
}

#[derive(Default)]
struct Bucket {
    arrays: HashMap<String, Array>,
}

/// The process-wide shared variable store.
pub struct SharedVarStore {
    buckets: Vec<Mutex<Bucket>>,
}

impl Default for SharedVarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedVarStore {
    /// Create an empty store with [`NUM_BUCKETS`] buckets.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: (0..NUM_BUCKETS).map(|_| Mutex::new(Bucket::default())).collect(),
        }
    }

    fn bucket_for(&self, array: &str) -> &Mutex<Bucket> {
        &self.buckets[hash_array_name(array)]
    }

    /// Run `f` with exclusive access to `array`'s entry, creating it first
    /// if absent.
    pub(super) fn with_array_mut<T>(
        &self,
        array: &str,
        f: impl FnOnce(&mut Array) -> T,
    ) -> T {
        let mut bucket = self.bucket_for(array).lock();
        let entry = bucket.arrays.entry(array.to_string()).or_default();
        f(entry)
    }

    /// Run `f` with exclusive access to `array`'s entry, failing with
    /// [`ThreadError::NotFound`] if the array does not exist.
    pub(super) fn with_array<T>(
        &self,
        array: &str,
        f: impl FnOnce(&Array) -> T,
    ) -> Result<T, ThreadError> {
        let bucket = self.bucket_for(array).lock();
        bucket
            .arrays
            .get(array)
            .map(f)
            .ok_or_else(|| ThreadError::NotFound(array.to_string()))
    }

    /// `thread::sv_set`/plain `get`: read a key's display value.
    pub fn get(&self, array: &str, key: &str) -> Result<String, ThreadError> {
        self.with_array(array, |a| a.get(key).map(ValueContainer::as_display))?
            .ok_or_else(|| ThreadError::NotFound(format!("{array}({key})")))
    }

    /// `thread::sv_set array key value`: set a scalar value, creating the
    /// array if needed.
    pub fn set(&self, array: &str, key: &str, value: impl Into<String>) {
        self.with_array_mut(array, |a| {
            a.insert(key.to_string(), ValueContainer::Str(value.into()));
        });
    }

    /// `thread::sv_exists`.
    #[must_use]
    pub fn exists(&self, array: &str, key: &str) -> bool {
        self.with_array(array, |a| a.contains_key(key)).unwrap_or(false)
    }

    /// `thread::sv_incr array key ?by?`.
    pub fn incr(&self, array: &str, key: &str, by: i64) -> Result<i64, ThreadError> {
        self.with_array_mut(array, |a| {
            let current = match a.get(key) {
                Some(v) => v
                    .as_display()
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ThreadError::NotANumber(v.as_display()))?,
                None => 0,
            };
            let updated = current + by;
            a.insert(key.to_string(), ValueContainer::Str(updated.to_string()));
            Ok(updated)
        })
    }

    /// `thread::sv_append`: append `value` to the (scalar) string at `key`.
    pub fn append(&self, array: &str, key: &str, value: &str) -> String {
        self.with_array_mut(array, |a| {
            let mut current = a.get(key).map(ValueContainer::as_display).unwrap_or_default();
            current.push_str(value);
            a.insert(key.to_string(), ValueContainer::Str(current.clone()));
            current
        })
    }

    /// `thread::sv_lappend`: append one or more elements to the list at
    /// `key`.
    pub fn lappend(&self, array: &str, key: &str, values: &[String]) -> Vec<String> {
        self.with_array_mut(array, |a| {
            let mut list = a.get(key).map(ValueContainer::as_list).unwrap_or_default();
            list.extend(values.iter().cloned());
            a.insert(key.to_string(), ValueContainer::List(list.clone()));
            list
        })
    }

    /// `array set`: bulk-assign key/value pairs.
    pub fn array_set(&self, array: &str, pairs: &[(String, String)]) {
        self.with_array_mut(array, |a| {
            for (k, v) in pairs {
                a.insert(k.clone(), ValueContainer::Str(v.clone()));
            }
        });
    }

    /// `array reset`: replace the entire array's contents.
    pub fn array_reset(&self, array: &str, pairs: &[(String, String)]) {
        self.with_array_mut(array, |a| {
            a.clear();
            for (k, v) in pairs {
                a.insert(k.clone(), ValueContainer::Str(v.clone()));
            }
        });
    }

    /// `array get`: every key/value pair, in unspecified but stable order.
    #[must_use]
    pub fn array_get(&self, array: &str) -> Vec<(String, String)> {
        self.with_array(array, |a| {
            let mut pairs: Vec<_> = a.iter().map(|(k, v)| (k.clone(), v.as_display())).collect();
            pairs.sort();
            pairs
        })
        .unwrap_or_default()
    }

    /// `array names`.
    #[must_use]
    pub fn array_names(&self, array: &str) -> Vec<String> {
        self.with_array(array, |a| {
            let mut names: Vec<_> = a.keys().cloned().collect();
            names.sort();
            names
        })
        .unwrap_or_default()
    }

    /// `array size`.
    #[must_use]
    pub fn array_size(&self, array: &str) -> usize {
        self.with_array(array, HashMap::len).unwrap_or(0)
    }

    /// `array exists`: whether the array itself has been created.
    #[must_use]
    pub fn array_exists(&self, array: &str) -> bool {
        self.bucket_for(array).lock().arrays.contains_key(array)
    }

    /// `thread::sv_unset array ?key?`: drop one key, or the whole array
    /// when `key` is `None`.
    pub fn unset(&self, array: &str, key: Option<&str>) -> Result<(), ThreadError> {
        let mut bucket = self.bucket_for(array).lock();
        let Some(entry) = bucket.arrays.get_mut(array) else {
            return Err(ThreadError::NotFound(array.to_string()));
        };
        match key {
            None => {
                bucket.arrays.remove(array);
            }
            Some(k) => {
                if entry.remove(k).is_none() {
                    return Err(ThreadError::NotFound(format!("{array}({k})")));
                }
            }
        }
        Ok(())
    }
}

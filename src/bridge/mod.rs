//! FFI bridge for host front ends.
//!
//! C-ABI functions exchanging JSON strings. Every returned string is
//! heap-allocated and must be released with `free_string`. Invalid input
//! yields a null pointer, never a panic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use crate::catalog::{load_catalog, parse_uniques, Catalog, CatalogCache, CatalogPaths, CoreCatalog, FsSource, GemCatalog};
use crate::config::{CohesionMode, RuleConfig};
use crate::rules::{violations, RollSnapshot};
use crate::session::Session;
use crate::tags::normalize;

fn json_to_cstring<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

fn parse_cstr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_owned()) }
}

/// Catalog documents passed inline instead of read from disk
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InlineDocuments {
    core: Value,
    gems: Value,
    skills: Value,
    uniques: Value,
}

impl InlineDocuments {
    fn into_catalog(self) -> Catalog {
        Catalog {
            core: CoreCatalog::from_document(&self.core),
            gems: GemCatalog::enrich(&self.gems, &self.skills),
            uniques: parse_uniques(&self.uniques),
        }
    }
}

fn roll_once(catalog: Catalog, seed: u64, mode_index: u8) -> *mut c_char {
    let Some(mode) = CohesionMode::from_index(mode_index) else {
        return std::ptr::null_mut();
    };
    let mut session = Session::new(Arc::new(catalog), seed);
    session.set_mode(mode);
    match session.roll() {
        Ok(result) => json_to_cstring(result),
        Err(_) => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub extern "C" fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        }
    }
}

#[no_mangle]
pub extern "C" fn get_version() -> *mut c_char {
    CString::new(env!("CARGO_PKG_VERSION"))
        .unwrap_or_default()
        .into_raw()
}

/// Roll one build from the catalog documents under `data_dir`.
/// `mode_index` is the cohesion slider position 0..=3.
#[no_mangle]
pub extern "C" fn roll_build(data_dir: *const c_char, seed: u64, mode_index: u8) -> *mut c_char {
    let Some(dir) = parse_cstr(data_dir) else {
        return std::ptr::null_mut();
    };
    let source = FsSource::new(dir);
    let mut cache = CatalogCache::new();
    let catalog = load_catalog(&source, &mut cache, &CatalogPaths::default());
    roll_once(catalog, seed, mode_index)
}

/// Roll one build from `{core, gems, skills, uniques}` passed as JSON
#[no_mangle]
pub extern "C" fn roll_build_inline(
    documents_json: *const c_char,
    seed: u64,
    mode_index: u8,
) -> *mut c_char {
    let Some(json) = parse_cstr(documents_json) else {
        return std::ptr::null_mut();
    };
    let Ok(documents) = serde_json::from_str::<InlineDocuments>(&json) else {
        return std::ptr::null_mut();
    };
    roll_once(documents.into_catalog(), seed, mode_index)
}

/// Violation messages of a roll snapshot under the default rules
#[no_mangle]
pub extern "C" fn validate_roll(snapshot_json: *const c_char) -> *mut c_char {
    let Some(json) = parse_cstr(snapshot_json) else {
        return std::ptr::null_mut();
    };
    let Ok(snapshot) = serde_json::from_str::<RollSnapshot>(&json) else {
        return std::ptr::null_mut();
    };
    let messages: Vec<&str> = violations(&RuleConfig::default(), &snapshot)
        .iter()
        .map(|v| v.message())
        .collect();
    json_to_cstring(&messages)
}

#[no_mangle]
pub extern "C" fn normalize_tag(tag: *const c_char) -> *mut c_char {
    match parse_cstr(tag) {
        Some(raw) => CString::new(normalize(&raw)).unwrap_or_default().into_raw(),
        None => std::ptr::null_mut(),
    }
}

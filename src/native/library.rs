//! Loader for the native keyboard-hook library
//!
//! The library exports three C-ABI functions. Candidates are tried in order
//! and the first one that loads with all three symbols is used.
//!
//! The `JKeyboardHook32`/`JKeyboardHook64` builds shipped for the Java wrapper
//! only export JNI entry points (`Java_..._GlobalKeyboardHook_checkHotKey`
//! taking `JNIEnv*` and `jobject`). Those do not resolve here; the library has
//! to be rebuilt with the plain exports named below.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, info, warn};

use super::HotkeyBackend;
use crate::error::HookError;
use crate::hotkey::Hotkey;

/// Library names tried when nothing else is configured: 32-bit build first
pub const DEFAULT_LIBRARY_NAMES: [&str; 2] = ["JKeyboardHook32", "JKeyboardHook64"];

// Unmangled `extern "C"` exports (`__stdcall` on 32-bit Windows).
const CHECK_SYMBOL: &[u8] = b"checkHotKey\0";
const SET_SYMBOL: &[u8] = b"setHotKey\0";
const RESET_SYMBOL: &[u8] = b"resetHotKey\0";

type CheckFn = unsafe extern "system" fn() -> i32;
type SetFn = unsafe extern "system" fn(i32, i32, i32, i32, i32) -> i32;
type ResetFn = unsafe extern "system" fn();

/// A loaded keyboard-hook library with its entry points resolved
pub struct NativeLibrary {
    path: PathBuf,
    check: CheckFn,
    set: SetFn,
    reset: ResetFn,
    // Keeps the code behind the function pointers mapped.
    _library: Library,
}

impl NativeLibrary {
    /// Load the library at `path` and resolve its entry points
    pub fn load(path: &Path) -> Result<Self, libloading::Error> {
        // SAFETY: loading runs the library's initialisers; the hook library
        // is trusted to be the one configured by the operator.
        let library = unsafe { Library::new(path)? };

        // SAFETY: the symbol types match the library's exported signatures.
        // The copied pointers stay valid while `_library` is alive.
        let (check, set, reset) = unsafe {
            (
                *library.get::<CheckFn>(CHECK_SYMBOL)?,
                *library.get::<SetFn>(SET_SYMBOL)?,
                *library.get::<ResetFn>(RESET_SYMBOL)?,
            )
        };

        Ok(Self {
            path: path.to_owned(),
            check,
            set,
            reset,
            _library: library,
        })
    }

    /// Try each candidate in order and keep the first that loads
    pub fn load_first<S: AsRef<str>>(
        candidates: &[S],
        search_dir: Option<&Path>,
    ) -> Result<Self, HookError> {
        let mut tried = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let path = candidate_path(candidate.as_ref(), search_dir);
            match Self::load(&path) {
                Ok(library) => {
                    info!(path = %path.display(), "keyboard hook library loaded");
                    return Ok(library);
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "keyboard hook library not loaded");
                    tried.push(path.display().to_string());
                }
            }
        }

        warn!(
            ?tried,
            "no keyboard hook library loaded - check the library location"
        );
        Err(HookError::NoLibraryLoaded { tried })
    }

    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HotkeyBackend for NativeLibrary {
    fn check_hotkey(&self) -> bool {
        // SAFETY: resolved from the loaded library, which outlives `self.check`.
        unsafe { (self.check)() != 0 }
    }

    fn set_hotkey(&self, hotkey: &Hotkey) -> bool {
        let m = hotkey.modifiers();
        // SAFETY: see `check_hotkey`.
        unsafe {
            (self.set)(
                hotkey.virtual_key() as i32,
                m.alt as i32,
                m.control as i32,
                m.shift as i32,
                m.win as i32,
            ) != 0
        }
    }

    fn reset_hotkey(&self) {
        // SAFETY: see `check_hotkey`.
        unsafe { (self.reset)() }
    }
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Resolve a configured candidate to a loadable path
///
/// Bare names get the platform prefix and suffix (`X.dll`, `libX.so`,
/// `libX.dylib`) and are placed in `search_dir` when one is given. Anything
/// that already has a directory or an extension is used as written.
pub fn candidate_path(candidate: &str, search_dir: Option<&Path>) -> PathBuf {
    let as_path = Path::new(candidate);
    if as_path.components().count() > 1 || as_path.extension().is_some() {
        return as_path.to_owned();
    }

    let file_name: OsString = libloading::library_filename(candidate);
    match search_dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Discovery across the modules mapped into the current process.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use goblin::Hint;
use nexus_payload::Guid;

use crate::{Error, OwnedModule, PayloadSource};

/// A record found in one of the process's modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMatch {
    /// Module file the record was read from.
    pub path: PathBuf,
    /// Offset of the record header within the payload section.
    pub offset: usize,
    /// Copy of the record body.
    pub body: Vec<u8>,
}

/// Extracts file-backed module paths from `/proc/<pid>/maps` text, in first-seen order.
///
/// Pseudo mappings (`[heap]`, `[vdso]`, anonymous), device nodes, memfds and
/// deleted files are skipped.
pub fn parse_maps(text: &str) -> Vec<PathBuf> {
    let mut seen = Vec::new();
    for line in text.lines() {
        // address perms offset dev inode pathname
        let Some(path) = line.splitn(6, char::is_whitespace).filter(|f| !f.is_empty()).nth(5) else {
            continue;
        };
        let path = path.trim();
        if !path.starts_with('/')
            || path.starts_with("/dev/")
            || path.starts_with("/memfd:")
            || path.ends_with(" (deleted)")
        {
            continue;
        }
        let path = PathBuf::from(path);
        if !seen.contains(&path) {
            seen.push(path);
        }
    }
    seen
}

/// Paths of the modules currently mapped into this process.
#[cfg(target_os = "linux")]
pub fn loaded_modules() -> Result<Vec<PathBuf>, Error> {
    let maps = "/proc/self/maps";
    let text = std::fs::read_to_string(maps)
        .map_err(|source| Error::Io { path: PathBuf::from(maps), source })?;
    Ok(parse_maps(&text))
}

/// Paths of the modules currently mapped into this process.
#[cfg(not(target_os = "linux"))]
pub fn loaded_modules() -> Result<Vec<PathBuf>, Error> {
    Err(Error::Unsupported("module enumeration needs /proc/self/maps"))
}

/// Searches every loaded module, in map order, for a record of kind `identity`.
///
/// Only regular files starting with an ELF, PE or Mach-O magic are read;
/// everything else (locale archives, fonts, device nodes) is skipped. A corrupt
/// payload section ends the search with an error.
pub fn find_in_process(identity: Guid) -> Result<Option<ProcessMatch>, Error> {
    for path in loaded_modules()? {
        if !is_module_file(&path) {
            log::trace!("skipping {}: not a module file", path.display());
            continue;
        }
        let module = match OwnedModule::open(&path) {
            Ok(module) => module,
            Err(err) => {
                log::debug!("skipping {}: {err}", path.display());
                continue;
            }
        };
        let image = match module.image() {
            Ok(image) => image,
            Err(err) => {
                log::debug!("skipping {}: {err}", path.display());
                continue;
            }
        };
        match image.find_record(identity) {
            Ok(record) => {
                return Ok(Some(ProcessMatch {
                    path,
                    offset: record.offset,
                    body: record.body.to_vec(),
                }))
            }
            Err(err) if err.is_not_found() => continue,
            Err(err) => {
                log::warn!("payload section of {} is unusable: {err}", path.display());
                return Err(err);
            }
        }
    }
    Ok(None)
}

/// Regular file whose first bytes identify an ELF, PE or thin Mach-O image.
///
/// Reads at most 16 bytes, so large data files and device nodes are never
/// read in full.
pub fn is_module_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        _ => return false,
    }
    let mut magic = [0u8; 16];
    let peeked = File::open(path).and_then(|mut file| file.read_exact(&mut magic));
    if let Err(err) = peeked {
        log::trace!("cannot peek {}: {err}", path.display());
        return false;
    }
    matches!(goblin::peek_bytes(&magic), Ok(Hint::Elf(_) | Hint::Mach(_) | Hint::PE))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
55d0c0a00000-55d0c0a02000 r--p 00000000 fd:01 1048602                    /usr/bin/cat
55d0c0a02000-55d0c0a07000 r-xp 00002000 fd:01 1048602                    /usr/bin/cat
55d0c1e5a000-55d0c1e7b000 rw-p 00000000 00:00 0                          [heap]
7f1a2b400000-7f1a2b6e9000 r--p 00000000 fd:01 1054917                    /usr/lib/locale/locale-archive
7f1a2b800000-7f1a2b828000 r--p 00000000 fd:01 1059360                    /usr/lib/x86_64-linux-gnu/libc.so.6
7f1a2ba00000-7f1a2ba01000 rw-p 00000000 00:00 0
7f1a2bb00000-7f1a2bb01000 r--p 00000000 fd:01 99                         /tmp/old module.so (deleted)
7ffd6d3f1000-7ffd6d3f3000 r-xp 00000000 00:00 0                          [vdso]
";

    #[test]
    fn parse_maps_keeps_file_backed_order() {
        let paths = parse_maps(MAPS);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/usr/bin/cat"),
                PathBuf::from("/usr/lib/locale/locale-archive"),
                PathBuf::from("/usr/lib/x86_64-linux-gnu/libc.so.6"),
            ]
        );
    }

    #[test]
    fn parse_maps_keeps_spaces_in_paths() {
        let line = "7f00-7f01 r--p 00000000 fd:01 12   /opt/my app/libx.so\n";
        assert_eq!(parse_maps(line), vec![PathBuf::from("/opt/my app/libx.so")]);
    }

    #[test]
    fn parse_maps_skips_devices_and_memfds() {
        let maps = "\
7f00-7f01 rw-s 00000000 00:05 12   /dev/dri/renderD128
7f01-7f02 rw-s 00000000 00:01 34   /dev/zero
7f02-7f03 r-xp 00000000 00:01 56   /memfd:jit (deleted)
7f03-7f04 r-xp 00000000 00:01 78   /memfd:wayland-shm
7f04-7f05 r--p 00000000 fd:01 90   /usr/lib/libm.so.6
";
        assert_eq!(parse_maps(maps), vec![PathBuf::from("/usr/lib/libm.so.6")]);
    }

    #[test]
    fn only_module_files_are_read() {
        let exe = std::env::current_exe().expect("current exe");
        assert!(is_module_file(&exe));
        assert!(!is_module_file(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))));
        assert!(!is_module_file(Path::new(env!("CARGO_MANIFEST_DIR"))));
        assert!(!is_module_file(Path::new("/nonexistent/payload/module.so")));
    }

    #[cfg(unix)]
    #[test]
    fn device_nodes_are_not_module_files() {
        assert!(!is_module_file(Path::new("/dev/null")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_executable_is_listed() {
        let exe = std::env::current_exe().expect("current exe");
        let modules = loaded_modules().expect("maps");
        assert!(modules.iter().any(|p| p == &exe || p.file_name() == exe.file_name()));
    }
}

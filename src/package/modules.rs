//! Module-descriptor inspection and artifact classification.
//!
//! Mirrors the JVM's module-resolution convention: jars carrying a real
//! `module-info.class` link into the module graph, everything else is
//! legacy classpath content. Inspection never aborts packaging — an
//! artifact that cannot be read is classified as classpath and reported
//! as a warning.

use colored::*;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Module metadata of a binary artifact.
///
/// `automatic` is false only for jars with an explicit
/// `module-info.class` descriptor. Automatic modules take their name
/// from the `Automatic-Module-Name` manifest attribute, or from the
/// file name when no metadata exists at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub automatic: bool,
}

/// A total, order-preserving partition of a runtime dependency set.
#[derive(Debug, Default, Clone)]
pub struct Classification {
    /// Explicit (non-automatic) modules, referenced in place.
    pub module_path: Vec<PathBuf>,
    /// Automatic modules and descriptor-less artifacts, staged into the
    /// packaging input directory.
    pub class_path: Vec<PathBuf>,
    /// Declared names of the module-path members, in partition order.
    pub module_names: Vec<String>,
}

/// Partitions `artifacts` into module-path and classpath sets.
///
/// Every input lands in exactly one side; the two sides are disjoint and
/// preserve input order.
pub fn classify(artifacts: &[PathBuf]) -> Classification {
    let mut out = Classification::default();
    for artifact in artifacts {
        match inspect_artifact(artifact) {
            Some(descriptor) if !descriptor.automatic => {
                out.module_names.push(descriptor.name);
                out.module_path.push(artifact.clone());
            }
            _ => out.class_path.push(artifact.clone()),
        }
    }
    out
}

/// Declared module names for an explicitly-configured module path.
pub fn module_names_of(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| inspect_artifact(p).map(|d| d.name))
        .collect()
}

/// Reads the module descriptor embedded in `path`, if any.
///
/// Returns `None` when the artifact cannot be opened as a jar; the
/// caller treats that as "no module info found" rather than an error.
pub fn inspect_artifact(path: &Path) -> Option<ModuleDescriptor> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => {
            warn_unreadable(path);
            return None;
        }
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(a) => a,
        Err(_) => {
            warn_unreadable(path);
            return None;
        }
    };

    if let Some(name) = explicit_module_name(&mut archive) {
        return Some(ModuleDescriptor {
            name,
            automatic: false,
        });
    }
    if let Some(name) = manifest_module_name(&mut archive) {
        return Some(ModuleDescriptor {
            name,
            automatic: true,
        });
    }
    Some(ModuleDescriptor {
        name: derive_module_name(path),
        automatic: true,
    })
}

fn warn_unreadable(path: &Path) {
    println!(
        "   {} Could not read module info from {}; defaulting to classpath",
        "!".yellow(),
        path.display()
    );
}

fn explicit_module_name<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let entry_name = archive
        .file_names()
        .find(|n| {
            *n == "module-info.class"
                || (n.starts_with("META-INF/versions/") && n.ends_with("/module-info.class"))
        })
        .map(str::to_string)?;
    let mut entry = archive.by_name(&entry_name).ok()?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).ok()?;
    classfile_module_name(&bytes)
}

fn manifest_module_name<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let mut entry = archive.by_name("META-INF/MANIFEST.MF").ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).ok()?;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("Automatic-Module-Name:") {
            let name = rest.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Derives an automatic module name from the jar file name: the version
/// suffix is dropped and non-alphanumeric runs become dots, e.g.
/// `foo-bar-1.2.3.jar` becomes `foo.bar`.
pub fn derive_module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let version = Regex::new(r"-(\d+(\.|$))").unwrap();
    let base = match version.find(&stem) {
        Some(m) => &stem[..m.start()],
        None => stem.as_str(),
    };
    let cleaned = Regex::new(r"[^A-Za-z0-9]+").unwrap().replace_all(base, ".");
    cleaned.trim_matches('.').to_string()
}

// Minimal class-file reader: walks the constant pool and the class
// attributes of module-info.class to find the declared module name.
// Every read is bounds-checked; a malformed file yields None and the
// artifact falls back to automatic classification.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn u16(&mut self) -> Option<u16> {
        let b = self.take(2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        let b = self.take(4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }
}

fn classfile_module_name(bytes: &[u8]) -> Option<String> {
    let mut r = Reader::new(bytes);
    if r.u32()? != 0xCAFE_BABE {
        return None;
    }
    r.skip(4)?; // minor + major version

    let cp_count = r.u16()?;
    let mut utf8: HashMap<u16, String> = HashMap::new();
    let mut module_refs: HashMap<u16, u16> = HashMap::new();
    let mut index: u16 = 1;
    while index < cp_count {
        let tag = r.u8()?;
        match tag {
            // CONSTANT_Utf8
            1 => {
                let len = r.u16()? as usize;
                let raw = r.take(len)?;
                if let Ok(s) = std::str::from_utf8(raw) {
                    utf8.insert(index, s.to_string());
                }
            }
            // Integer, Float
            3 | 4 => r.skip(4)?,
            // Long, Double occupy two constant-pool slots
            5 | 6 => {
                r.skip(8)?;
                index = index.checked_add(1)?;
            }
            // Class, String, MethodType
            7 | 8 | 16 => r.skip(2)?,
            // Fieldref, Methodref, InterfaceMethodref, NameAndType,
            // Dynamic, InvokeDynamic
            9 | 10 | 11 | 12 | 17 | 18 => r.skip(4)?,
            // MethodHandle
            15 => r.skip(3)?,
            // Module, Package
            19 | 20 => {
                let name_index = r.u16()?;
                if tag == 19 {
                    module_refs.insert(index, name_index);
                }
            }
            _ => return None,
        }
        index = index.checked_add(1)?;
    }

    r.skip(6)?; // access_flags, this_class, super_class
    let interfaces = r.u16()? as usize;
    r.skip(interfaces.checked_mul(2)?)?;

    // module-info carries no fields or methods, but walk them anyway
    for _ in 0..2 {
        let count = r.u16()?;
        for _ in 0..count {
            r.skip(6)?;
            skip_attributes(&mut r)?;
        }
    }

    let attr_count = r.u16()?;
    for _ in 0..attr_count {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        if utf8.get(&name_index).map(String::as_str) == Some("Module") {
            let module_index = r.u16()?;
            let utf8_index = module_refs.get(&module_index)?;
            return utf8.get(utf8_index).cloned();
        }
        r.skip(len)?;
    }
    None
}

fn skip_attributes(r: &mut Reader) -> Option<()> {
    let count = r.u16()?;
    for _ in 0..count {
        r.skip(2)?;
        let len = r.u32()? as usize;
        r.skip(len)?;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_module_name_strips_version() {
        assert_eq!(
            derive_module_name(Path::new("libs/foo-bar-1.2.3.jar")),
            "foo.bar"
        );
        assert_eq!(derive_module_name(Path::new("guava-33.0-jre.jar")), "guava");
        assert_eq!(derive_module_name(Path::new("plain.jar")), "plain");
    }

    #[test]
    fn test_derive_module_name_squashes_separators() {
        assert_eq!(
            derive_module_name(Path::new("spring_core-extra.jar")),
            "spring.core.extra"
        );
    }

    /// Builds a minimal but well-formed module-info.class declaring
    /// `name`.
    fn module_info_bytes(name: &str) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor
        out.extend_from_slice(&55u16.to_be_bytes()); // major (Java 11)
        out.extend_from_slice(&6u16.to_be_bytes()); // constant pool count
        // #1 Utf8 "Module"
        out.push(1);
        out.extend_from_slice(&(b"Module".len() as u16).to_be_bytes());
        out.extend_from_slice(b"Module");
        // #2 Utf8 <name>
        out.push(1);
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(name.as_bytes());
        // #3 Module -> #2
        out.push(19);
        out.extend_from_slice(&2u16.to_be_bytes());
        // #4 Utf8 "module-info"
        out.push(1);
        out.extend_from_slice(&(b"module-info".len() as u16).to_be_bytes());
        out.extend_from_slice(b"module-info");
        // #5 Class -> #4
        out.push(7);
        out.extend_from_slice(&4u16.to_be_bytes());

        out.extend_from_slice(&0x8000u16.to_be_bytes()); // ACC_MODULE
        out.extend_from_slice(&5u16.to_be_bytes()); // this_class
        out.extend_from_slice(&0u16.to_be_bytes()); // super_class
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&0u16.to_be_bytes()); // fields
        out.extend_from_slice(&0u16.to_be_bytes()); // methods
        out.extend_from_slice(&1u16.to_be_bytes()); // attributes
        // Module attribute: name #1, 16-byte body
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&16u32.to_be_bytes());
        out.extend_from_slice(&3u16.to_be_bytes()); // module_name_index
        out.extend_from_slice(&0u16.to_be_bytes()); // module_flags
        out.extend_from_slice(&0u16.to_be_bytes()); // module_version_index
        out.extend_from_slice(&0u16.to_be_bytes()); // requires_count
        out.extend_from_slice(&0u16.to_be_bytes()); // exports_count
        out.extend_from_slice(&0u16.to_be_bytes()); // opens_count
        out.extend_from_slice(&0u16.to_be_bytes()); // uses_count
        out.extend_from_slice(&0u16.to_be_bytes()); // provides_count
        out
    }

    #[test]
    fn test_classfile_module_name() {
        let bytes = module_info_bytes("com.example.core");
        assert_eq!(
            classfile_module_name(&bytes),
            Some("com.example.core".to_string())
        );
    }

    #[test]
    fn test_classfile_rejects_garbage() {
        assert_eq!(classfile_module_name(b"not a class file"), None);
        assert_eq!(classfile_module_name(&[]), None);
        let mut truncated = module_info_bytes("m");
        truncated.truncate(20);
        assert_eq!(classfile_module_name(&truncated), None);
    }

    #[test]
    fn test_classification_is_total_and_disjoint() {
        let dir = tempfile::tempdir().unwrap();
        let unreadable = dir.path().join("broken.jar");
        fs::write(&unreadable, b"not a zip").unwrap();
        let missing = dir.path().join("missing.jar");

        let artifacts = vec![unreadable.clone(), missing.clone()];
        let result = classify(&artifacts);

        assert!(result.module_path.is_empty());
        assert_eq!(result.class_path, artifacts);
        assert!(result.module_names.is_empty());
    }
}

use anyhow::Result;
use ignore::WalkBuilder;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::jar_walk::{contains_dir, entry_names};
use crate::resource::ResourceLocation;

/// The classloading context: turns a slash-delimited package path into every
/// location that contributes classes to it.
pub trait ResourceResolver {
    fn resources(&self, dir_path: &str) -> Result<Vec<ResourceLocation>>;

    /// Entry names of an archive returned by [`Self::resources`]. Resolvers
    /// that already read the archive hand back what they read.
    fn archive_entries(&self, archive: &Path) -> Result<Arc<[String]>> {
        Ok(entry_names(archive)?.into())
    }
}

impl<T: ResourceResolver + ?Sized> ResourceResolver for &T {
    fn resources(&self, dir_path: &str) -> Result<Vec<ResourceLocation>> {
        (**self).resources(dir_path)
    }

    fn archive_entries(&self, archive: &Path) -> Result<Arc<[String]>> {
        (**self).archive_entries(archive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClasspathEntry {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ClasspathEntry {
    pub fn classify(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if is_archive(&path) {
            Self::Archive(path)
        } else {
            Self::Directory(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(p) | Self::Archive(p) => p,
        }
    }
}

/// Archive entry names are read once per archive and kept for the life of
/// the classpath.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    entries: Vec<ClasspathEntry>,
    archive_names: RefCell<HashMap<PathBuf, Arc<[String]>>>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits on the platform path separator. An element whose last
    /// component is `*` expands to the jars and zips directly inside that
    /// directory.
    pub fn parse(spec: impl AsRef<OsStr>) -> Self {
        let mut classpath = Self::new();
        for element in std::env::split_paths(spec.as_ref()) {
            if element.as_os_str().is_empty() {
                continue;
            }
            if element.file_name().is_some_and(|n| n == "*") {
                let dir = element.parent().unwrap_or_else(|| Path::new("."));
                let dir = if dir.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    dir
                };
                for archive in archives_in(dir) {
                    classpath.push(ClasspathEntry::Archive(archive));
                }
                continue;
            }
            classpath.push(ClasspathEntry::classify(element));
        }
        classpath
    }

    /// Duplicate roots are kept once, at their first position.
    pub fn push(&mut self, entry: ClasspathEntry) {
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ClasspathEntry> for Classpath {
    fn from_iter<I: IntoIterator<Item = ClasspathEntry>>(iter: I) -> Self {
        let mut classpath = Self::new();
        for entry in iter {
            classpath.push(entry);
        }
        classpath
    }
}

impl ResourceResolver for Classpath {
    fn resources(&self, dir_path: &str) -> Result<Vec<ResourceLocation>> {
        let dir_path = dir_path.trim_matches('/');
        let mut locations = Vec::new();

        for entry in &self.entries {
            match entry {
                ClasspathEntry::Directory(root) => {
                    let dir = if dir_path.is_empty() {
                        root.clone()
                    } else {
                        root.join(dir_path)
                    };
                    if dir.is_dir() {
                        locations.push(ResourceLocation::file(dir));
                    }
                }
                ClasspathEntry::Archive(archive) => {
                    if !archive.is_file() {
                        continue;
                    }
                    // An archive whose entries cannot be listed is still
                    // handed to the walker, which reports it.
                    match self.archive_entries(archive) {
                        Ok(names) if !contains_dir(&names, dir_path) => continue,
                        Ok(_) => {}
                        Err(err) => {
                            debug!(archive = %archive.display(), error = %format!("{err:#}"), "archive entries unreadable");
                        }
                    }
                    locations.push(ResourceLocation::jar(archive.clone(), dir_path));
                }
            }
        }

        debug!(dir_path, found = locations.len(), "resolved resource locations");
        Ok(locations)
    }

    fn archive_entries(&self, archive: &Path) -> Result<Arc<[String]>> {
        if let Some(names) = self.archive_names.borrow().get(archive) {
            return Ok(Arc::clone(names));
        }
        let names: Arc<[String]> = entry_names(archive)?.into();
        self.archive_names
            .borrow_mut()
            .insert(archive.to_path_buf(), Arc::clone(&names));
        Ok(names)
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
}

fn archives_in(dir: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .build();

    let mut archives: Vec<PathBuf> = walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| is_archive(path))
        .collect();
    archives.sort();
    archives
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};
    use zip::write::FileOptions;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "class_preload_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn write_jar(path: &Path, entries: &[&str]) -> Result<()> {
        let file = fs::File::create(path)?;
        let mut zip = zip::ZipWriter::new(file);
        for name in entries {
            zip.start_file(*name, FileOptions::default())?;
            zip.write_all(b"")?;
        }
        zip.finish()?;
        Ok(())
    }

    #[test]
    fn parse_classifies_and_dedupes_entries() {
        let spec = std::env::join_paths(["build/classes", "lib/rpc.jar", "", "build/classes", "lib/extra.ZIP"]).unwrap();
        let classpath = Classpath::parse(spec);
        assert_eq!(
            classpath.entries(),
            [
                ClasspathEntry::Directory(PathBuf::from("build/classes")),
                ClasspathEntry::Archive(PathBuf::from("lib/rpc.jar")),
                ClasspathEntry::Archive(PathBuf::from("lib/extra.ZIP")),
            ]
        );
    }

    #[test]
    fn parse_expands_wildcards() -> Result<()> {
        let lib = temp_dir("wildcard");
        fs::create_dir_all(&lib)?;
        write_jar(&lib.join("b.jar"), &[])?;
        write_jar(&lib.join("a.jar"), &[])?;
        fs::write(lib.join("notes.txt"), b"")?;

        let classpath = Classpath::parse(lib.join("*"));
        assert_eq!(
            classpath.entries(),
            [
                ClasspathEntry::Archive(lib.join("a.jar")),
                ClasspathEntry::Archive(lib.join("b.jar")),
            ]
        );
        let _ = fs::remove_dir_all(lib);
        Ok(())
    }

    #[test]
    fn resources_finds_split_packages() -> Result<()> {
        let base = temp_dir("split");
        let classes = base.join("classes");
        fs::create_dir_all(classes.join("com/example"))?;
        let jar = base.join("handlers.jar");
        write_jar(&jar, &["com/example/h/Echo.class"])?;
        let other = base.join("other.jar");
        write_jar(&other, &["org/other/X.class"])?;

        let classpath: Classpath = [
            ClasspathEntry::Directory(classes.clone()),
            ClasspathEntry::Archive(jar.clone()),
            ClasspathEntry::Archive(other),
            ClasspathEntry::Directory(base.join("missing")),
        ]
        .into_iter()
        .collect();

        let found = classpath.resources("com/example")?;
        assert_eq!(
            found,
            vec![
                ResourceLocation::file(classes.join("com/example")),
                ResourceLocation::jar(jar, "com/example"),
            ]
        );
        let _ = fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn archive_entries_are_read_once() -> Result<()> {
        let base = temp_dir("reuse");
        fs::create_dir_all(&base)?;
        let jar = base.join("handlers.jar");
        write_jar(&jar, &["com/example/Echo.class"])?;

        let classpath: Classpath = [ClasspathEntry::Archive(jar.clone())].into_iter().collect();
        assert_eq!(classpath.resources("com/example")?.len(), 1);

        // Later lookups come from memory, not from the file.
        fs::write(&jar, b"rewritten")?;
        assert_eq!(
            &*classpath.archive_entries(&jar)?,
            ["com/example/Echo.class".to_string()]
        );
        assert_eq!(classpath.resources("com/example")?.len(), 1);
        let _ = fs::remove_dir_all(base);
        Ok(())
    }

    #[test]
    fn unreadable_archives_are_still_returned() -> Result<()> {
        let base = temp_dir("corrupt");
        fs::create_dir_all(&base)?;
        let jar = base.join("corrupt.jar");
        fs::write(&jar, b"garbage")?;

        let classpath: Classpath = [ClasspathEntry::Archive(jar.clone())].into_iter().collect();
        assert_eq!(classpath.resources("a")?, vec![ResourceLocation::jar(jar, "a")]);
        let _ = fs::remove_dir_all(base);
        Ok(())
    }
}

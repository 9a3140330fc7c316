//! Conversions between dotted package names and slash-delimited paths.

pub const CLASS_SUFFIX: &str = ".class";

pub fn to_dir_path(package: &str) -> String {
    package.replace('.', "/")
}

pub fn to_package_name(dir_path: &str) -> String {
    dir_path
        .trim_matches(['/', '\\'])
        .replace(['/', '\\'], ".")
}

/// The empty string is the unnamed package and counts as valid.
pub fn is_valid_package_name(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    name.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

pub fn qualify(package: &str, simple_name: &str) -> String {
    if package.is_empty() {
        simple_name.to_string()
    } else {
        format!("{package}.{simple_name}")
    }
}

pub fn strip_class_suffix(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(CLASS_SUFFIX)
        .filter(|stem| !stem.is_empty())
}

pub fn is_inner_class(simple_name: &str) -> bool {
    simple_name.contains('$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_path_round_trip_is_stable() {
        for pkg in ["com", "com.example.rpc", "a_b.c1.$d", "x.y.z.w.v", ""] {
            let dir = to_dir_path(pkg);
            assert_eq!(to_dir_path(&to_package_name(&dir)), dir, "{pkg}");
        }
    }

    #[test]
    fn to_package_name_accepts_backslashes_and_trims() {
        assert_eq!(to_package_name("/com\\example/rpc/"), "com.example.rpc");
    }

    #[test]
    fn validates_package_names() {
        assert!(is_valid_package_name("com.example.rpc"));
        assert!(is_valid_package_name("_internal.v2"));
        assert!(is_valid_package_name(""));
        assert!(!is_valid_package_name("com..example"));
        assert!(!is_valid_package_name("com.1example"));
        assert!(!is_valid_package_name("com/example"));
        assert!(!is_valid_package_name(".com"));
    }

    #[test]
    fn qualify_handles_default_package() {
        assert_eq!(qualify("", "Main"), "Main");
        assert_eq!(qualify("a.b", "C"), "a.b.C");
    }

    #[test]
    fn strip_class_suffix_rejects_bare_suffix() {
        assert_eq!(strip_class_suffix("Foo.class"), Some("Foo"));
        assert_eq!(strip_class_suffix(".class"), None);
        assert_eq!(strip_class_suffix("Foo.java"), None);
    }
}

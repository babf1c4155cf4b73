//! Mapping from Go type expressions to Thrift types, used when deriving an
//! IDL from existing Go structs.

use anyhow::bail;

/// Translate a Go type expression (as written in source, e.g. `*[]int32` or
/// `map[string]*User`) into the corresponding Thrift type.
///
/// Pointers unwrap one level. Slices and arrays become `list<T>`; a pointer
/// to a slice collapses to a `list` of the element's base type. Named types
/// that aren't builtins are kept as-is (they refer to a struct or enum
/// declared alongside).
pub fn thrift_type(go_type: &str) -> anyhow::Result<String> {
    let ty = go_type.trim();

    if let Some(inner) = ty.strip_prefix('*') {
        // `*[]T` is a pointer to a slice: collapse to list<base(T)>.
        if let Some(elem) = inner.strip_prefix("[]") {
            let elem = elem.trim_start_matches('*');
            return Ok(format!("list<{}>", base_type(elem)?));
        }
        return thrift_type(inner);
    }

    if let Some(elem) = ty.strip_prefix("[]") {
        return Ok(format!("list<{}>", thrift_type(elem)?));
    }

    if let Some(rest) = ty.strip_prefix('[') {
        // fixed-size array: [N]T
        let Some((_, elem)) = rest.split_once(']') else {
            bail!("malformed array type `{go_type}`");
        };
        return Ok(format!("list<{}>", thrift_type(elem)?));
    }

    if let Some(rest) = ty.strip_prefix("map[") {
        let Some((key, value)) = split_map(rest) else {
            bail!("malformed map type `{go_type}`");
        };
        return Ok(format!(
            "map<{}, {}>",
            thrift_type(key)?,
            thrift_type(value)?
        ));
    }

    base_type(ty)
}

fn base_type(go_type: &str) -> anyhow::Result<String> {
    let mapped = match go_type {
        "bool" => "bool",
        "int8" | "uint8" | "byte" => "byte",
        "int16" | "uint16" => "i16",
        "int32" | "uint32" => "i32",
        "int" | "int64" | "uint" | "uint64" => "i64",
        "float32" | "float64" => "double",
        "string" => "string",
        named if is_named_type(named) => named,
        other => bail!("unsupported go type `{other}`"),
    };
    Ok(mapped.to_string())
}

fn is_named_type(ty: &str) -> bool {
    !ty.is_empty()
        && ty
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !ty.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Split `K]V` into key and value, honoring nested `[` `]` in the key.
fn split_map(rest: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some((&rest[..i], &rest[i + 1..])),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_mapping() {
        for (go, thrift) in [
            ("bool", "bool"),
            ("int8", "byte"),
            ("uint8", "byte"),
            ("byte", "byte"),
            ("int16", "i16"),
            ("uint16", "i16"),
            ("int32", "i32"),
            ("uint32", "i32"),
            ("int", "i64"),
            ("int64", "i64"),
            ("uint", "i64"),
            ("uint64", "i64"),
            ("float32", "double"),
            ("float64", "double"),
            ("string", "string"),
        ] {
            assert_eq!(thrift_type(go).unwrap(), thrift, "for {go}");
        }
    }

    #[test]
    fn pointers_unwrap_one_level() {
        assert_eq!(thrift_type("*int32").unwrap(), "i32");
        assert_eq!(thrift_type("*User").unwrap(), "User");
    }

    #[test]
    fn slices_and_arrays_become_lists() {
        assert_eq!(thrift_type("[]string").unwrap(), "list<string>");
        assert_eq!(thrift_type("[4]float64").unwrap(), "list<double>");
        assert_eq!(thrift_type("[]*User").unwrap(), "list<User>");
    }

    #[test]
    fn pointer_to_slice_collapses_to_element_base() {
        assert_eq!(thrift_type("*[]int64").unwrap(), "list<i64>");
        assert_eq!(thrift_type("*[]*User").unwrap(), "list<User>");
    }

    #[test]
    fn maps_translate_recursively() {
        assert_eq!(
            thrift_type("map[string]int32").unwrap(),
            "map<string, i32>"
        );
        assert_eq!(
            thrift_type("map[string][]User").unwrap(),
            "map<string, list<User>>"
        );
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(thrift_type("chan int").is_err());
        assert!(thrift_type("func()").is_err());
    }
}

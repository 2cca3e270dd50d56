use super::*;

#[test]
fn test_basic_functions_present() {
    for name in ["print", "pairs", "ipairs", "type", "tostring", "pcall"] {
        assert!(is_function(name), "{name} should be a stdlib function");
    }
}

#[test]
fn test_library_tables_present() {
    for name in ["string", "table", "math", "os", "io", "coroutine"] {
        assert!(is_type(name), "{name} should be a stdlib table");
    }
}

#[test]
fn test_functions_and_types_disjoint() {
    assert!(functions().all(|name| !is_type(name)));
}

#[test]
fn test_user_names_are_unknown() {
    assert!(!is_function("my_helper"));
    assert!(!is_type("config"));
}

#[test]
fn test_table_members() {
    let string = members("string").unwrap();
    assert!(string.contains(&"format"));
    assert!(members("print").is_none());
}

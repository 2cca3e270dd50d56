//! Static registry of Lua 5.4 standard library names. The analyzer consults
//! it to classify globals that are never declared or written anywhere in the
//! workspace.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

#[cfg(test)]
mod registry_test;

/// Free functions of the basic library.
static FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "assert",
        "collectgarbage",
        "dofile",
        "error",
        "getmetatable",
        "ipairs",
        "load",
        "loadfile",
        "next",
        "pairs",
        "pcall",
        "print",
        "rawequal",
        "rawget",
        "rawlen",
        "rawset",
        "require",
        "select",
        "setmetatable",
        "tonumber",
        "tostring",
        "type",
        "xpcall",
    ])
});

/// Library tables, keyed by global name, with the members each exposes.
static TYPES: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        (
            "coroutine",
            [
                "close", "create", "isyieldable", "resume", "running", "status", "wrap", "yield",
            ]
            .as_slice(),
        ),
        (
            "debug",
            [
                "debug",
                "gethook",
                "getinfo",
                "getlocal",
                "getmetatable",
                "getregistry",
                "getupvalue",
                "getuservalue",
                "sethook",
                "setlocal",
                "setmetatable",
                "setupvalue",
                "setuservalue",
                "traceback",
                "upvalueid",
                "upvaluejoin",
            ]
            .as_slice(),
        ),
        (
            "io",
            [
                "close", "flush", "input", "lines", "open", "output", "popen", "read", "stderr",
                "stdin", "stdout", "tmpfile", "type", "write",
            ]
            .as_slice(),
        ),
        (
            "math",
            [
                "abs",
                "acos",
                "asin",
                "atan",
                "ceil",
                "cos",
                "deg",
                "exp",
                "floor",
                "fmod",
                "huge",
                "log",
                "max",
                "maxinteger",
                "min",
                "mininteger",
                "modf",
                "pi",
                "rad",
                "random",
                "randomseed",
                "sin",
                "sqrt",
                "tan",
                "tointeger",
                "type",
                "ult",
            ]
            .as_slice(),
        ),
        (
            "os",
            [
                "clock", "date", "difftime", "execute", "exit", "getenv", "remove", "rename",
                "setlocale", "time", "tmpname",
            ]
            .as_slice(),
        ),
        (
            "package",
            [
                "config",
                "cpath",
                "loaded",
                "loadlib",
                "path",
                "preload",
                "searchers",
                "searchpath",
            ]
            .as_slice(),
        ),
        (
            "string",
            [
                "byte", "char", "dump", "find", "format", "gmatch", "gsub", "len", "lower",
                "match", "pack", "packsize", "rep", "reverse", "sub", "unpack", "upper",
            ]
            .as_slice(),
        ),
        (
            "table",
            ["concat", "insert", "move", "pack", "remove", "sort", "unpack"].as_slice(),
        ),
        (
            "utf8",
            ["char", "charpattern", "codepoint", "codes", "len", "offset"].as_slice(),
        ),
    ])
});

/// Whether `name` is a standard library function like `print` or `pcall`.
pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(name)
}

/// Whether `name` is a standard library table like `string` or `math`.
pub fn is_type(name: &str) -> bool {
    TYPES.contains_key(name)
}

pub fn functions() -> impl Iterator<Item = &'static str> {
    FUNCTIONS.iter().copied()
}

pub fn types() -> impl Iterator<Item = &'static str> {
    TYPES.keys().copied()
}

/// Members of a library table, when `name` is one.
pub fn members(name: &str) -> Option<&'static [&'static str]> {
    TYPES.get(name).copied()
}

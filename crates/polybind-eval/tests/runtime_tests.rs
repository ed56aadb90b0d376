//! Integration tests for the reference binding runtime.
//!
//! Tests validate:
//! - failure detection per convention, carrying the last-error text
//! - temporaries freed on success, native failure and marshaling failure
//! - options packing through a real call (unknown keys ignored)
//! - result conversion: hashtables, structs, struct lists, buffers
//! - the errno codec round trip and fallback

use polybind_catalog::{builtin, Catalog};
use polybind_eval::{
    convert, ErrnoCodec, EvalError, FieldValue, MockLibrary, NativeArg, NativeField,
    NativeRecord, NativeReturn, Options, Runtime, Value,
};
use polybind_types::{Action, ArgKind, OptArgKind, Return, StringKind, Version};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn builtin_catalog() -> Catalog {
    builtin::catalog().expect("builtin catalog is valid")
}

fn no_options() -> Options {
    Options::new()
}

fn options(pairs: &[(&str, Value)]) -> Options {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// An error-only action taking (text, optional text, boolean, string list).
fn touch_catalog() -> Catalog {
    Catalog::new(
        vec![vec![Action::new("touch", Return::Err, Version::new(1, 0, 0))
            .arg("path", ArgKind::String(StringKind::Path))
            .arg("owner", ArgKind::OptString)
            .arg("force", ArgKind::Bool)
            .arg("tags", ArgKind::StringList)]],
        vec![],
    )
    .unwrap()
}

fn touch_args() -> Vec<Value> {
    vec![
        Value::str("/etc/motd"),
        Value::OptStr(None),
        Value::Bool(true),
        Value::str_list(&["a", "b"]),
    ]
}

fn statns_record(ino: i64) -> NativeRecord {
    NativeRecord::new((0..16).map(|i| NativeField::Int64(if i == 1 { ino } else { i })).collect())
}

// ══════════════════════════════════════════════════════════════════════════════
// Failure conventions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn integer_sentinel_raises_with_last_error_and_frees_temporaries() {
    let catalog = touch_catalog();
    let lib = MockLibrary::new().fail("guestfs_touch", NativeReturn::Int(-1), "touch: EACCES");
    let mut rt = Runtime::new(&catalog, lib);

    let err = rt.call("touch", &touch_args(), &no_options()).unwrap_err();
    assert_eq!(
        err,
        EvalError::Native {
            action: "touch".into(),
            message: "touch: EACCES".into()
        }
    );

    let call = rt.library().last_call().unwrap();
    assert_eq!(call.args[1], NativeArg::OptText(None));
    assert_eq!(call.args[2], NativeArg::Int32(1));
    assert_eq!(call.arrays, vec![vec!["a".to_string(), "b".to_string()]]);
    assert_eq!(call.live_arrays, 1);
    assert_eq!(rt.heap().allocations(), 1);
    assert_eq!(rt.heap().live(), 0);
}

#[test]
fn success_also_frees_temporaries() {
    let catalog = touch_catalog();
    let mut rt = Runtime::new(&catalog, MockLibrary::new());
    assert_eq!(rt.call("touch", &touch_args(), &no_options()).unwrap(), Value::Unit);
    assert_eq!(rt.heap().live(), 0);
}

#[test]
fn marshaling_failure_frees_and_never_calls() {
    let catalog = builtin_catalog();
    let mut rt = Runtime::new(&catalog, MockLibrary::new());

    // `server` (bit 6) is allocated before `blocksize` (bit 12) is rejected.
    let err = rt
        .call(
            "add_drive",
            &[Value::str("disk.img")],
            &options(&[
                ("server", Value::str_list(&["nbd://a"])),
                ("blocksize", Value::str("4096")),
            ]),
        )
        .unwrap_err();
    assert!(matches!(err, EvalError::ArgType { ref arg, .. } if arg == "blocksize"), "{err}");

    let catalog = touch_catalog();
    let mut touch = Runtime::new(&catalog, MockLibrary::new());
    let bad = vec![
        Value::str("/etc/motd"),
        Value::OptStr(None),
        Value::Int(3),
        Value::str_list(&["x"]),
    ];
    assert!(touch.call("touch", &bad, &no_options()).is_err());

    assert!(rt.library().calls().is_empty());
    assert_eq!(rt.heap().allocations(), 1);
    assert_eq!(rt.heap().live(), 0);
    assert!(touch.library().calls().is_empty());
    assert_eq!(touch.heap().live(), 0);
}

#[test]
fn pointer_sentinel_and_no_signal() {
    let catalog = builtin_catalog();
    let lib = MockLibrary::new()
        .fail("guestfs_cat", NativeReturn::Text(None), "cat: No such file")
        .respond("guestfs_internal_test_rconstoptstring", NativeReturn::Text(None));
    let mut rt = Runtime::new(&catalog, lib);

    let err = rt.call("cat", &[Value::str("/missing")], &no_options()).unwrap_err();
    assert!(matches!(err, EvalError::Native { ref message, .. } if message == "cat: No such file"));

    // A null optional string is a value, not a failure.
    let v = rt
        .call("internal_test_rconstoptstring", &[Value::str("x")], &no_options())
        .unwrap();
    assert_eq!(v, Value::OptStr(None));
}

#[test]
fn int64_error_return() {
    let catalog = builtin_catalog();
    let lib = MockLibrary::new().fail(
        "guestfs_internal_test_rint64err",
        NativeReturn::Int(-1),
        "error",
    );
    let mut rt = Runtime::new(&catalog, lib);
    assert!(rt.call("internal_test_rint64err", &[], &no_options()).is_err());
}

// ══════════════════════════════════════════════════════════════════════════════
// Options
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn options_reach_the_argv_entry_point() {
    let catalog = builtin_catalog();
    let mut rt = Runtime::new(&catalog, MockLibrary::new());
    rt.call(
        "add_drive",
        &[Value::str("disk.img")],
        &options(&[
            ("format", Value::str("qcow2")),
            ("server", Value::str_list(&["nbd://a", "nbd://b"])),
            ("no_such_option", Value::Bool(true)),
        ]),
    )
    .unwrap();

    let call = rt.library().last_call().unwrap();
    assert_eq!(call.entry, "guestfs_add_drive_argv");
    let packed = call.optargs.as_ref().unwrap();
    assert_eq!(packed.bitmask, (1 << 1) | (1 << 6));
    assert_eq!(packed.field("readonly"), Some(&NativeArg::Int32(0)));
    assert_eq!(packed.field("blocksize"), Some(&NativeArg::Int32(0)));
    assert_eq!(packed.field("format"), Some(&NativeArg::Text("qcow2".into())));
    assert_eq!(call.arrays, vec![vec!["nbd://a".to_string(), "nbd://b".to_string()]]);
    assert_eq!(rt.heap().live(), 0);
}

#[test]
fn options_only_action() {
    let catalog = builtin_catalog();
    let mut rt = Runtime::new(&catalog, MockLibrary::new());
    rt.call("internal_test_only_optargs", &[], &no_options()).unwrap();
    let call = rt.library().last_call().unwrap();
    assert_eq!(call.entry, "guestfs_internal_test_only_optargs_argv");
    assert_eq!(call.optargs.as_ref().unwrap().bitmask, 0);
}

#[test]
fn actions_without_options_take_the_plain_entry_point() {
    let catalog = builtin_catalog();
    let mut rt = Runtime::new(&catalog, MockLibrary::new()).with_prefix("xyz");
    rt.call("mount", &[Value::str("/dev/sda1"), Value::str("/")], &no_options())
        .unwrap();
    let call = rt.library().last_call().unwrap();
    assert_eq!(call.entry, "xyz_mount");
    assert!(call.optargs.is_none());
}

// ══════════════════════════════════════════════════════════════════════════════
// Results
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn hashtable_becomes_ordered_pairs() {
    let catalog = builtin_catalog();
    let flat = ["k1", "v1", "k2", "v2"].map(String::from).to_vec();
    let lib = MockLibrary::new().respond(
        "guestfs_internal_test_rhashtable",
        NativeReturn::TextArray(Some(flat)),
    );
    let mut rt = Runtime::new(&catalog, lib);
    let v = rt
        .call("internal_test_rhashtable", &[Value::str("x")], &no_options())
        .unwrap();
    assert_eq!(
        v,
        Value::Pairs(vec![
            ("k1".into(), "v1".into()),
            ("k2".into(), "v2".into()),
        ])
    );
}

#[test]
fn one_element_list_equals_wrapped_singleton() {
    let catalog = builtin_catalog();
    let def = catalog.find_struct("statns").unwrap();
    let raw = statns_record(42);

    let single = convert::record(def, &raw).unwrap();
    let list = convert::records(def, std::slice::from_ref(&raw)).unwrap();
    assert_eq!(list, vec![single.clone()]);
    assert_eq!(single.get("st_ino"), Some(&FieldValue::Int64(42)));
}

#[test]
fn struct_list_preserves_native_order() {
    let catalog = builtin_catalog();
    let lib = MockLibrary::new().respond(
        "guestfs_lstatnslist",
        NativeReturn::Records(Some(vec![statns_record(3), statns_record(1), statns_record(2)])),
    );
    let mut rt = Runtime::new(&catalog, lib);
    let v = rt
        .call(
            "lstatnslist",
            &[Value::str("/"), Value::str_list(&["c", "a", "b"])],
            &no_options(),
        )
        .unwrap();
    let Value::StructList(items) = v else {
        panic!("expected a struct list, got {v:?}");
    };
    let inos: Vec<_> = items.iter().map(|s| s.get("st_ino").cloned()).collect();
    assert_eq!(
        inos,
        vec![
            Some(FieldValue::Int64(3)),
            Some(FieldValue::Int64(1)),
            Some(FieldValue::Int64(2)),
        ]
    );
    assert_eq!(rt.heap().live(), 0);
}

#[test]
fn buffer_out_keeps_embedded_nuls() {
    let catalog = builtin_catalog();
    let lib = MockLibrary::new().respond(
        "guestfs_read_file",
        NativeReturn::Buffer(Some(vec![0, 1, 0, 2])),
    );
    let mut rt = Runtime::new(&catalog, lib);
    let v = rt.call("read_file", &[Value::str("/bin")], &no_options()).unwrap();
    assert_eq!(v, Value::Bytes(vec![0, 1, 0, 2]));
}

#[test]
fn converted_struct_serializes_in_field_order() {
    let catalog = builtin_catalog();
    let def = catalog.find_struct("int_bool").unwrap();
    let raw = NativeRecord::new(vec![NativeField::Int32(7), NativeField::Int32(1)]);
    let v = convert::record(def, &raw).unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["name"], "int_bool");
    assert_eq!(json["fields"][0][0], "i");
    assert_eq!(json["fields"][0][1]["value"], 7);
    assert_eq!(json["fields"][1][0], "b");
}

#[test]
fn shape_mismatch_is_a_conversion_error() {
    let catalog = builtin_catalog();
    let lib = MockLibrary::new().respond("guestfs_cat", NativeReturn::Int(3));
    let mut rt = Runtime::new(&catalog, lib);
    let err = rt.call("cat", &[Value::str("/x")], &no_options()).unwrap_err();
    assert!(matches!(err, EvalError::Conversion(_)));
}

// ══════════════════════════════════════════════════════════════════════════════
// Binding surface
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unknown_internal_and_miscounted_calls() {
    let catalog = builtin_catalog();
    let mut rt = Runtime::new(&catalog, MockLibrary::new());
    assert!(matches!(
        rt.call("no_such_action", &[], &no_options()),
        Err(EvalError::UnknownAction(_))
    ));
    assert!(matches!(
        rt.call("internal_free_cache", &[], &no_options()),
        Err(EvalError::NotBound(_))
    ));
    assert!(matches!(
        rt.call("mount", &[Value::str("/dev/sda1")], &no_options()),
        Err(EvalError::ArgCount {
            expected: 2,
            got: 1,
            ..
        })
    ));
}

#[test]
fn pointers_pass_through() {
    let catalog = builtin_catalog();
    let mut rt = Runtime::new(&catalog, MockLibrary::new());
    rt.call("internal_test_pointer", &[Value::Pointer(0xdead_beef)], &no_options())
        .unwrap();
    assert_eq!(
        rt.library().last_call().unwrap().args,
        vec![NativeArg::Pointer(0xdead_beef)]
    );
}

#[test]
fn every_self_test_action_round_trips_with_defaults() {
    let catalog = builtin_catalog();
    let action = catalog.find("internal_test").unwrap();
    let args: Vec<Value> = action
        .args
        .iter()
        .map(|a| match &a.kind {
            ArgKind::String(_) => Value::str("s"),
            ArgKind::OptString => Value::OptStr(Some("o".into())),
            ArgKind::StringList | ArgKind::DeviceList => Value::str_list(&["l"]),
            ArgKind::BufferIn => Value::Bytes(vec![1, 2, 3]),
            ArgKind::Bool => Value::Bool(false),
            ArgKind::Int | ArgKind::Int64 => Value::Int(-5),
            ArgKind::Pointer(_) => Value::Pointer(1),
        })
        .collect();
    let opts = options(&[
        ("obool", Value::Bool(true)),
        ("oint64", Value::Int(1 << 40)),
        ("ostringlist", Value::str_list(&["x", "y"])),
    ]);
    let mut rt = Runtime::new(&catalog, MockLibrary::new());
    rt.call("internal_test", &args, &opts).unwrap();

    let packed = rt.library().last_call().unwrap().optargs.clone().unwrap();
    let bits: Vec<u8> = action
        .optargs
        .iter()
        .filter(|o| matches!(o.kind, OptArgKind::Bool | OptArgKind::Int64 | OptArgKind::StringList))
        .map(|o| o.bit)
        .collect();
    for bit in bits {
        assert!(packed.is_set(bit), "bit {bit}");
    }
    assert_eq!(packed.field("oint64"), Some(&NativeArg::Int64(1 << 40)));
    assert_eq!(rt.heap().live(), 0);
}

// ══════════════════════════════════════════════════════════════════════════════
// Errno codec
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn errno_round_trip() {
    let codec = ErrnoCodec::linux().unwrap();
    let mut n = 0;
    for code in codec.codes() {
        assert_eq!(codec.string_to_errno(codec.errno_to_string(code)), code);
        n += 1;
    }
    assert!(n > 100);
}

#[test]
fn errno_fallbacks() {
    let codec = ErrnoCodec::linux().unwrap();
    assert_eq!(codec.string_to_errno("ENOTANERRNO"), 22);
    assert_eq!(codec.string_to_errno(""), 22);
    assert_eq!(codec.errno_to_string(9999), "EINVAL");
    assert_eq!(codec.errno_to_string(-3), "EINVAL");
    assert_eq!(codec.errno_to_string(41), "EINVAL");
}

#[test]
#[should_panic(expected = "errnum is 0")]
fn errno_zero_aborts() {
    let codec = ErrnoCodec::linux().unwrap();
    let _ = codec.errno_to_string(0);
}

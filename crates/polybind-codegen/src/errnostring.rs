//! Errno ↔ string codec generator.
//!
//! Produces three C artifacts:
//!
//! - `errnostring.h`: prototypes and the fallback code.
//! - `errnostring.c`: a forward table indexed by errno value with one
//!   `#ifdef`-guarded entry per symbol, the forward lookup, and the reverse
//!   wrapper.
//! - `errnostring-hash.c`: the reverse perfect-hash table built here.
//!
//! The symbol table is validated before anything is generated; an invalid
//! table produces no output at all.

use polybind_types::is_identifier;
use tracing::debug;

use crate::buffer::{Artifact, SourceBuf, GENERATED_MARKER};
use crate::error::{CodegenError, CodegenResult};
use crate::perfect_hash::PerfectHash;

/// Code returned for any name the reverse lookup does not recognise, and
/// name returned for any code the forward lookup has no entry for.
pub const FALLBACK: &str = "EINVAL";

/// Longest accepted symbol.
pub const MAX_SYMBOL_LEN: usize = 32;

/// Canonical errno symbols, in ascending byte order.
pub const ERRNOS: &[&str] = &[
    "E2BIG", "EACCES", "EADDRINUSE", "EADDRNOTAVAIL", "EADV", "EAFNOSUPPORT", "EAGAIN",
    "EALREADY", "EBADE", "EBADF", "EBADFD", "EBADMSG", "EBADR", "EBADRQC", "EBADSLT", "EBFONT",
    "EBUSY", "ECANCELED", "ECHILD", "ECHRNG", "ECOMM", "ECONNABORTED", "ECONNREFUSED",
    "ECONNRESET", "EDEADLK", "EDEADLOCK", "EDESTADDRREQ", "EDOM", "EDOTDOT", "EDQUOT", "EEXIST",
    "EFAULT", "EFBIG", "EHOSTDOWN", "EHOSTUNREACH", "EHWPOISON", "EIDRM", "EILSEQ",
    "EINPROGRESS", "EINTR", "EINVAL", "EIO", "EISCONN", "EISDIR", "EISNAM", "EKEYEXPIRED",
    "EKEYREJECTED", "EKEYREVOKED", "EL2HLT", "EL2NSYNC", "EL3HLT", "EL3RST", "ELIBACC",
    "ELIBBAD", "ELIBEXEC", "ELIBMAX", "ELIBSCN", "ELNRNG", "ELOOP", "EMEDIUMTYPE", "EMFILE",
    "EMLINK", "EMSGSIZE", "EMULTIHOP", "ENAMETOOLONG", "ENAVAIL", "ENETDOWN", "ENETRESET",
    "ENETUNREACH", "ENFILE", "ENOANO", "ENOBUFS", "ENOCSI", "ENODATA", "ENODEV", "ENOENT",
    "ENOEXEC", "ENOKEY", "ENOLCK", "ENOLINK", "ENOMEDIUM", "ENOMEM", "ENOMSG", "ENONET",
    "ENOPKG", "ENOPROTOOPT", "ENOSPC", "ENOSR", "ENOSTR", "ENOSYS", "ENOTBLK", "ENOTCONN",
    "ENOTDIR", "ENOTEMPTY", "ENOTNAM", "ENOTRECOVERABLE", "ENOTSOCK", "ENOTSUP", "ENOTTY",
    "ENOTUNIQ", "ENXIO", "EOPNOTSUPP", "EOVERFLOW", "EOWNERDEAD", "EPERM", "EPFNOSUPPORT",
    "EPIPE", "EPROTO", "EPROTONOSUPPORT", "EPROTOTYPE", "ERANGE", "EREMCHG", "EREMOTE",
    "EREMOTEIO", "ERESTART", "ERFKILL", "EROFS", "ESHUTDOWN", "ESOCKTNOSUPPORT", "ESPIPE",
    "ESRCH", "ESRMNT", "ESTALE", "ESTRPIPE", "ETIME", "ETIMEDOUT", "ETOOMANYREFS", "ETXTBSY",
    "EUCLEAN", "EUNATCH", "EUSERS", "EWOULDBLOCK", "EXDEV", "EXFULL",
];

// ══════════════════════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════════════════════

/// Check shape, order and uniqueness of a symbol table.
pub fn validate(symbols: &[&str]) -> CodegenResult<()> {
    for &s in symbols {
        let reason = if s.is_empty() {
            Some("empty")
        } else if s.len() > MAX_SYMBOL_LEN {
            Some("longer than 32 characters")
        } else if !s.starts_with('E') {
            Some("does not start with E")
        } else if !s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            Some("not entirely upper-case")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(CodegenError::ErrnoInvalid {
                name: s.to_string(),
                reason,
            });
        }
    }
    for pair in symbols.windows(2) {
        match pair[0].cmp(pair[1]) {
            std::cmp::Ordering::Less => {}
            std::cmp::Ordering::Equal => {
                return Err(CodegenError::ErrnoDuplicate(pair[0].to_string()))
            }
            std::cmp::Ordering::Greater => {
                return Err(CodegenError::ErrnoUnsorted {
                    before: pair[0].to_string(),
                    after: pair[1].to_string(),
                })
            }
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Generation
// ══════════════════════════════════════════════════════════════════════════════

/// Validate `symbols` and generate the three codec files under
/// `errnostring/`. Exported functions are named `<prefix>_int_...`.
pub fn generate(prefix: &str, symbols: &[&str]) -> CodegenResult<Vec<Artifact>> {
    validate(symbols)?;
    if !is_identifier(prefix) {
        return Err(CodegenError::Internal(format!("bad prefix {prefix:?}")));
    }
    let hash = PerfectHash::build(symbols)?;
    debug!(
        symbols = symbols.len(),
        slots = hash.slots().len(),
        "errno perfect hash built"
    );
    Ok(vec![
        Artifact::new("errnostring/errnostring.h", header(prefix)),
        Artifact::new("errnostring/errnostring.c", forward(prefix, symbols)),
        Artifact::new("errnostring/errnostring-hash.c", reverse(prefix, &hash)),
    ])
}

fn marker(b: &mut SourceBuf) {
    b.line(format!("/* {GENERATED_MARKER} */"));
    b.blank();
}

fn header(prefix: &str) -> String {
    let guard = format!("{}_ERRNOSTRING_H", prefix.to_ascii_uppercase());
    let mut b = SourceBuf::new("  ");
    marker(&mut b);
    b.line(format!("#ifndef {guard}"));
    b.line(format!("#define {guard}"));
    b.blank();
    b.line("#include <stddef.h>");
    b.line("#include <errno.h>");
    b.blank();
    b.line(format!("#define ERRNO_FALLBACK {FALLBACK}"));
    b.blank();
    b.line("struct errnostring_entry {");
    b.line("  const char *name;");
    b.line("  int errnum;");
    b.line("};");
    b.blank();
    b.line("/* Aborts if errnum is 0. Returns \"EINVAL\" for unknown codes. */");
    b.line(format!("extern const char *{prefix}_int_errno_to_string (int errnum);"));
    b.blank();
    b.line("/* Returns ERRNO_FALLBACK for unknown names. */");
    b.line(format!("extern int {prefix}_int_string_to_errno (const char *errnostr);"));
    b.blank();
    b.line(format!(
        "extern const struct errnostring_entry *{prefix}_int_string_to_errno_lookup (const char *str, size_t len);"
    ));
    b.blank();
    b.line(format!("#endif /* {guard} */"));
    b.into_string()
}

fn forward(prefix: &str, symbols: &[&str]) -> String {
    let mut b = SourceBuf::new("  ");
    marker(&mut b);
    b.line("#include <stdlib.h>");
    b.line("#include <string.h>");
    b.line("#include <errno.h>");
    b.blank();
    b.line("#include \"errnostring.h\"");
    b.blank();
    b.line("static const char *const errno_to_string[] = {");
    for s in symbols {
        b.line(format!("#ifdef {s}"));
        b.line(format!("  [{s}] = \"{s}\","));
        b.line("#endif");
    }
    b.line("};");
    b.blank();
    b.line("#define ERRNO_TO_STRING_SIZE \\");
    b.line("  (sizeof errno_to_string / sizeof errno_to_string[0])");
    b.blank();
    b.line("const char *");
    b.line(format!("{prefix}_int_errno_to_string (int errnum)"));
    b.line("{");
    b.indent();
    b.line("if (errnum == 0)");
    b.line("  abort ();");
    b.line("if (errnum < 0 || (size_t) errnum >= ERRNO_TO_STRING_SIZE ||");
    b.line("    errno_to_string[errnum] == NULL)");
    b.line(format!("  return \"{FALLBACK}\";"));
    b.line("return errno_to_string[errnum];");
    b.dedent();
    b.line("}");
    b.blank();
    b.line("int");
    b.line(format!("{prefix}_int_string_to_errno (const char *errnostr)"));
    b.line("{");
    b.indent();
    b.line("const struct errnostring_entry *v;");
    b.blank();
    b.line(format!(
        "v = {prefix}_int_string_to_errno_lookup (errnostr, strlen (errnostr));"
    ));
    b.line("/* errnum 0: the symbol does not exist on this platform */");
    b.line("if (v == NULL || v->errnum == 0)");
    b.line("  return ERRNO_FALLBACK;");
    b.line("return v->errnum;");
    b.dedent();
    b.line("}");
    b.into_string()
}

fn reverse(prefix: &str, hash: &PerfectHash) -> String {
    let mut b = SourceBuf::new("  ");
    marker(&mut b);
    b.line("#include <stdint.h>");
    b.line("#include <stdlib.h>");
    b.line("#include <string.h>");
    b.line("#include <errno.h>");
    b.blank();
    b.line("#include \"errnostring.h\"");
    b.blank();
    for key in hash.keys() {
        b.line(format!("#ifdef {key}"));
        b.line(format!("#define ERRNOSTRING_{key} {key}"));
        b.line("#else");
        b.line(format!("#define ERRNOSTRING_{key} 0"));
        b.line("#endif");
    }
    b.blank();
    b.line(format!("#define NR_BUCKETS {}", hash.seeds().len()));
    b.line(format!("#define NR_SLOTS {}", hash.slots().len()));
    b.blank();
    b.line("static const uint32_t seeds[NR_BUCKETS] = {");
    for chunk in hash.seeds().chunks(8) {
        let row: Vec<String> = chunk.iter().map(|s| format!("{s}u")).collect();
        b.line(format!("  {},", row.join(", ")));
    }
    b.line("};");
    b.blank();
    b.line("static const struct errnostring_entry slots[NR_SLOTS] = {");
    for slot in hash.slots() {
        match slot {
            Some(i) => {
                let key = &hash.keys()[*i];
                b.line(format!("  {{ \"{key}\", ERRNOSTRING_{key} }},"));
            }
            None => b.line("  { NULL, 0 },"),
        }
    }
    b.line("};");
    b.blank();
    b.line("static uint32_t");
    b.line("hash (uint32_t seed, const char *str, size_t len)");
    b.line("{");
    b.indent();
    b.line("uint32_t h = UINT32_C(0x811c9dc5) ^ seed;");
    b.line("size_t i;");
    b.blank();
    b.line("for (i = 0; i < len; ++i) {");
    b.line("  h ^= (unsigned char) str[i];");
    b.line("  h *= UINT32_C(0x01000193);");
    b.line("}");
    b.line("return h;");
    b.dedent();
    b.line("}");
    b.blank();
    b.line("const struct errnostring_entry *");
    b.line(format!(
        "{prefix}_int_string_to_errno_lookup (const char *str, size_t len)"
    ));
    b.line("{");
    b.indent();
    b.line("uint32_t seed = seeds[hash (0, str, len) % NR_BUCKETS];");
    b.line("const struct errnostring_entry *e = &slots[hash (seed, str, len) % NR_SLOTS];");
    b.blank();
    b.line("if (e->name == NULL || strlen (e->name) != len ||");
    b.line("    memcmp (e->name, str, len) != 0)");
    b.line("  return NULL;");
    b.line("return e;");
    b.dedent();
    b.line("}");
    b.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        validate(ERRNOS).unwrap();
        assert!(ERRNOS.contains(&FALLBACK));
    }

    #[test]
    fn rejects_unsorted() {
        assert!(matches!(
            validate(&["EPERM", "EACCES"]),
            Err(CodegenError::ErrnoUnsorted { .. })
        ));
    }

    #[test]
    fn rejects_duplicates() {
        assert!(matches!(
            validate(&["EIO", "EIO"]),
            Err(CodegenError::ErrnoDuplicate(s)) if s == "EIO"
        ));
    }

    #[test]
    fn rejects_bad_shapes() {
        let long = format!("E{}", "X".repeat(32));
        for bad in ["", "PERM", "Eperm", "E-IO", long.as_str()] {
            assert!(
                matches!(validate(&[bad]), Err(CodegenError::ErrnoInvalid { .. })),
                "{bad:?} accepted"
            );
        }
        validate(&["E2BIG"]).unwrap();
    }

    #[test]
    fn invalid_table_produces_nothing() {
        assert!(generate("guestfs", &["EPERM", "EIO"]).is_err());
    }

    #[test]
    fn three_artifacts() {
        let files = generate("guestfs", ERRNOS).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|a| a.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "errnostring/errnostring.h",
                "errnostring/errnostring.c",
                "errnostring/errnostring-hash.c",
            ]
        );
        for f in &files {
            assert!(f.contents.contains(GENERATED_MARKER));
        }
    }

    #[test]
    fn forward_table_is_guarded_per_symbol() {
        let files = generate("guestfs", &["EIO", "ENOENT", "EPERM"]).unwrap();
        let c = &files[1].contents;
        assert!(c.contains("#ifdef ENOENT\n  [ENOENT] = \"ENOENT\",\n#endif\n"));
        assert!(c.contains("if (errnum == 0)\n    abort ();"));
        assert!(c.contains("return \"EINVAL\";"));
        assert!(c.contains("guestfs_int_string_to_errno (const char *errnostr)"));
    }

    #[test]
    fn hash_table_matches_builder() {
        let files = generate("guestfs", ERRNOS).unwrap();
        let c = &files[2].contents;
        let hash = PerfectHash::build(ERRNOS).unwrap();
        assert!(c.contains(&format!("#define NR_SLOTS {}", hash.slots().len())));
        assert!(c.contains("{ \"EPERM\", ERRNOSTRING_EPERM },"));
        let entries = c.lines().filter(|l| l.starts_with("  { ")).count();
        assert_eq!(entries, hash.slots().len());
    }
}

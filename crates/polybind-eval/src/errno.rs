//! In-process mirror of the generated errno codec.
//!
//! Built from the same validated symbol table and the same perfect hash the
//! generator writes out, over an explicit platform table (symbol → code).
//! A symbol the platform does not define has no forward entry and reverse
//! maps it to code 0, which the wrapper turns into the fallback.

use std::collections::{BTreeMap, HashMap};

use polybind_codegen::errnostring::{validate, ERRNOS, FALLBACK};
use polybind_codegen::PerfectHash;

use crate::error::{EvalError, EvalResult};

/// Linux (generic ABI) errno values.
pub const LINUX: &[(&str, i32)] = &[
    ("EPERM", 1), ("ENOENT", 2), ("ESRCH", 3), ("EINTR", 4), ("EIO", 5), ("ENXIO", 6),
    ("E2BIG", 7), ("ENOEXEC", 8), ("EBADF", 9), ("ECHILD", 10), ("EAGAIN", 11),
    ("ENOMEM", 12), ("EACCES", 13), ("EFAULT", 14), ("ENOTBLK", 15), ("EBUSY", 16),
    ("EEXIST", 17), ("EXDEV", 18), ("ENODEV", 19), ("ENOTDIR", 20), ("EISDIR", 21),
    ("EINVAL", 22), ("ENFILE", 23), ("EMFILE", 24), ("ENOTTY", 25), ("ETXTBSY", 26),
    ("EFBIG", 27), ("ENOSPC", 28), ("ESPIPE", 29), ("EROFS", 30), ("EMLINK", 31),
    ("EPIPE", 32), ("EDOM", 33), ("ERANGE", 34), ("EDEADLK", 35), ("ENAMETOOLONG", 36),
    ("ENOLCK", 37), ("ENOSYS", 38), ("ENOTEMPTY", 39), ("ELOOP", 40), ("EWOULDBLOCK", 11),
    ("ENOMSG", 42), ("EIDRM", 43), ("ECHRNG", 44), ("EL2NSYNC", 45), ("EL3HLT", 46),
    ("EL3RST", 47), ("ELNRNG", 48), ("EUNATCH", 49), ("ENOCSI", 50), ("EL2HLT", 51),
    ("EBADE", 52), ("EBADR", 53), ("EXFULL", 54), ("ENOANO", 55), ("EBADRQC", 56),
    ("EBADSLT", 57), ("EDEADLOCK", 35), ("EBFONT", 59), ("ENOSTR", 60), ("ENODATA", 61),
    ("ETIME", 62), ("ENOSR", 63), ("ENONET", 64), ("ENOPKG", 65), ("EREMOTE", 66),
    ("ENOLINK", 67), ("EADV", 68), ("ESRMNT", 69), ("ECOMM", 70), ("EPROTO", 71),
    ("EMULTIHOP", 72), ("EDOTDOT", 73), ("EBADMSG", 74), ("EOVERFLOW", 75),
    ("ENOTUNIQ", 76), ("EBADFD", 77), ("EREMCHG", 78), ("ELIBACC", 79), ("ELIBBAD", 80),
    ("ELIBSCN", 81), ("ELIBMAX", 82), ("ELIBEXEC", 83), ("EILSEQ", 84), ("ERESTART", 85),
    ("ESTRPIPE", 86), ("EUSERS", 87), ("ENOTSOCK", 88), ("EDESTADDRREQ", 89),
    ("EMSGSIZE", 90), ("EPROTOTYPE", 91), ("ENOPROTOOPT", 92), ("EPROTONOSUPPORT", 93),
    ("ESOCKTNOSUPPORT", 94), ("EOPNOTSUPP", 95), ("ENOTSUP", 95), ("EPFNOSUPPORT", 96),
    ("EAFNOSUPPORT", 97), ("EADDRINUSE", 98), ("EADDRNOTAVAIL", 99), ("ENETDOWN", 100),
    ("ENETUNREACH", 101), ("ENETRESET", 102), ("ECONNABORTED", 103), ("ECONNRESET", 104),
    ("ENOBUFS", 105), ("EISCONN", 106), ("ENOTCONN", 107), ("ESHUTDOWN", 108),
    ("ETOOMANYREFS", 109), ("ETIMEDOUT", 110), ("ECONNREFUSED", 111), ("EHOSTDOWN", 112),
    ("EHOSTUNREACH", 113), ("EALREADY", 114), ("EINPROGRESS", 115), ("ESTALE", 116),
    ("EUCLEAN", 117), ("ENOTNAM", 118), ("ENAVAIL", 119), ("EISNAM", 120),
    ("EREMOTEIO", 121), ("EDQUOT", 122), ("ENOMEDIUM", 123), ("EMEDIUMTYPE", 124),
    ("ECANCELED", 125), ("ENOKEY", 126), ("EKEYEXPIRED", 127), ("EKEYREVOKED", 128),
    ("EKEYREJECTED", 129), ("EOWNERDEAD", 130), ("ENOTRECOVERABLE", 131), ("ERFKILL", 132),
    ("EHWPOISON", 133),
];

/// Forward and reverse errno lookup.
#[derive(Debug, Clone)]
pub struct ErrnoCodec {
    forward: BTreeMap<i32, String>,
    hash: PerfectHash,
    /// Platform code of each hash key, 0 where undefined.
    codes: Vec<i32>,
    fallback: i32,
}

impl ErrnoCodec {
    /// Build over `symbols`, which must pass the generator's validation.
    pub fn new(symbols: &[&str], platform: &[(&str, i32)]) -> EvalResult<Self> {
        validate(symbols).map_err(|e| EvalError::Codec(e.to_string()))?;
        let hash = PerfectHash::build(symbols).map_err(|e| EvalError::Codec(e.to_string()))?;
        let defined: HashMap<&str, i32> = platform.iter().copied().collect();

        // Aliases share a code; the later symbol wins, as with repeated
        // designated initializers.
        let mut forward = BTreeMap::new();
        for s in symbols {
            if let Some(&code) = defined.get(s) {
                forward.insert(code, s.to_string());
            }
        }
        let codes = symbols
            .iter()
            .map(|s| defined.get(s).copied().unwrap_or(0))
            .collect();
        let fallback = defined
            .get(FALLBACK)
            .copied()
            .ok_or_else(|| EvalError::Codec(format!("platform does not define {FALLBACK}")))?;
        Ok(Self {
            forward,
            hash,
            codes,
            fallback,
        })
    }

    /// The full symbol table over [`LINUX`].
    pub fn linux() -> EvalResult<Self> {
        Self::new(ERRNOS, LINUX)
    }

    /// Name of `errnum`, or the fallback name if there is none.
    ///
    /// # Panics
    ///
    /// On `errnum == 0`, which means "no error" and is never looked up.
    pub fn errno_to_string(&self, errnum: i32) -> &str {
        assert!(errnum != 0, "errno_to_string: errnum is 0");
        self.forward.get(&errnum).map_or(FALLBACK, String::as_str)
    }

    /// Code of `name`, or the fallback code for anything unrecognised.
    pub fn string_to_errno(&self, name: &str) -> i32 {
        match self.hash.lookup(name).and_then(|i| self.codes.get(i).copied()) {
            Some(code) if code != 0 => code,
            _ => self.fallback,
        }
    }

    /// Every code with a forward entry, ascending.
    pub fn codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.forward.keys().copied()
    }

    pub fn fallback(&self) -> i32 {
        self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_symbol_is_defined_on_linux() {
        let defined: Vec<&str> = LINUX.iter().map(|(s, _)| *s).collect();
        for s in ERRNOS {
            assert!(defined.contains(s), "{s}");
        }
    }

    #[test]
    fn aliases_resolve_to_the_later_symbol() {
        let codec = ErrnoCodec::linux().unwrap();
        assert_eq!(codec.errno_to_string(11), "EWOULDBLOCK");
        assert_eq!(codec.string_to_errno("EAGAIN"), 11);
        assert_eq!(codec.string_to_errno("EWOULDBLOCK"), 11);
    }

    #[test]
    fn undefined_on_platform() {
        let codec = ErrnoCodec::new(&["EINVAL", "EIO", "EPERM"], &[("EINVAL", 22), ("EPERM", 1)])
            .unwrap();
        assert_eq!(codec.string_to_errno("EIO"), 22);
        assert_eq!(codec.string_to_errno("EPERM"), 1);
        assert_eq!(codec.codes().collect::<Vec<_>>(), vec![1, 22]);
    }

    #[test]
    fn rejects_invalid_tables() {
        assert!(ErrnoCodec::new(&["EPERM", "EIO"], LINUX).is_err());
        assert!(ErrnoCodec::new(&["EIO"], &[("EIO", 5)]).is_err());
    }
}

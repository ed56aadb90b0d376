//! Concrete output surfaces.

mod golang;
mod lua;
mod rust;

pub use golang::GoTarget;
pub use lua::LuaTarget;
pub use rust::RustTarget;

use crate::target::Target;

/// Names accepted by [`by_name`], in emission order.
pub const ALL: &[&str] = &["rust", "go", "lua"];

/// Look up a target by its configuration name.
pub fn by_name(name: &str) -> Option<Box<dyn Target>> {
    match name {
        "rust" => Some(Box::new(RustTarget)),
        "go" => Some(Box::new(GoTarget)),
        "lua" => Some(Box::new(LuaTarget)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in ALL {
            let t = by_name(name).unwrap();
            assert_eq!(t.name(), *name);
        }
        assert!(by_name("ocaml").is_none());
    }
}

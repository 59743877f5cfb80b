//! Fresh-name generation shared by the desugarer (variable names) and the
//! type checker (unification variables). Spec §4.3: counter-based, `$`
//! prefix, syntactically forbidden in source identifiers so collision is
//! impossible.

use std::sync::atomic::{AtomicU64, Ordering};

pub struct FreshNames {
    prefix: &'static str,
    next: AtomicU64,
}

impl FreshNames {
    pub const fn new(prefix: &'static str) -> Self {
        FreshNames {
            prefix,
            next: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("${}{n}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_names_are_unique_and_prefixed() {
        let gen = FreshNames::new("d");
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert!(a.starts_with("$d"));
        assert!(b.starts_with("$d"));
    }
}

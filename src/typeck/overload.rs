//! External overload resolution (spec §4.4.5): several `external` items may
//! share a name; the checker picks the declaration whose arity matches the
//! call site. A partial application fixes the overload at the arity it was
//! given, same as any other curried call.

use crate::span::Span;
use crate::typeck::env::ExternalSig;
use crate::typeck::error::TypeError;
use crate::typeck::types::{Monotype, Scheme};

/// The number of curried arrows at the front of `ty`, i.e. the external's
/// declared arity.
pub fn arity_of(ty: &Monotype) -> usize {
    match ty {
        Monotype::Fn(_, rest) => 1 + arity_of(rest),
        _ => 0,
    }
}

pub fn resolve_overload(sigs: &[ExternalSig], name: &str, arity: usize, span: &Span) -> Result<Scheme, TypeError> {
    sigs.iter()
        .find(|s| s.arity == arity)
        .map(|s| s.scheme.clone())
        .ok_or_else(|| TypeError::NoMatchingOverload {
            name: name.to_string(),
            arity,
            valid: sigs.iter().map(|s| s.arity).collect(),
            span: span.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn arity_counts_curried_arrows() {
        let ty = Monotype::Fn(
            Box::new(Monotype::Int),
            Box::new(Monotype::Fn(Box::new(Monotype::Int), Box::new(Monotype::Bool))),
        );
        assert_eq!(arity_of(&ty), 2);
    }

    #[test]
    fn resolves_matching_arity_and_rejects_others() {
        let sigs = vec![
            ExternalSig {
                arity: 1,
                scheme: Scheme::monomorphic(Monotype::Fn(Box::new(Monotype::Int), Box::new(Monotype::Bool))),
            },
            ExternalSig {
                arity: 2,
                scheme: Scheme::monomorphic(Monotype::Fn(
                    Box::new(Monotype::Int),
                    Box::new(Monotype::Fn(Box::new(Monotype::Int), Box::new(Monotype::Bool))),
                )),
            },
        ];
        assert!(resolve_overload(&sigs, "f", 1, &Span::dummy()).is_ok());
        assert!(resolve_overload(&sigs, "f", 3, &Span::dummy()).is_err());
    }
}

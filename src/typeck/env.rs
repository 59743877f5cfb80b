//! Type environment (spec §4.4.1 "env"): variable schemes plus the
//! declared-type and constructor tables a `type` declaration populates.

use std::collections::HashMap;

use crate::span::Span;
use crate::syntax::TypeExpr;
use crate::typeck::error::TypeError;
use crate::typeck::subst::Subst;
use crate::typeck::types::{Monotype, Row, RowTail, Scheme};

#[derive(Debug, Clone)]
pub enum TypeDefKind {
    Alias(TypeExpr),
    Variant(Vec<(String, Vec<TypeExpr>)>),
    Record { fields: Vec<(String, TypeExpr)>, open: bool },
}

#[derive(Debug, Clone)]
pub struct TypeDef {
    pub params: Vec<String>,
    pub kind: TypeDefKind,
}

/// A variant constructor's owning type, its type parameters (in scope for
/// the constructor's field types) and its field type expressions.
#[derive(Debug, Clone)]
pub struct ConstructorInfo {
    pub type_name: String,
    pub params: Vec<String>,
    pub fields: Vec<TypeExpr>,
}

#[derive(Debug, Clone)]
pub struct ExternalSig {
    pub arity: usize,
    pub scheme: Scheme,
}

#[derive(Debug, Clone, Default)]
pub struct Env {
    pub values: HashMap<String, Scheme>,
    pub types: HashMap<String, TypeDef>,
    pub constructors: HashMap<String, ConstructorInfo>,
    /// Multiple `external` declarations may share a name; resolved by arity
    /// at each call site (spec §4.4.5).
    pub externals: HashMap<String, Vec<ExternalSig>>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    pub fn child(&self) -> Env {
        self.clone()
    }

    pub fn bind_value(&mut self, name: String, scheme: Scheme) {
        self.values.insert(name, scheme);
    }

    pub fn lookup_value(&self, name: &str, span: &Span) -> Result<Scheme, TypeError> {
        self.values.get(name).cloned().ok_or_else(|| TypeError::UndefinedVariable {
            name: name.to_string(),
            span: span.clone(),
        })
    }

    /// Converts a surface type expression into a checker monotype, resolving
    /// bare names against `params` (bound type variables, mapped to
    /// existing monotypes) and the type table (spec §3 "Which one it is can
    /// only be decided with the surrounding Context", mirrored here at
    /// conversion time rather than parse time).
    ///
    /// `external` signatures have no declared parameter list, so a
    /// lowercase-leading bare name not already bound is treated as an
    /// implicitly-quantified type variable and added to `params` on first
    /// use, the same convention `a`/`b` read as in `List<a>` everywhere
    /// else in this spec's examples.
    pub fn resolve_type_expr(
        &self,
        expr: &TypeExpr,
        params: &mut HashMap<String, Monotype>,
        subst: &mut Subst,
        level: u32,
    ) -> Result<Monotype, TypeError> {
        self.resolve_type_expr_inner(expr, params, subst, level, &mut Vec::new())
    }

    fn resolve_type_expr_inner(
        &self,
        expr: &TypeExpr,
        params: &mut HashMap<String, Monotype>,
        subst: &mut Subst,
        level: u32,
        visiting: &mut Vec<String>,
    ) -> Result<Monotype, TypeError> {
        match expr {
            TypeExpr::Name(name, span) => {
                if let Some(bound) = params.get(name) {
                    return Ok(bound.clone());
                }
                match name.as_str() {
                    "Int" => Ok(Monotype::Int),
                    "Float" => Ok(Monotype::Float),
                    "Bool" => Ok(Monotype::Bool),
                    "String" => Ok(Monotype::Str),
                    "Unit" => Ok(Monotype::Unit),
                    _ => {
                        if self.types.contains_key(name) {
                            self.resolve_named(name, &[], params, subst, level, span, visiting)
                        } else if name.starts_with(|c: char| c.is_ascii_lowercase()) {
                            let fresh = subst.fresh(level);
                            params.insert(name.clone(), fresh.clone());
                            Ok(fresh)
                        } else {
                            Err(TypeError::UndefinedType {
                                name: name.clone(),
                                span: span.clone(),
                            })
                        }
                    }
                }
            }
            TypeExpr::Apply(head, args, span) => {
                let name = match head.as_ref() {
                    TypeExpr::Name(n, _) => n.clone(),
                    _ => {
                        return Err(TypeError::UndefinedType {
                            name: "<non-name type constructor>".to_string(),
                            span: span.clone(),
                        })
                    }
                };
                if !self.types.contains_key(&name) {
                    return Err(TypeError::UndefinedType {
                        name,
                        span: span.clone(),
                    });
                }
                self.resolve_named(&name, args, params, subst, level, span, visiting)
            }
            TypeExpr::Fn(param_tys, ret, _) => {
                let mut resolved = Vec::with_capacity(param_tys.len());
                for p in param_tys {
                    resolved.push(self.resolve_type_expr(p, params, subst, level)?);
                }
                let ret = self.resolve_type_expr(ret, params, subst, level)?;
                Ok(Monotype::function(&resolved, ret))
            }
            TypeExpr::Record { fields, open, .. } => {
                let mut resolved = Vec::with_capacity(fields.len());
                for f in fields {
                    resolved.push((f.name.clone(), self.resolve_type_expr(&f.type_expr, params, subst, level)?));
                }
                let rest = if *open {
                    RowTail::Open(subst.fresh_id(level))
                } else {
                    RowTail::Closed
                };
                Ok(Monotype::Record(Row { fields: resolved, rest }))
            }
            TypeExpr::Tuple(items, _) => {
                let mut resolved = Vec::with_capacity(items.len());
                for i in items {
                    resolved.push(self.resolve_type_expr(i, params, subst, level)?);
                }
                Ok(Monotype::Tuple(resolved))
            }
            TypeExpr::Reference(inner, _) => {
                Ok(Monotype::Reference(Box::new(self.resolve_type_expr(inner, params, subst, level)?)))
            }
        }
    }

    /// Resolves a named type constructor applied to `args`: a `Variant` or
    /// `Record` declaration stays nominal (`Monotype::App`), while an
    /// `Alias` is expanded into its body with the declaration's own
    /// parameters bound to `args`. `visiting` detects an alias that expands
    /// into itself with no variant/record constructor in between — a
    /// genuinely infinite type with no monotype representation, rejected
    /// rather than looped on forever (Open Question decision, SPEC_FULL §6).
    fn resolve_named(
        &self,
        name: &str,
        args: &[TypeExpr],
        params: &mut HashMap<String, Monotype>,
        subst: &mut Subst,
        level: u32,
        span: &Span,
        visiting: &mut Vec<String>,
    ) -> Result<Monotype, TypeError> {
        let def = self.types.get(name).expect("caller checked types.contains_key");
        match &def.kind {
            TypeDefKind::Alias(body) => {
                if visiting.contains(&name.to_string()) {
                    return Err(TypeError::CyclicAlias {
                        name: name.to_string(),
                        span: span.clone(),
                    });
                }
                let mut inner_params = HashMap::new();
                for (p, a) in def.params.iter().zip(args.iter()) {
                    inner_params.insert(p.clone(), self.resolve_type_expr_inner(a, params, subst, level, visiting)?);
                }
                visiting.push(name.to_string());
                let result = self.resolve_type_expr_inner(body, &mut inner_params, subst, level, visiting);
                visiting.pop();
                result
            }
            TypeDefKind::Variant(_) | TypeDefKind::Record { .. } => {
                let mut resolved_args = Vec::with_capacity(args.len());
                for a in args {
                    resolved_args.push(self.resolve_type_expr_inner(a, params, subst, level, visiting)?);
                }
                Ok(Monotype::App(name.to_string(), resolved_args))
            }
        }
    }

    /// Fresh type-parameter bindings for a declaration with the given
    /// parameter names, used both when registering constructors/aliases and
    /// when instantiating a constructor's type at a use site.
    pub fn fresh_param_map(params: &[String], subst: &mut Subst, level: u32) -> HashMap<String, Monotype> {
        params.iter().map(|p| (p.clone(), subst.fresh(level))).collect()
    }
}

//! Hindley–Milner type checking over the Core AST (spec §4.4), the largest
//! phase: Algorithm W with let-polymorphism, value restriction, row/width
//! subtyping over records, variant constructors, exhaustiveness checking
//! and external overload resolution.
//!
//! Public contract: [`typecheck`] takes a [`core::Module`] plus a starting
//! [`Env`] and returns a [`TypedModule`] or the first [`TypeError`]
//! encountered — each phase throws at the first error, per spec §4.4.7.

pub mod env;
pub mod error;
pub mod exhaustiveness;
pub mod overload;
pub mod subst;
pub mod types;

use std::collections::HashMap;

use crate::core::{self, Declaration, Expr, Module as CoreModule, Pattern};
use crate::span::Span;
use crate::syntax::{BinaryOp, Literal, TypeDecl, TypeDeclBody, UnaryOp};

pub use env::Env;
pub use error::{TypeError, TypeResult, TypeWarning};
pub use types::{Monotype, Row, RowTail, Scheme, VarId};

use subst::Subst;
mod unify;
use unify::unify;

#[derive(Debug, Clone)]
pub struct TypedModule {
    pub env: Env,
    pub schemes: HashMap<String, Scheme>,
    pub warnings: Vec<TypeWarning>,
}

/// `env`/`subst`/`level`/`warnings` (spec §4.4.1).
struct Checker {
    subst: Subst,
    level: u32,
    warnings: Vec<TypeWarning>,
}

impl Checker {
    fn new() -> Self {
        Checker {
            subst: Subst::new(),
            level: 0,
            warnings: Vec::new(),
        }
    }

    fn instantiate(&mut self, scheme: &Scheme) -> Monotype {
        if scheme.vars.is_empty() {
            return scheme.body.clone();
        }
        let mapping: HashMap<VarId, Monotype> = scheme.vars.iter().map(|v| (*v, self.subst.fresh(self.level))).collect();
        substitute_vars(&scheme.body, &mapping)
    }

    fn generalize(&mut self, ty: &Monotype) -> Scheme {
        let resolved = self.subst.resolve(ty);
        let mut vars = Vec::new();
        self.subst.free_vars_above(&resolved, self.level, &mut vars);
        Scheme { vars, body: resolved }
    }

    // ---- expressions ----------------------------------------------------

    fn infer_expr(&mut self, env: &mut Env, expr: &Expr) -> TypeResult<Monotype> {
        match expr {
            Expr::Literal(lit, _) => Ok(literal_type(lit)),
            Expr::Var(name, span) => {
                let scheme = env.lookup_value(name, span)?;
                Ok(self.instantiate(&scheme))
            }
            Expr::Lambda { param, param_type, body, span } => {
                let param_ty = self.subst.fresh(self.level);
                if let Some(ann) = param_type {
                    let ann_ty = env.resolve_type_expr(ann, &mut HashMap::new(), &mut self.subst, self.level)?;
                    unify(&mut self.subst, &ann_ty, &param_ty, span)?;
                }
                let mut inner = env.child();
                self.bind_pattern(&mut inner, param, &param_ty)?;
                let body_ty = self.infer_expr(&mut inner, body)?;
                Ok(Monotype::Fn(Box::new(param_ty), Box::new(body_ty)))
            }
            Expr::App { .. } => self.infer_app(env, expr),
            Expr::LetIn {
                pattern,
                recursive,
                type_ann,
                value,
                body,
                span,
            } => self.infer_let_in(env, pattern, *recursive, type_ann.as_ref(), value, body, span),
            Expr::Match { scrutinee, arms, span } => self.infer_match(env, scrutinee, arms, span),
            Expr::Record { fields, .. } => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, e) in fields {
                    out.push((name.clone(), self.infer_expr(env, e)?));
                }
                Ok(Monotype::Record(Row::closed(out)))
            }
            Expr::Proj { record, field, span } => {
                let record_ty = self.infer_expr(env, record)?;
                let field_ty = self.subst.fresh(self.level);
                let tail = self.subst.fresh_id(self.level);
                unify(
                    &mut self.subst,
                    &record_ty,
                    &Monotype::Record(Row {
                        fields: vec![(field.clone(), field_ty.clone())],
                        rest: RowTail::Open(tail),
                    }),
                    span,
                )?;
                Ok(field_ty)
            }
            Expr::RecordUpdate { updates, span } => self.infer_record_update(env, updates, span),
            Expr::Variant { name, args, span } => self.infer_variant(env, name, args, span),
            Expr::Tuple(items, _) => {
                let mut out = Vec::with_capacity(items.len());
                for i in items {
                    out.push(self.infer_expr(env, i)?);
                }
                Ok(Monotype::Tuple(out))
            }
            Expr::Binary { op, lhs, rhs, span } => self.infer_binary(env, *op, lhs, rhs, span),
            Expr::Unary { op, operand, span } => self.infer_unary(env, *op, operand, span),
            Expr::RefAssign { target, value, span } => {
                let target_ty = self.infer_expr(env, target)?;
                let inner = self.subst.fresh(self.level);
                unify(&mut self.subst, &target_ty, &Monotype::Reference(Box::new(inner.clone())), span)?;
                let value_ty = self.infer_expr(env, value)?;
                unify(&mut self.subst, &inner, &value_ty, span)?;
                Ok(Monotype::Unit)
            }
            Expr::MakeRef(inner, _) => {
                let t = self.infer_expr(env, inner)?;
                Ok(Monotype::Reference(Box::new(t)))
            }
            // Transparent: per the Open Question decision, a leaking type
            // variable is a standard error deferred to generalization, not
            // a distinct unsafe-specific check.
            Expr::Unsafe(inner, _) => self.infer_expr(env, inner),
            Expr::Annotate { expr, type_expr, span } => {
                let t = self.infer_expr(env, expr)?;
                let ann = env.resolve_type_expr(type_expr, &mut HashMap::new(), &mut self.subst, self.level)?;
                unify(&mut self.subst, &ann, &t, span)?;
                Ok(ann)
            }
            Expr::While { cond, body, span } => {
                let c = self.infer_expr(env, cond)?;
                unify(&mut self.subst, &c, &Monotype::Bool, span)?;
                let b = self.infer_expr(env, body)?;
                unify(&mut self.subst, &b, &Monotype::Unit, span)?;
                Ok(Monotype::Unit)
            }
        }
    }

    /// Applications are curried one argument at a time after desugaring;
    /// this walks the spine back to its head so an `external` overload set
    /// can be resolved by the call's total arity (spec §4.4.5).
    fn infer_app(&mut self, env: &mut Env, expr: &Expr) -> TypeResult<Monotype> {
        let mut args_rev: Vec<&Expr> = Vec::new();
        let mut cur = expr;
        while let Expr::App { func, arg, .. } = cur {
            args_rev.push(arg);
            cur = func;
        }
        args_rev.reverse();
        let arity = args_rev.len();
        let head = cur;

        let mut func_ty = if let Expr::Var(name, span) = head {
            if let Some(sigs) = env.externals.get(name).cloned() {
                let scheme = overload::resolve_overload(&sigs, name, arity, span)?;
                self.instantiate(&scheme)
            } else {
                let scheme = env.lookup_value(name, span)?;
                self.instantiate(&scheme)
            }
        } else {
            self.infer_expr(env, head)?
        };

        let mut call_span = head.span().clone();
        for arg in args_rev {
            let arg_ty = self.infer_expr(env, arg)?;
            let result_ty = self.subst.fresh(self.level);
            unify(
                &mut self.subst,
                &func_ty,
                &Monotype::Fn(Box::new(arg_ty), Box::new(result_ty.clone())),
                &call_span,
            )?;
            func_ty = result_ty;
            call_span = arg.span().clone();
        }
        Ok(func_ty)
    }

    fn infer_let_in(
        &mut self,
        env: &mut Env,
        pattern: &Pattern,
        recursive: bool,
        type_ann: Option<&crate::syntax::TypeExpr>,
        value: &Expr,
        body: &Expr,
        span: &Span,
    ) -> TypeResult<Monotype> {
        self.level += 1;
        let mut inner_env = env.child();
        let placeholder = if recursive {
            if let Pattern::Var { name, .. } = pattern {
                let v = self.subst.fresh(self.level);
                inner_env.bind_value(name.clone(), Scheme::monomorphic(v.clone()));
                Some(v)
            } else {
                None
            }
        } else {
            None
        };
        let value_ty = self.infer_expr(&mut inner_env, value)?;
        if let Some(ph) = &placeholder {
            unify(&mut self.subst, ph, &value_ty, span)?;
        }
        if let Some(ann) = type_ann {
            let ann_ty = inner_env.resolve_type_expr(ann, &mut HashMap::new(), &mut self.subst, self.level)?;
            unify(&mut self.subst, &ann_ty, &value_ty, span)?;
        }
        self.level -= 1;

        let mut body_env = env.child();
        let resolved = self.subst.resolve(&value_ty);
        match pattern {
            Pattern::Var { name, .. } => {
                let scheme = if is_value(value) { self.generalize(&resolved) } else { Scheme::monomorphic(resolved) };
                body_env.bind_value(name.clone(), scheme);
            }
            other => self.bind_pattern(&mut body_env, other, &resolved)?,
        }
        self.infer_expr(&mut body_env, body)
    }

    fn infer_match(&mut self, env: &mut Env, scrutinee: &Expr, arms: &[core::MatchArm], span: &Span) -> TypeResult<Monotype> {
        let scrutinee_ty = self.infer_expr(env, scrutinee)?;
        let result_ty = self.subst.fresh(self.level);
        for arm in arms {
            let mut arm_env = env.child();
            self.bind_pattern(&mut arm_env, &arm.pattern, &scrutinee_ty)?;
            let body_ty = self.infer_expr(&mut arm_env, &arm.body)?;
            unify(&mut self.subst, &result_ty, &body_ty, arm.body.span())?;
        }

        let patterns: Vec<Pattern> = arms.iter().map(|a| a.pattern.clone()).collect();
        match exhaustiveness::check(env, &self.subst, &scrutinee_ty, &patterns) {
            exhaustiveness::Exhaustiveness::Exhaustive => {}
            exhaustiveness::Exhaustiveness::Missing(shape) => self.warnings.push(TypeWarning::NonExhaustiveMatch {
                missing_summary: shape,
                span: span.clone(),
            }),
            exhaustiveness::Exhaustiveness::Undecidable => {
                self.warnings.push(TypeWarning::ExhaustivenessUndecidable { span: span.clone() })
            }
        }
        for i in 0..patterns.len() {
            if exhaustiveness::is_redundant(env, &self.subst, &scrutinee_ty, &patterns, i) {
                self.warnings.push(TypeWarning::UnreachableArm {
                    span: arms[i].pattern.span().clone(),
                });
            }
        }

        Ok(result_ty)
    }

    fn infer_record_update(&mut self, env: &mut Env, updates: &[core::RecordUpdateItem], span: &Span) -> TypeResult<Monotype> {
        let mut fields: Vec<(String, Monotype)> = Vec::new();
        for item in updates {
            match item {
                core::RecordUpdateItem::Field(name, e) => {
                    let t = self.infer_expr(env, e)?;
                    if let Some(slot) = fields.iter_mut().find(|(n, _)| n == name) {
                        slot.1 = t;
                    } else {
                        fields.push((name.clone(), t));
                    }
                }
                core::RecordUpdateItem::Spread(e) => {
                    let t = self.infer_expr(env, e)?;
                    let resolved = self.subst.resolve(&t);
                    let row = match resolved {
                        Monotype::Record(r) => r,
                        Monotype::Var(_) => {
                            let tail = self.subst.fresh_id(self.level);
                            let fresh_row = Row {
                                fields: Vec::new(),
                                rest: RowTail::Open(tail),
                            };
                            unify(&mut self.subst, &t, &Monotype::Record(fresh_row.clone()), span)?;
                            fresh_row
                        }
                        other => {
                            return Err(TypeError::Mismatch {
                                expected: Monotype::Record(Row::closed(Vec::new())),
                                actual: other,
                                span: span.clone(),
                            })
                        }
                    };
                    for (n, ty) in row.fields {
                        if let Some(slot) = fields.iter_mut().find(|(name, _)| *name == n) {
                            slot.1 = ty;
                        } else {
                            fields.push((n, ty));
                        }
                    }
                }
            }
        }
        let tail = self.subst.fresh_id(self.level);
        Ok(Monotype::Record(Row { fields, rest: RowTail::Open(tail) }))
    }

    fn infer_variant(&mut self, env: &mut Env, name: &str, args: &[Expr], span: &Span) -> TypeResult<Monotype> {
        let ctor = env
            .constructors
            .get(name)
            .cloned()
            .ok_or_else(|| TypeError::UndefinedVariable {
                name: name.to_string(),
                span: span.clone(),
            })?;
        if ctor.fields.len() != args.len() {
            return Err(TypeError::Mismatch {
                expected: Monotype::App(format!("{name}/{}", ctor.fields.len()), Vec::new()),
                actual: Monotype::App(format!("{name}/{}", args.len()), Vec::new()),
                span: span.clone(),
            });
        }
        let mut param_map = Env::fresh_param_map(&ctor.params, &mut self.subst, self.level);
        let mut arg_tys = Vec::with_capacity(args.len());
        for a in args {
            arg_tys.push(self.infer_expr(env, a)?);
        }
        for (field_expr, arg_ty) in ctor.fields.iter().zip(arg_tys.iter()) {
            let field_ty = env.resolve_type_expr(field_expr, &mut param_map, &mut self.subst, self.level)?;
            unify(&mut self.subst, &field_ty, arg_ty, span)?;
        }
        let result_args: Vec<Monotype> = ctor.params.iter().map(|p| param_map[p].clone()).collect();
        Ok(Monotype::App(ctor.type_name, result_args))
    }

    fn infer_binary(&mut self, env: &mut Env, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: &Span) -> TypeResult<Monotype> {
        let lhs_ty = self.infer_expr(env, lhs)?;
        let rhs_ty = self.infer_expr(env, rhs)?;
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                unify(&mut self.subst, &lhs_ty, &rhs_ty, span)?;
                match self.subst.resolve(&lhs_ty) {
                    t @ (Monotype::Int | Monotype::Float) => Ok(t),
                    Monotype::Var(_) => {
                        unify(&mut self.subst, &lhs_ty, &Monotype::Int, span)?;
                        Ok(Monotype::Int)
                    }
                    other => Err(TypeError::Mismatch {
                        expected: Monotype::Int,
                        actual: other,
                        span: span.clone(),
                    }),
                }
            }
            // `&` is string-only (spec §4.4.4).
            BinaryOp::Concat => {
                unify(&mut self.subst, &lhs_ty, &Monotype::Str, span)?;
                unify(&mut self.subst, &rhs_ty, &Monotype::Str, span)?;
                Ok(Monotype::Str)
            }
            BinaryOp::BitOr | BinaryOp::BitXor => {
                unify(&mut self.subst, &lhs_ty, &Monotype::Int, span)?;
                unify(&mut self.subst, &rhs_ty, &Monotype::Int, span)?;
                Ok(Monotype::Int)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                unify(&mut self.subst, &lhs_ty, &rhs_ty, span)?;
                Ok(Monotype::Bool)
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                unify(&mut self.subst, &lhs_ty, &rhs_ty, span)?;
                match self.subst.resolve(&lhs_ty) {
                    Monotype::Int | Monotype::Float | Monotype::Var(_) => Ok(Monotype::Bool),
                    other => Err(TypeError::Mismatch {
                        expected: Monotype::Int,
                        actual: other,
                        span: span.clone(),
                    }),
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                unify(&mut self.subst, &lhs_ty, &Monotype::Bool, span)?;
                unify(&mut self.subst, &rhs_ty, &Monotype::Bool, span)?;
                Ok(Monotype::Bool)
            }
        }
    }

    fn infer_unary(&mut self, env: &mut Env, op: UnaryOp, operand: &Expr, span: &Span) -> TypeResult<Monotype> {
        let ty = self.infer_expr(env, operand)?;
        match op {
            UnaryOp::Neg => match self.subst.resolve(&ty) {
                t @ (Monotype::Int | Monotype::Float) => Ok(t),
                Monotype::Var(_) => {
                    unify(&mut self.subst, &ty, &Monotype::Int, span)?;
                    Ok(Monotype::Int)
                }
                other => Err(TypeError::Mismatch {
                    expected: Monotype::Int,
                    actual: other,
                    span: span.clone(),
                }),
            },
            UnaryOp::Not => {
                unify(&mut self.subst, &ty, &Monotype::Bool, span)?;
                Ok(Monotype::Bool)
            }
            // postfix `!`: `Ref α → α` (spec §4.4.4).
            UnaryOp::Deref => {
                let inner = self.subst.fresh(self.level);
                unify(&mut self.subst, &ty, &Monotype::Reference(Box::new(inner.clone())), span)?;
                Ok(inner)
            }
        }
    }

    // ---- patterns ---------------------------------------------------------

    fn bind_pattern(&mut self, env: &mut Env, pattern: &Pattern, ty: &Monotype) -> TypeResult<()> {
        match pattern {
            Pattern::Wildcard(_) => Ok(()),
            Pattern::Var { name, type_ann, span } => {
                if let Some(ann) = type_ann {
                    let ann_ty = env.resolve_type_expr(ann, &mut HashMap::new(), &mut self.subst, self.level)?;
                    unify(&mut self.subst, &ann_ty, ty, span)?;
                }
                env.bind_value(name.clone(), Scheme::monomorphic(ty.clone()));
                Ok(())
            }
            Pattern::Literal(lit, span) => unify(&mut self.subst, &literal_type(lit), ty, span),
            Pattern::Variant { name, args, span } => {
                let ctor = env
                    .constructors
                    .get(name)
                    .cloned()
                    .ok_or_else(|| TypeError::UndefinedVariable {
                        name: name.clone(),
                        span: span.clone(),
                    })?;
                let mut param_map = Env::fresh_param_map(&ctor.params, &mut self.subst, self.level);
                let result_args: Vec<Monotype> = ctor.params.iter().map(|p| param_map[p].clone()).collect();
                unify(&mut self.subst, &Monotype::App(ctor.type_name.clone(), result_args), ty, span)?;
                for (field_expr, sub_pattern) in ctor.fields.iter().zip(args.iter()) {
                    let field_ty = env.resolve_type_expr(field_expr, &mut param_map, &mut self.subst, self.level)?;
                    self.bind_pattern(env, sub_pattern, &field_ty)?;
                }
                Ok(())
            }
            Pattern::Record { fields, span } => {
                let mut row_fields = Vec::with_capacity(fields.len());
                for f in fields {
                    let field_ty = self.subst.fresh(self.level);
                    row_fields.push((f.name.clone(), field_ty.clone()));
                    self.bind_pattern(env, &f.pattern, &field_ty)?;
                }
                let tail = self.subst.fresh_id(self.level);
                unify(
                    &mut self.subst,
                    &Monotype::Record(Row { fields: row_fields, rest: RowTail::Open(tail) }),
                    ty,
                    span,
                )
            }
            Pattern::Tuple(items, span) => {
                let elem_tys: Vec<Monotype> = items.iter().map(|_| self.subst.fresh(self.level)).collect();
                unify(&mut self.subst, &Monotype::Tuple(elem_tys.clone()), ty, span)?;
                for (item, t) in items.iter().zip(elem_tys.iter()) {
                    self.bind_pattern(env, item, t)?;
                }
                Ok(())
            }
        }
    }

    // ---- declarations -----------------------------------------------------

    fn infer_declaration(&mut self, env: &mut Env, decl: &Declaration, schemes: &mut HashMap<String, Scheme>) -> TypeResult<()> {
        match decl {
            Declaration::Let { recursive, bindings, .. } => self.infer_let_decl(env, *recursive, bindings, schemes),
            Declaration::Type { decls, .. } => self.register_type_decls(env, decls),
            Declaration::External { item, .. } => self.register_external(env, item),
            // Module-graph concerns, not the checker's (spec §4.5).
            Declaration::Import(_) | Declaration::ReExport(_) => Ok(()),
        }
    }

    fn infer_let_decl(
        &mut self,
        env: &mut Env,
        recursive: bool,
        bindings: &[core::LetBinding],
        schemes: &mut HashMap<String, Scheme>,
    ) -> TypeResult<()> {
        self.level += 1;
        if recursive {
            // Bind every name to a fresh placeholder before inferring any
            // body, so mutually recursive functions can call one another
            // (spec §4.4.1 "let rec ... and ..."). The desugarer already
            // rejected non-function bindings in a `rec` group, so every
            // binding here is a value and therefore generalizable.
            let mut placeholders: Vec<Option<VarId>> = Vec::with_capacity(bindings.len());
            for b in bindings {
                match &b.pattern {
                    Pattern::Var { name, .. } => {
                        let id = self.subst.fresh_id(self.level);
                        env.bind_value(name.clone(), Scheme::monomorphic(Monotype::Var(id)));
                        placeholders.push(Some(id));
                    }
                    _ => placeholders.push(None),
                }
            }
            for (b, placeholder) in bindings.iter().zip(placeholders.iter()) {
                let value_ty = self.infer_expr(env, &b.value)?;
                if let Some(id) = placeholder {
                    unify(&mut self.subst, &Monotype::Var(*id), &value_ty, &b.span)?;
                }
                if let Some(ann) = &b.type_ann {
                    let ann_ty = env.resolve_type_expr(ann, &mut HashMap::new(), &mut self.subst, self.level)?;
                    unify(&mut self.subst, &ann_ty, &value_ty, &b.span)?;
                }
            }
            self.level -= 1;
            for (b, placeholder) in bindings.iter().zip(placeholders.iter()) {
                if let (Pattern::Var { name, .. }, Some(id)) = (&b.pattern, placeholder) {
                    let resolved = self.subst.resolve(&Monotype::Var(*id));
                    let scheme = self.generalize(&resolved);
                    env.bind_value(name.clone(), scheme.clone());
                    schemes.insert(name.clone(), scheme);
                }
            }
        } else {
            let mut value_tys = Vec::with_capacity(bindings.len());
            for b in bindings {
                let value_ty = self.infer_expr(env, &b.value)?;
                if let Some(ann) = &b.type_ann {
                    let ann_ty = env.resolve_type_expr(ann, &mut HashMap::new(), &mut self.subst, self.level)?;
                    unify(&mut self.subst, &ann_ty, &value_ty, &b.span)?;
                }
                value_tys.push(value_ty);
            }
            self.level -= 1;
            for (b, value_ty) in bindings.iter().zip(value_tys.iter()) {
                let resolved = self.subst.resolve(value_ty);
                match &b.pattern {
                    Pattern::Var { name, .. } => {
                        let scheme = if is_value(&b.value) {
                            self.generalize(&resolved)
                        } else {
                            Scheme::monomorphic(resolved)
                        };
                        env.bind_value(name.clone(), scheme.clone());
                        schemes.insert(name.clone(), scheme);
                    }
                    other => self.bind_pattern(env, other, &resolved)?,
                }
            }
        }
        Ok(())
    }

    fn register_type_decls(&mut self, env: &mut Env, decls: &[TypeDecl]) -> TypeResult<()> {
        // Bind every group member's name before expanding any body, so a
        // mutually recursive alias can refer to a type declared later in
        // the same `and` group (Open Question decision, spec §7).
        for d in decls {
            if let TypeDeclBody::Variant(cases) = &d.body {
                for case in cases {
                    if case.name == core::NIL || case.name == core::CONS {
                        return Err(TypeError::ReservedConstructorRedefined {
                            name: case.name.clone(),
                            span: case.span.clone(),
                        });
                    }
                }
            }
            let kind = match &d.body {
                TypeDeclBody::Alias(te) => env::TypeDefKind::Alias(te.clone()),
                TypeDeclBody::Variant(cases) => {
                    env::TypeDefKind::Variant(cases.iter().map(|c| (c.name.clone(), c.fields.clone())).collect())
                }
                TypeDeclBody::Record { fields, open } => env::TypeDefKind::Record {
                    fields: fields.clone(),
                    open: *open,
                },
            };
            env.types.insert(d.name.clone(), env::TypeDef { params: d.params.clone(), kind });
        }
        for d in decls {
            if let TypeDeclBody::Variant(cases) = &d.body {
                for c in cases {
                    env.constructors.insert(
                        c.name.clone(),
                        env::ConstructorInfo {
                            type_name: d.name.clone(),
                            params: d.params.clone(),
                            fields: c.fields.clone(),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn register_external(&mut self, env: &mut Env, item: &crate::syntax::ExternalItem) -> TypeResult<()> {
        let mut params = HashMap::new();
        let ty = env.resolve_type_expr(&item.type_expr, &mut params, &mut self.subst, self.level)?;
        let mut vars: Vec<VarId> = Vec::new();
        for v in params.values() {
            if let Monotype::Var(id) = v {
                vars.push(*id);
            }
        }
        let scheme = Scheme { vars, body: self.subst.resolve(&ty) };
        let arity = overload::arity_of(&scheme.body);
        env.externals.entry(item.name.clone()).or_default().push(env::ExternalSig { arity, scheme });
        Ok(())
    }
}

fn literal_type(lit: &Literal) -> Monotype {
    match lit {
        Literal::Int(_) => Monotype::Int,
        Literal::Float(_) => Monotype::Float,
        Literal::Str(_) => Monotype::Str,
        Literal::Bool(_) => Monotype::Bool,
        Literal::Unit => Monotype::Unit,
    }
}

/// Spec §4.4.3 value restriction: a literal, a lambda, a variant
/// constructor (or its partial application), a record literal whose field
/// expressions are themselves values, or a tuple of values.
fn is_value(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(..) | Expr::Lambda { .. } | Expr::Var(..) => true,
        Expr::Variant { args, .. } => args.iter().all(is_value),
        Expr::Record { fields, .. } => fields.iter().all(|(_, v)| is_value(v)),
        Expr::Tuple(items, _) => items.iter().all(is_value),
        Expr::Annotate { expr, .. } => is_value(expr),
        _ => false,
    }
}

fn substitute_vars(ty: &Monotype, map: &HashMap<VarId, Monotype>) -> Monotype {
    match ty {
        Monotype::Var(v) => map.get(v).cloned().unwrap_or(Monotype::Var(*v)),
        Monotype::Int | Monotype::Float | Monotype::Bool | Monotype::Str | Monotype::Unit => ty.clone(),
        Monotype::Fn(a, b) => Monotype::Fn(Box::new(substitute_vars(a, map)), Box::new(substitute_vars(b, map))),
        Monotype::App(name, args) => Monotype::App(name.clone(), args.iter().map(|a| substitute_vars(a, map)).collect()),
        Monotype::Tuple(items) => Monotype::Tuple(items.iter().map(|t| substitute_vars(t, map)).collect()),
        Monotype::Reference(inner) => Monotype::Reference(Box::new(substitute_vars(inner, map))),
        Monotype::Record(row) => Monotype::Record(Row {
            fields: row.fields.iter().map(|(n, t)| (n.clone(), substitute_vars(t, map))).collect(),
            rest: match row.rest {
                RowTail::Closed => RowTail::Closed,
                RowTail::Open(v) => match map.get(&v) {
                    Some(Monotype::Var(v2)) => RowTail::Open(*v2),
                    _ => RowTail::Open(v),
                },
            },
        }),
    }
}

/// `env₀`: primitives are built into [`Monotype`] directly; the only
/// built-ins that need table entries are the reserved list constructors
/// (spec §3 "Invariants" — `Nil`/`Cons` are not redeclarable).
pub fn initial_env() -> Env {
    let mut env = Env::new();
    let list_params = vec!["a".to_string()];
    env.types.insert(
        "List".to_string(),
        env::TypeDef {
            params: list_params.clone(),
            kind: env::TypeDefKind::Variant(vec![
                (core::NIL.to_string(), Vec::new()),
                (
                    core::CONS.to_string(),
                    vec![
                        crate::syntax::TypeExpr::Name("a".to_string(), Span::dummy()),
                        crate::syntax::TypeExpr::Apply(
                            Box::new(crate::syntax::TypeExpr::Name("List".to_string(), Span::dummy())),
                            vec![crate::syntax::TypeExpr::Name("a".to_string(), Span::dummy())],
                            Span::dummy(),
                        ),
                    ],
                ),
            ]),
        },
    );
    env.constructors.insert(
        core::NIL.to_string(),
        env::ConstructorInfo {
            type_name: "List".to_string(),
            params: list_params.clone(),
            fields: Vec::new(),
        },
    );
    env.constructors.insert(
        core::CONS.to_string(),
        env::ConstructorInfo {
            type_name: "List".to_string(),
            params: list_params,
            fields: vec![
                crate::syntax::TypeExpr::Name("a".to_string(), Span::dummy()),
                crate::syntax::TypeExpr::Apply(
                    Box::new(crate::syntax::TypeExpr::Name("List".to_string(), Span::dummy())),
                    vec![crate::syntax::TypeExpr::Name("a".to_string(), Span::dummy())],
                    Span::dummy(),
                ),
            ],
        },
    );
    env
}

pub fn typecheck(module: CoreModule, mut env: Env) -> TypeResult<TypedModule> {
    let mut checker = Checker::new();
    let mut schemes = HashMap::new();
    for decl in &module.declarations {
        checker.infer_declaration(&mut env, decl, &mut schemes)?;
    }
    Ok(TypedModule {
        env,
        schemes,
        warnings: checker.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pattern::Pattern as CorePattern;
    use crate::core::{Declaration as CoreDeclaration, LetBinding as CoreLetBinding, Module as CoreModuleT};

    fn let_decl(name: &str, value: Expr) -> Declaration {
        Declaration::Let {
            recursive: false,
            bindings: vec![CoreLetBinding {
                pattern: CorePattern::Var {
                    name: name.to_string(),
                    type_ann: None,
                    span: Span::dummy(),
                },
                mutable: false,
                type_ann: None,
                value,
                span: Span::dummy(),
            }],
            exported: false,
            span: Span::dummy(),
        }
    }

    fn module_of(decls: Vec<Declaration>) -> CoreModuleT {
        CoreModuleT {
            declarations: decls,
            span: Span::dummy(),
        }
    }

    #[test]
    fn identity_function_is_generalized() {
        let id = Expr::Lambda {
            param: CorePattern::Var {
                name: "x".into(),
                type_ann: None,
                span: Span::dummy(),
            },
            param_type: None,
            body: Box::new(Expr::Var("x".into(), Span::dummy())),
            span: Span::dummy(),
        };
        let module = module_of(vec![let_decl("id", id)]);
        let result = typecheck(module, initial_env()).expect("identity should type check");
        let scheme = result.schemes.get("id").unwrap();
        assert_eq!(scheme.vars.len(), 1);
        assert!(matches!(scheme.body, Monotype::Fn(_, _)));
    }

    #[test]
    fn application_of_int_literal_to_identity_is_int() {
        let id = Expr::Lambda {
            param: CorePattern::Var {
                name: "x".into(),
                type_ann: None,
                span: Span::dummy(),
            },
            param_type: None,
            body: Box::new(Expr::Var("x".into(), Span::dummy())),
            span: Span::dummy(),
        };
        let applied = Expr::App {
            func: Box::new(id),
            arg: Box::new(Expr::Literal(Literal::Int(1), Span::dummy())),
            span: Span::dummy(),
        };
        let module = module_of(vec![let_decl("one", applied)]);
        let result = typecheck(module, initial_env()).unwrap();
        assert_eq!(result.schemes.get("one").unwrap().body, Monotype::Int);
    }

    #[test]
    fn mismatched_binary_operands_are_rejected() {
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Literal(Literal::Int(1), Span::dummy())),
            rhs: Box::new(Expr::Literal(Literal::Bool(true), Span::dummy())),
            span: Span::dummy(),
        };
        let module = module_of(vec![let_decl("bad", expr)]);
        assert!(typecheck(module, initial_env()).is_err());
    }

    #[test]
    fn value_restriction_keeps_applied_function_monomorphic() {
        // let apply = (f, x) => f(x) is a value (a lambda); calling it
        // directly as a let-bound RHS is not, so it stays monomorphic.
        let const_fn = Expr::Lambda {
            param: CorePattern::Var {
                name: "x".into(),
                type_ann: None,
                span: Span::dummy(),
            },
            param_type: None,
            body: Box::new(Expr::Var("x".into(), Span::dummy())),
            span: Span::dummy(),
        };
        let applied = Expr::App {
            func: Box::new(const_fn),
            arg: Box::new(Expr::Literal(Literal::Int(1), Span::dummy())),
            span: Span::dummy(),
        };
        let module = module_of(vec![let_decl("r", applied)]);
        let result = typecheck(module, initial_env()).unwrap();
        assert!(result.schemes.get("r").unwrap().vars.is_empty());
    }

    #[test]
    fn record_projection_infers_field_type() {
        let record = Expr::Record {
            fields: vec![("x".into(), Expr::Literal(Literal::Int(1), Span::dummy()))],
            span: Span::dummy(),
        };
        let proj = Expr::Proj {
            record: Box::new(record),
            field: "x".into(),
            span: Span::dummy(),
        };
        let module = module_of(vec![let_decl("x", proj)]);
        let result = typecheck(module, initial_env()).unwrap();
        assert_eq!(result.schemes.get("x").unwrap().body, Monotype::Int);
    }

    #[test]
    fn list_constructors_are_prebound() {
        let nil = Expr::Variant {
            name: core::NIL.to_string(),
            args: Vec::new(),
            span: Span::dummy(),
        };
        let cons = Expr::Variant {
            name: core::CONS.to_string(),
            args: vec![Expr::Literal(Literal::Int(1), Span::dummy()), nil],
            span: Span::dummy(),
        };
        let module = module_of(vec![let_decl("xs", cons)]);
        let result = typecheck(module, initial_env()).unwrap();
        assert!(matches!(result.schemes.get("xs").unwrap().body, Monotype::App(ref n, _) if n == "List"));
    }

    #[test]
    fn non_exhaustive_bool_match_warns() {
        let arm_true = core::MatchArm {
            pattern: CorePattern::Literal(Literal::Bool(true), Span::dummy()),
            body: Expr::Literal(Literal::Int(1), Span::dummy()),
        };
        let expr = Expr::Match {
            scrutinee: Box::new(Expr::Literal(Literal::Bool(true), Span::dummy())),
            arms: vec![arm_true],
            span: Span::dummy(),
        };
        let module = module_of(vec![let_decl("m", expr)]);
        let result = typecheck(module, initial_env()).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, TypeWarning::NonExhaustiveMatch { .. })));
    }

    #[test]
    fn external_overload_resolves_by_arity() {
        let decls = vec![
            CoreDeclaration::External {
                item: crate::syntax::ExternalItem {
                    name: "concat".into(),
                    type_expr: crate::syntax::TypeExpr::Fn(
                        vec![crate::syntax::TypeExpr::Name("String".into(), Span::dummy())],
                        Box::new(crate::syntax::TypeExpr::Name("String".into(), Span::dummy())),
                        Span::dummy(),
                    ),
                    js_name: None,
                    span: Span::dummy(),
                },
                from: Some("lib".into()),
                span: Span::dummy(),
            },
            CoreDeclaration::External {
                item: crate::syntax::ExternalItem {
                    name: "concat".into(),
                    type_expr: crate::syntax::TypeExpr::Fn(
                        vec![
                            crate::syntax::TypeExpr::Name("String".into(), Span::dummy()),
                            crate::syntax::TypeExpr::Name("String".into(), Span::dummy()),
                        ],
                        Box::new(crate::syntax::TypeExpr::Name("String".into(), Span::dummy())),
                        Span::dummy(),
                    ),
                    js_name: None,
                    span: Span::dummy(),
                },
                from: Some("lib".into()),
                span: Span::dummy(),
            },
            let_decl(
                "r",
                Expr::App {
                    func: Box::new(Expr::App {
                        func: Box::new(Expr::Var("concat".into(), Span::dummy())),
                        arg: Box::new(Expr::Literal(Literal::Str("a".into()), Span::dummy())),
                        span: Span::dummy(),
                    }),
                    arg: Box::new(Expr::Literal(Literal::Str("b".into()), Span::dummy())),
                    span: Span::dummy(),
                },
            ),
        ];
        let module = module_of(decls);
        let result = typecheck(module, initial_env()).unwrap();
        assert_eq!(result.schemes.get("r").unwrap().body, Monotype::Str);
    }

    #[test]
    fn external_overload_rejects_unmatched_arity() {
        let decls = vec![
            CoreDeclaration::External {
                item: crate::syntax::ExternalItem {
                    name: "f".into(),
                    type_expr: crate::syntax::TypeExpr::Fn(
                        vec![crate::syntax::TypeExpr::Name("Int".into(), Span::dummy())],
                        Box::new(crate::syntax::TypeExpr::Name("Int".into(), Span::dummy())),
                        Span::dummy(),
                    ),
                    js_name: None,
                    span: Span::dummy(),
                },
                from: None,
                span: Span::dummy(),
            },
            let_decl(
                "r",
                Expr::App {
                    func: Box::new(Expr::App {
                        func: Box::new(Expr::Var("f".into(), Span::dummy())),
                        arg: Box::new(Expr::Literal(Literal::Int(1), Span::dummy())),
                        span: Span::dummy(),
                    }),
                    arg: Box::new(Expr::Literal(Literal::Int(2), Span::dummy())),
                    span: Span::dummy(),
                },
            ),
        ];
        let module = module_of(decls);
        assert!(typecheck(module, initial_env()).is_err());
    }
}

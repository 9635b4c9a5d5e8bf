//! Candidate inference.
//!
//! Answers "can a value of type X stand where Y is required, and with which
//! bindings for X's (and optionally Y's) free type parameters".
//!
//! # Algorithm
//!
//! Every non-static type parameter becomes a type variable. Checking
//! `sub <: sup` through [`is_subtype_of`] with this context as the
//! [`TypeCheckerContext`] turns each comparison that touches a variable into
//! a lower, upper or equality constraint. New constraints are propagated:
//!
//! - **directly**: every lower bound of a variable must be a subtype of each
//!   of its upper bounds;
//! - **inside other constraints**: a constraint that mentions variable `V`
//!   is re-derived with `V` replaced by `V`'s own constraint. `derived_from`
//!   records which variables a constraint came through, so propagation
//!   cannot loop.
//!
//! Variables are then fixed one at a time, preferring variables whose
//! constraints mention no unfixed variable. A fixed type is an equality
//! constraint's type, else the common super type of the lower bounds or the
//! intersection of the upper bounds (whichever satisfies all constraints),
//! else `Any?`. Any subtype check that fails along the way is an error and
//! makes the whole inference fail.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::check::{is_equal_to, is_subtype_of, TypeCheckerContext};
use crate::{ClassifierId, Classifiers, Substitution, Type, Variance};

mod common;

pub use common::{common_super_type, intersect_types};

/// Direction of a constraint on a type variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ConstraintKind {
    /// `type <: variable`
    Lower,
    /// `variable <: type`
    Upper,
    /// `variable == type`
    Equal,
}

#[derive(Clone, Debug)]
struct Constraint {
    variable: ClassifierId,
    ty: Type,
    kind: ConstraintKind,
    derived_from: SmallVec<[ClassifierId; 4]>,
}

impl Constraint {
    fn new(variable: ClassifierId, ty: Type, kind: ConstraintKind) -> Self {
        Constraint {
            variable,
            ty,
            kind,
            derived_from: SmallVec::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct VariableWithConstraints {
    variable: ClassifierId,
    constraints: Vec<Constraint>,
}

impl VariableWithConstraints {
    /// Record a constraint; returns whether anything changed.
    ///
    /// A lower and an upper bound on the same type collapse into an
    /// equality.
    fn add_constraint(&mut self, constraint: Constraint) -> bool {
        let previous = self
            .constraints
            .iter()
            .find(|previous| previous.ty == constraint.ty)
            .map(|previous| previous.kind);

        if let Some(previous) = previous {
            if previous == ConstraintKind::Equal || previous == constraint.kind {
                return false;
            }
            let simplifies = match previous {
                ConstraintKind::Equal => true,
                ConstraintKind::Lower => constraint.kind == ConstraintKind::Upper,
                ConstraintKind::Upper => constraint.kind == ConstraintKind::Lower,
            };
            if simplifies {
                let equal = Constraint {
                    kind: ConstraintKind::Equal,
                    ..constraint
                };
                self.constraints.retain(|c| c.ty != equal.ty);
                self.constraints.push(equal);
                return true;
            }
        }

        self.constraints.push(constraint);
        true
    }
}

/// A subtype check that failed during inference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConstraintError {
    pub sub: Type,
    pub sup: Type,
}

/// Constraint system for one inference run.
pub struct InferenceContext<'a> {
    classifiers: &'a Classifiers,
    static_type_parameters: SmallVec<[ClassifierId; 4]>,
    /// Variables in registration order; fixing order depends on it.
    variables: Vec<VariableWithConstraints>,
    variable_index: FxHashMap<ClassifierId, usize>,
    fixed: Substitution,
    errors: Vec<ConstraintError>,
    pending: Option<Vec<Constraint>>,
}

impl<'a> InferenceContext<'a> {
    pub fn new(classifiers: &'a Classifiers) -> Self {
        InferenceContext {
            classifiers,
            static_type_parameters: SmallVec::new(),
            variables: Vec::new(),
            variable_index: FxHashMap::default(),
            fixed: Substitution::default(),
            errors: Vec::new(),
            pending: None,
        }
    }

    /// Whether no constraint was violated.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ConstraintError] {
        &self.errors
    }

    /// Bindings chosen for every variable.
    pub fn fixed_type_variables(&self) -> &Substitution {
        &self.fixed
    }

    pub fn into_fixed_type_variables(self) -> Substitution {
        self.fixed
    }

    /// Make `parameter` rigid. Must happen before variables are added.
    pub fn add_static_type_parameter(&mut self, parameter: ClassifierId) {
        self.static_type_parameters.push(parameter);
    }

    /// Turn `parameter` into a variable, constrained by its declared bounds.
    pub fn add_type_variable(&mut self, parameter: ClassifierId) {
        if self.static_type_parameters.contains(&parameter)
            || self.variable_index.contains_key(&parameter)
        {
            return;
        }
        self.variable_index.insert(parameter, self.variables.len());
        self.variables.push(VariableWithConstraints {
            variable: parameter,
            constraints: Vec::new(),
        });

        let variable_type = self.classifiers.default_type(parameter);
        let bounds = self.classifiers.get(parameter).super_types.clone();
        for bound in bounds {
            if bound != Type::nullable_any() {
                self.add_initial_sub_type_constraint(&variable_type, &bound);
            }
        }
    }

    /// Require `sub <: sup` and propagate.
    pub fn add_initial_sub_type_constraint(&mut self, sub: &Type, sup: &Type) {
        self.run_is_subtype_of(sub, sup);
        self.process_constraints();
    }

    fn add_initial_equality_constraint(&mut self, a: &Type, b: &Type) {
        let (variable, ty) = if self.classifiers.is_type_parameter(a.classifier()) {
            (a.classifier(), b)
        } else if self.classifiers.is_type_parameter(b.classifier()) {
            (b.classifier(), a)
        } else {
            return;
        };
        self.add_pending(Constraint::new(variable, ty.clone(), ConstraintKind::Equal));
        self.process_constraints();
    }

    fn add_pending(&mut self, constraint: Constraint) {
        self.pending.get_or_insert_with(Vec::new).push(constraint);
    }

    fn is_variable(&self, classifier: ClassifierId) -> bool {
        self.variable_index.contains_key(&classifier)
    }

    fn process_constraints(&mut self) {
        while let Some(batch) = self.pending.take() {
            if !self.is_ok() {
                break;
            }
            let mut any_added = false;
            for constraint in batch {
                if self.should_skip(&constraint) {
                    continue;
                }
                let Some(&index) = self.variable_index.get(&constraint.variable) else {
                    continue;
                };
                let added = self.variables[index].add_constraint(constraint.clone());
                any_added |= added;
                if added {
                    self.direct_with_variable(index, &constraint);
                    self.inside_other_constraint(constraint.variable, &constraint);
                }
            }
            if !any_added {
                break;
            }
        }
    }

    /// Constraints of a variable on itself carry no information, except
    /// `T? <: T` which forces nullability.
    fn should_skip(&self, constraint: &Constraint) -> bool {
        if constraint.kind == ConstraintKind::Equal {
            return false;
        }
        if constraint.ty.classifier() == constraint.variable {
            return !(constraint.ty.is_marked_nullable() && constraint.kind == ConstraintKind::Lower);
        }
        false
    }

    fn direct_with_variable(&mut self, index: usize, constraint: &Constraint) {
        if constraint.kind != ConstraintKind::Lower {
            let others = self.variables[index].constraints.clone();
            for other in &others {
                if !self.is_ok() {
                    break;
                }
                if other.kind != ConstraintKind::Upper {
                    self.run_is_subtype_of(&other.ty, &constraint.ty);
                }
            }
        }

        if constraint.kind != ConstraintKind::Upper {
            let others = self.variables[index].constraints.clone();
            for other in &others {
                if !self.is_ok() {
                    break;
                }
                if other.kind != ConstraintKind::Lower {
                    self.run_is_subtype_of(&constraint.ty, &other.ty);
                }
            }
        }
    }

    fn inside_other_constraint(&mut self, variable: ClassifierId, constraint: &Constraint) {
        let mut affected = Vec::new();
        for target in &self.variables {
            for base in &target.constraints {
                if base.ty.any_type(&mut |t| t.classifier() == variable) {
                    affected.push((target.variable, base.clone()));
                }
            }
        }
        for (target, base) in affected {
            if !self.is_ok() {
                break;
            }
            self.generate_new_constraint(target, &base, variable, constraint);
        }
    }

    fn generate_new_constraint(
        &mut self,
        target: ClassifierId,
        base: &Constraint,
        other_variable: ClassifierId,
        other: &Constraint,
    ) {
        let replacement = match other.kind {
            ConstraintKind::Equal => other.ty.clone(),
            ConstraintKind::Upper => other.ty.with_variance(Variance::Out),
            ConstraintKind::Lower => other.ty.with_variance(Variance::In),
        };
        let mut map = Substitution::default();
        map.insert(other_variable, replacement);
        let substituted = base.ty.substitute(&map);

        if base.kind != ConstraintKind::Lower {
            self.add_new_constraint(target, base, other_variable, other, &substituted, ConstraintKind::Upper);
        }
        if base.kind != ConstraintKind::Upper {
            self.add_new_constraint(target, base, other_variable, other, &substituted, ConstraintKind::Lower);
        }
    }

    fn add_new_constraint(
        &mut self,
        target: ClassifierId,
        base: &Constraint,
        other_variable: ClassifierId,
        other: &Constraint,
        ty: &Type,
        kind: ConstraintKind,
    ) {
        let mut derived_from = base.derived_from.clone();
        for &variable in &other.derived_from {
            if !derived_from.contains(&variable) {
                derived_from.push(variable);
            }
        }
        if derived_from.contains(&other_variable) {
            return;
        }
        derived_from.push(other_variable);
        self.add_pending(Constraint {
            variable: target,
            ty: ty.clone(),
            kind,
            derived_from,
        });
    }

    fn run_is_subtype_of(&mut self, sub: &Type, sup: &Type) {
        if !is_subtype_of(self, sub, sup) {
            self.errors.push(ConstraintError {
                sub: sub.clone(),
                sup: sup.clone(),
            });
        }
    }

    /// Fix every variable, in dependency order where possible.
    pub fn fix_type_variables(&mut self) {
        while self.is_ok() {
            let unfixed: Vec<usize> = (0..self.variables.len())
                .filter(|&i| !self.fixed.contains_key(&self.variables[i].variable))
                .collect();
            let Some(&first) = unfixed.first() else {
                break;
            };
            let next = unfixed
                .iter()
                .copied()
                .find(|&i| {
                    self.nested_type_variables(i)
                        .iter()
                        .all(|v| self.fixed.contains_key(v))
                })
                .unwrap_or(first);
            self.fix_variable(next);
        }
    }

    fn nested_type_variables(&self, index: usize) -> Vec<ClassifierId> {
        let mut nested = Vec::new();
        for constraint in &self.variables[index].constraints {
            for ty in constraint.ty.all_types(self.classifiers) {
                if self.is_variable(ty.classifier()) {
                    nested.push(ty.classifier());
                }
            }
        }
        nested
    }

    fn fix_variable(&mut self, index: usize) {
        let variable = self.variables[index].variable;
        let variable_type = self.classifiers.default_type(variable);
        let Some(ty) = self.fixed_type(index) else {
            trace!(variable = ?variable, "only self-referential constraints");
            let constraint = self.variables[index].constraints.first().map(|c| c.ty.clone());
            self.errors.push(ConstraintError {
                sub: constraint.unwrap_or_else(Type::nullable_any),
                sup: variable_type,
            });
            return;
        };
        trace!(variable = ?variable, fixed = ?ty, "fix type variable");

        self.add_initial_equality_constraint(&variable_type, &ty);

        for (i, other) in self.variables.iter_mut().enumerate() {
            if i == index || self.fixed.contains_key(&other.variable) {
                continue;
            }
            other
                .constraints
                .retain(|c| !c.ty.any_type(&mut |t| t.classifier() == variable));
        }

        self.fixed.insert(variable, ty);
    }

    /// The binding for variable `index`, or `None` when every constraint
    /// mentions the variable itself (`T? <: T`, `@Tag T <: T`): no finite
    /// type satisfies those.
    fn fixed_type(&mut self, index: usize) -> Option<Type> {
        let variable = self.variables[index].variable;
        let constraints = self.variables[index].constraints.clone();
        let (usable, self_referential): (Vec<&Constraint>, Vec<&Constraint>) = constraints
            .iter()
            .partition(|c| !c.ty.any_type(&mut |t| t.classifier() == variable));
        if usable.is_empty() && !self_referential.is_empty() {
            return None;
        }
        let of_kind = |kind: ConstraintKind| -> Vec<Type> {
            usable
                .iter()
                .filter(|c| c.kind == kind)
                .map(|c| c.ty.clone())
                .collect()
        };

        let equal = of_kind(ConstraintKind::Equal);
        if let Some(representative) = self.single_best_representative(&equal) {
            return Some(representative);
        }

        let lower = of_kind(ConstraintKind::Lower);
        let upper = of_kind(ConstraintKind::Upper);

        let sub = (!lower.is_empty()).then(|| common_super_type(self, &lower));
        let sup = (!upper.is_empty()).then(|| intersect_types(self, &upper));

        let fixed = match (sub, sup) {
            (Some(sub), Some(sup)) => {
                if self.is_suitable_type(&sub, &constraints) {
                    sub
                } else if self.is_suitable_type(&sup, &constraints) {
                    sup
                } else {
                    sub
                }
            }
            (Some(ty), None) | (None, Some(ty)) => ty,
            (None, None) => Type::nullable_any(),
        };
        Some(fixed)
    }

    fn single_best_representative(&mut self, types: &[Type]) -> Option<Type> {
        if types.len() == 1 {
            return types.first().cloned();
        }
        types
            .iter()
            .find(|candidate| types.iter().all(|other| is_equal_to(self, candidate, other)))
            .cloned()
    }

    fn is_suitable_type(&mut self, result: &Type, constraints: &[Constraint]) -> bool {
        if result.classifier() == ClassifierId::NOTHING {
            return false;
        }
        constraints.iter().all(|c| match c.kind {
            ConstraintKind::Equal => is_equal_to(self, &c.ty, result),
            ConstraintKind::Lower => is_subtype_of(self, &c.ty, result),
            ConstraintKind::Upper => is_subtype_of(self, result, &c.ty),
        })
    }

    fn add_upper_constraint(&mut self, variable: &Type, sup: &Type) -> bool {
        self.add_pending(Constraint::new(variable.classifier(), sup.clone(), ConstraintKind::Upper));
        if variable.is_marked_nullable() {
            let nullable_nothing = Type::nothing().nullable();
            return self.is_variable(sup.classifier()) || is_subtype_of(self, &nullable_nothing, sup);
        }
        true
    }

    fn add_lower_constraint(&mut self, variable: &Type, sub: &Type) -> bool {
        self.add_pending(Constraint::new(variable.classifier(), sub.clone(), ConstraintKind::Lower));
        true
    }
}

impl TypeCheckerContext for InferenceContext<'_> {
    fn classifiers(&self) -> &Classifiers {
        self.classifiers
    }

    fn is_denotable(&self, ty: &Type) -> bool {
        !self.is_variable(ty.classifier())
    }

    fn add_sub_type_constraint(&mut self, sub: &Type, sup: &Type) -> Option<bool> {
        let mut answer = None;
        if self.is_variable(sup.classifier()) {
            answer = Some(self.add_lower_constraint(sup, sub));
        }
        if self.is_variable(sub.classifier()) {
            let upper = self.add_upper_constraint(sub, sup);
            return Some(upper && answer.unwrap_or(true));
        }
        answer
    }
}

/// Infer bindings that make `sub` a subtype of `sup`.
///
/// Type parameters of `sub` (and of `sup` when
/// `collect_super_type_variables` is set) are variables, except those in
/// `static_type_parameters`.
pub fn run_candidate_inference<'a>(
    classifiers: &'a Classifiers,
    sub: &Type,
    sup: &Type,
    static_type_parameters: &[ClassifierId],
    collect_super_type_variables: bool,
) -> InferenceContext<'a> {
    let mut context = InferenceContext::new(classifiers);
    for &parameter in static_type_parameters {
        context.add_static_type_parameter(parameter);
    }
    for ty in sub.all_types(classifiers) {
        if classifiers.is_type_parameter(ty.classifier()) {
            context.add_type_variable(ty.classifier());
        }
    }
    if collect_super_type_variables {
        for ty in sup.all_types(classifiers) {
            if classifiers.is_type_parameter(ty.classifier()) {
                context.add_type_variable(ty.classifier());
            }
        }
    }

    context.add_initial_sub_type_constraint(sub, sup);
    context.fix_type_variables();
    context
}

/// Staged inference for add-on rules.
///
/// The candidate's own type parameters are rigid; the parameters of the
/// add-on's constraint type are the variables. `constraint_type` is the
/// add-on type parameter, `candidate_type` a type some injectable produces.
pub fn run_add_on_inference<'a>(
    classifiers: &'a Classifiers,
    constraint_type: &Type,
    candidate_type: &Type,
    static_type_parameters: &[ClassifierId],
) -> InferenceContext<'a> {
    let mut rigid: Vec<ClassifierId> = candidate_type
        .all_types(classifiers)
        .iter()
        .map(Type::classifier)
        .filter(|&c| classifiers.is_type_parameter(c))
        .collect();
    rigid.extend_from_slice(static_type_parameters);
    run_candidate_inference(classifiers, candidate_type, constraint_type, &rigid, true)
}

/*!

End-to-end saturation scenarios and cross-component properties that are awkward to test inside a
single module: whole runs of the given-clause loop, randomised sharing/unification round trips,
and ordering stability under grounding substitutions.

*/

use std::time::Duration;

use rand::Rng;
use sable_abs::IString;

use crate::api::{CompositeISE, ImmediateSimplificationEngine, ImmediateSimplificationResult};
use crate::api::immediate::{DuplicateLiteralRemoval, TautologyDeletion, TrivialInequalityRemoval};
use crate::core::clause::ClauseStore;
use crate::core::context::RunContext;
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::options::{InductionMode, Options};
use crate::core::ordering::{KnuthBendixOrdering, OrderingResult, SimplificationOrdering};
use crate::core::problem::Problem;
use crate::core::saturation::{SaturationAlgorithm, TerminationReason};
use crate::core::sort::SortKind;
use crate::core::substitution::{BankIndex, RobSubstitution};
use crate::core::symbol::{Signature, SymbolIndex};
use crate::core::term::{TermBuilder, TermId, TermStore, VariableIndex};

fn test_options() -> Options {
  Options {
    time_limit: Some(Duration::from_secs(30)),
    ..Options::default()
  }
}

// region Saturation scenarios

#[test]
fn resolution_refutes_complementary_units() {
  // { p(a) } and { ~p(X0) } close in one resolution step.
  let mut signature = Signature::new();
  let sort = signature.default_sort();
  let p = signature.add_predicate(IString::from("p"), &[sort]);
  let a = signature.add_constant(IString::from("a"), sort);

  let mut prover = SaturationAlgorithm::create(signature, test_options(), false);
  let ctx = prover.context().clone();

  let (pa, npx) = {
    let store = &mut *ctx.terms.borrow_mut();
    let ca = store.share(&TermBuilder::constant(a));
    let x  = store.share(&TermBuilder::var(0));
    (
      store.mk_literal(p, true, &[ca], None),
      store.mk_literal(p, false, &[x], None),
    )
  };

  let mut problem = Problem::new();
  problem.add_clause(vec![pa]);
  problem.add_clause(vec![npx]);
  prover.add_input(&problem);

  let result = prover.run();
  assert_eq!(result.reason, TerminationReason::Refutation);

  let derivation = prover.refutation().expect("a refutation was reported");
  assert!(derivation.contains_rule(InferenceRule::BinaryResolution));
  let empty = derivation.nodes.last().unwrap().0;
  assert!(ctx.clauses.borrow().get(empty).is_empty());
}

#[test]
fn forward_demodulation_rewrites_the_premise() {
  // { f(a) = b } with f(a) > b rewrites { p(f(a)) } to { p(b) }.
  let mut signature = Signature::new();
  let sort = signature.default_sort();
  let p = signature.add_predicate(IString::from("p"), &[sort]);
  let f = signature.add_function(IString::from("f"), &[sort], sort);
  let a = signature.add_constant(IString::from("a"), sort);
  let b = signature.add_constant(IString::from("b"), sort);

  let mut prover = SaturationAlgorithm::create(signature, test_options(), true);
  let ctx = prover.context().clone();

  let (equation, pfa, pb_literal) = {
    let store = &mut *ctx.terms.borrow_mut();
    let ca = store.share(&TermBuilder::constant(a));
    let cb = store.share(&TermBuilder::constant(b));
    let fa = store.mk_function(f, &[ca]);
    (
      store.mk_equality(true, fa, cb, None),
      store.mk_literal(p, true, &[fa], None),
      store.mk_literal(p, true, &[cb], None),
    )
  };

  let mut problem = Problem::new();
  problem.has_equality = true;
  problem.add_clause(vec![equation]);
  problem.add_clause(vec![pfa]);
  prover.add_input(&problem);

  let result = prover.run();
  assert_eq!(result.reason, TerminationReason::Satisfiable);
  assert_eq!(ctx.statistics.borrow().forward_demodulations, 1);

  // The rewritten clause survived; the original was retired.
  let arena = ctx.clauses.borrow();
  let mut saw_rewritten = false;
  let mut saw_original = false;
  for number in 0..arena.len() {
    let clause = arena.get(crate::core::clause::ClauseId(number as u32));
    if clause.is_unit() && clause.literals[0] == pb_literal {
      saw_rewritten = true;
      assert_eq!(clause.store, ClauseStore::Active);
    }
    if clause.is_unit() && clause.literals[0] == pfa {
      saw_original = true;
      assert_eq!(clause.store, ClauseStore::Removed);
    }
  }
  assert!(saw_rewritten && saw_original);
}

#[test]
fn structural_induction_closes_the_nat_goal() {
  // nat = zero | succ(nat); { p(zero) }, { ~p(X0), p(succ(X0)) }, goal { ~p(sk) }.
  let mut signature = Signature::new();
  let nat = signature.add_sort(IString::from("nat"), SortKind::Inductive);
  let zero = signature.add_constructor(IString::from("zero"), &[], nat);
  let succ = signature.add_constructor(IString::from("succ"), &[nat], nat);
  let p  = signature.add_predicate(IString::from("p"), &[nat]);
  let sk = signature.fresh_skolem_function(&[], nat);

  let options = Options {
    induction: InductionMode::Struct,
    ..test_options()
  };
  let mut prover = SaturationAlgorithm::create(signature, options, false);
  let ctx = prover.context().clone();

  let (base, step_neg, step_pos, goal) = {
    let store = &mut *ctx.terms.borrow_mut();
    let zero_term = store.mk_function(zero, &[]);
    let x  = store.share(&TermBuilder::var(0));
    let sx = store.mk_function(succ, &[x]);
    let sk_term = store.mk_function(sk, &[]);
    (
      store.mk_literal(p, true, &[zero_term], None),
      store.mk_literal(p, false, &[x], None),
      store.mk_literal(p, true, &[sx], None),
      store.mk_literal(p, false, &[sk_term], None),
    )
  };

  let mut problem = Problem::new();
  problem.add_clause(vec![base]);
  problem.add_clause(vec![step_neg, step_pos]);
  problem.add_clause(vec![goal]);
  prover.add_input(&problem);

  let result = prover.run();
  assert_eq!(result.reason, TerminationReason::Refutation);

  let derivation = prover.refutation().expect("a refutation was reported");
  assert!(derivation.contains_rule(InferenceRule::StructuralInduction));
  assert!(ctx.statistics.borrow().structural_induction_applications >= 1);
}

#[test]
fn integer_induction_produces_the_three_schema_clauses() {
  // { ~pi(sK) } with the bound { ~(sK < 1) }: upward infinite induction from 1.
  let mut signature = Signature::new();
  let int  = signature.integer_sort();
  let less = signature.integer_less();
  let sum  = signature.integer_sum();
  let one  = signature.numeral(sable_abs::numeric::int_one());
  let pi   = signature.add_predicate(IString::from("pi"), &[int]);
  let sk   = signature.fresh_skolem_function(&[], int);

  let options = Options {
    induction: InductionMode::Int,
    ..test_options()
  };
  let mut prover = SaturationAlgorithm::create(signature, options, false);
  let ctx = prover.context().clone();

  let (goal, bound, one_term) = {
    let store = &mut *ctx.terms.borrow_mut();
    let sk_term  = store.mk_function(sk, &[]);
    let one_term = store.mk_function(one, &[]);
    (
      store.mk_literal(pi, false, &[sk_term], None),
      store.mk_literal(less, false, &[sk_term, one_term], None),
      one_term,
    )
  };

  let mut problem = Problem::new();
  problem.add_clause(vec![goal]);
  problem.add_clause(vec![bound]);
  prover.add_input(&problem);

  let result = prover.run();
  assert_ne!(result.reason, TerminationReason::TimeLimit);
  assert_eq!(ctx.statistics.borrow().integer_induction_applications, 1);

  // Exactly the base/guard, hypothesis, and step clauses, over one fresh Skolem k.
  let store = ctx.terms.borrow();
  let arena = ctx.clauses.borrow();
  let schema: Vec<Vec<LiteralId>> = (0..arena.len() as u32)
      .map(crate::core::clause::ClauseId)
      .filter(|&c| arena.get(c).inference.rule == InferenceRule::IntegerInduction)
      .map(|c| arena.get(c).literals.to_vec())
      .collect();
  assert_eq!(schema.len(), 3);

  // Every schema clause contains the negated base ~pi(1).
  let negated_base = schema[0][0];
  {
    let shared = store.literal(negated_base);
    assert_eq!(shared.predicate, pi);
    assert!(!shared.polarity);
    assert_eq!(shared.args[0], one_term);
  }
  assert!(schema.iter().all(|c| c.contains(&negated_base)));

  // Find the hypothesis clause pi(k); k names the step Skolem.
  let k_term: TermId = schema
      .iter()
      .flatten()
      .find_map(|&l| {
        let shared = store.literal(l);
        (shared.predicate == pi && shared.polarity).then(|| shared.args[0])
      })
      .expect("hypothesis literal present");

  let mut saw_guard = false;
  let mut saw_step  = false;
  for clause in schema.iter() {
    for &literal in clause.iter() {
      let shared = store.literal(literal);
      if shared.predicate == less && !shared.polarity {
        // ~(k < 1)
        assert_eq!(shared.args[0], k_term);
        assert_eq!(shared.args[1], one_term);
        saw_guard = true;
      }
      if shared.predicate == pi && !shared.polarity && shared.args[0] != one_term {
        // ~pi(k + 1)
        let step = store.term(shared.args[0]);
        assert_eq!(step.symbol(), Some(sum));
        assert_eq!(step.args()[0], k_term);
        saw_step = true;
      }
    }
  }
  assert!(saw_guard && saw_step);
}

#[test]
fn forward_subsumption_removes_the_instance() {
  // { p(X0), q(X0) } subsumes { p(a), q(a), r(b) }.
  let mut signature = Signature::new();
  let sort = signature.default_sort();
  let p = signature.add_predicate(IString::from("p"), &[sort]);
  let q = signature.add_predicate(IString::from("q"), &[sort]);
  let r = signature.add_predicate(IString::from("r"), &[sort]);
  let a = signature.add_constant(IString::from("a"), sort);
  let b = signature.add_constant(IString::from("b"), sort);

  let mut prover = SaturationAlgorithm::create(signature, test_options(), false);
  let ctx = prover.context().clone();

  let (px, qx, pa, qa, rb) = {
    let store = &mut *ctx.terms.borrow_mut();
    let x  = store.share(&TermBuilder::var(0));
    let ca = store.share(&TermBuilder::constant(a));
    let cb = store.share(&TermBuilder::constant(b));
    (
      store.mk_literal(p, true, &[x], None),
      store.mk_literal(q, true, &[x], None),
      store.mk_literal(p, true, &[ca], None),
      store.mk_literal(q, true, &[ca], None),
      store.mk_literal(r, true, &[cb], None),
    )
  };

  let mut problem = Problem::new();
  problem.add_clause(vec![px, qx]);
  problem.add_clause(vec![pa, qa, rb]);
  prover.add_input(&problem);

  let result = prover.run();
  assert_eq!(result.reason, TerminationReason::Satisfiable);
  assert_eq!(ctx.statistics.borrow().forward_subsumed, 1);
}

#[test]
fn single_unit_saturates() {
  let mut signature = Signature::new();
  let sort = signature.default_sort();
  let p = signature.add_predicate(IString::from("p"), &[sort]);
  let a = signature.add_constant(IString::from("a"), sort);

  let mut prover = SaturationAlgorithm::create(signature, test_options(), false);
  let ctx = prover.context().clone();

  let pa = {
    let store = &mut *ctx.terms.borrow_mut();
    let ca = store.share(&TermBuilder::constant(a));
    store.mk_literal(p, true, &[ca], None)
  };

  let mut problem = Problem::new();
  problem.add_clause(vec![pa]);
  prover.add_input(&problem);

  let result = prover.run();
  assert_eq!(result.reason, TerminationReason::Satisfiable);
  assert!(result.refutation.is_none());
}

// endregion

// region Randomised structural properties

fn random_signature() -> (Signature, Vec<(SymbolIndex, usize)>) {
  let mut signature = Signature::new();
  let sort = signature.default_sort();
  let mut pool = Vec::new();
  for (name, arity) in [("a", 0), ("b", 0), ("f", 1), ("g", 2), ("h", 2)] {
    let arg_sorts = vec![sort; arity];
    let symbol = signature.add_function(IString::from(name), &arg_sorts, sort);
    pool.push((symbol, arity));
  }
  (signature, pool)
}

fn random_builder(pool: &[(SymbolIndex, usize)], depth: usize, rng: &mut impl Rng) -> TermBuilder {
  if depth == 0 || rng.random_range(0..4) == 0 {
    if rng.random_range(0..2) == 0 {
      return TermBuilder::var(rng.random_range(0..3));
    }
    let constants: Vec<_> = pool.iter().filter(|(_, a)| *a == 0).collect();
    let (symbol, _) = constants[rng.random_range(0..constants.len())];
    return TermBuilder::constant(*symbol);
  }
  let (symbol, arity) = pool[rng.random_range(0..pool.len())];
  let args = (0..arity).map(|_| random_builder(pool, depth - 1, rng)).collect();
  TermBuilder::Function(symbol, args)
}

fn walker_weight(store: &TermStore, t: TermId) -> u32 {
  1 + store.term(t).args().iter().map(|&a| walker_weight(store, a)).sum::<u32>()
}

#[test]
fn sharing_is_canonical_on_random_terms() {
  let (_signature, pool) = random_signature();
  let mut store = TermStore::new();
  let mut rng = rand::rng();

  for _ in 0..200 {
    let builder = random_builder(&pool, 4, &mut rng);
    let first  = store.share(&builder);
    let second = store.share(&builder);
    assert_eq!(first, second, "structurally equal terms share one representative");

    // Metadata agrees with an independent walker.
    assert_eq!(store.weight(first), walker_weight(&store, first));
    let vars = store.variable_set(first);
    assert_eq!(store.is_ground(first), vars.is_empty());
    assert_eq!(store.distinct_vars(first) as usize, vars.len());
  }
}

#[test]
fn unification_on_random_terms_is_sound_and_minimal() {
  let (_signature, pool) = random_signature();
  let mut store = TermStore::new();
  let mut rng = rand::rng();

  for _ in 0..200 {
    let s = {
      let builder = random_builder(&pool, 3, &mut rng);
      store.share(&builder)
    };
    let t = {
      let builder = random_builder(&pool, 3, &mut rng);
      store.share(&builder)
    };

    let mut subst = RobSubstitution::new();
    if subst.unify(&store, s, BankIndex::QUERY, t, BankIndex::RESULT) {
      let s_image = subst.apply_term(&mut store, s, BankIndex::QUERY);
      let t_image = subst.apply_term(&mut store, t, BankIndex::RESULT);
      assert_eq!(s_image, t_image, "a reported unifier must actually unify");
    } else {
      // Failure leaves no bindings behind.
      assert_eq!(subst.binding_count(), 0);
    }
  }
}

#[test]
fn matching_implies_unification() {
  let (_signature, pool) = random_signature();
  let mut store = TermStore::new();
  let mut rng = rand::rng();

  for _ in 0..200 {
    let base = {
      let builder = random_builder(&pool, 3, &mut rng);
      store.share(&builder)
    };
    // Ground instances only: matching must then reproduce the instance exactly.
    let instance = {
      let grounded = random_builder(&pool, 3, &mut rng);
      store.share(&grounded)
    };

    let mut matcher = RobSubstitution::new();
    if matcher.match_terms(&store, base, BankIndex::RESULT, instance, BankIndex::QUERY) {
      let image = matcher.apply_term(&mut store, base, BankIndex::RESULT);
      if store.is_ground(instance) {
        assert_eq!(image, instance);
      }
      let mut unifier = RobSubstitution::new();
      assert!(unifier.unify(&store, base, BankIndex::RESULT, instance, BankIndex::QUERY));
    }
  }
}

#[test]
fn kbo_greater_is_stable_under_grounding() {
  let (signature, pool) = random_signature();
  let mut store = TermStore::new();
  let kbo = KnuthBendixOrdering::new(sable_abs::rc_cell(signature));
  let mut rng = rand::rng();

  let ground_image = {
    let constants: Vec<_> = pool.iter().filter(|(_, a)| *a == 0).map(|(s, _)| *s).collect();
    let c0 = store.mk_function(constants[0], &[]);
    let c1 = store.mk_function(constants[1], &[]);
    let f  = pool.iter().find(|(_, a)| *a == 1).map(|(s, _)| *s).unwrap();
    let fc = store.mk_function(f, &[c1]);
    vec![Some(c0), Some(fc), Some(c1)]
  };

  for _ in 0..200 {
    let s = {
      let builder = random_builder(&pool, 3, &mut rng);
      store.share(&builder)
    };
    let t = {
      let builder = random_builder(&pool, 3, &mut rng);
      store.share(&builder)
    };
    if kbo.compare(&store, s, t) == OrderingResult::Greater {
      let s_ground = store.instantiate(s, &ground_image);
      let t_ground = store.instantiate(t, &ground_image);
      let after = kbo.compare(&store, s_ground, t_ground);
      assert!(
        matches!(after, OrderingResult::Greater | OrderingResult::GreaterEq),
        "orientation must survive instantiation"
      );
    }
  }
}

// endregion

// region Immediate simplification invariants

#[test]
fn immediate_simplification_is_idempotent() {
  let mut signature = Signature::new();
  let sort = signature.default_sort();
  let p = signature.add_predicate(IString::from("p"), &[sort]);
  let a = signature.add_constant(IString::from("a"), sort);
  let ctx = RunContext::new(signature, test_options());

  let (pa, neq) = {
    let store = &mut *ctx.terms.borrow_mut();
    let ca = store.share(&TermBuilder::constant(a));
    let x  = store.mk_variable(VariableIndex(0));
    (
      store.mk_literal(p, true, &[ca], None),
      store.mk_equality(false, x, x, Some(crate::core::sort::SortId(0))),
    )
  };
  let clause = ctx.clauses.borrow_mut().create(
    &ctx.terms.borrow(),
    &[pa, pa, neq],
    crate::core::inference::Inference::input(),
    0,
  );

  let mut composite = CompositeISE::new();
  composite.add_front(Box::new(TrivialInequalityRemoval::new()));
  composite.add_front(Box::new(TautologyDeletion::new()));
  composite.add_front(Box::new(DuplicateLiteralRemoval::new()));

  let once = match composite.simplify(&ctx, clause) {
    ImmediateSimplificationResult::Replaced(c) => c,
    other => panic!("expected a replacement, got {:?}", other),
  };
  // p(a) twice and X0 != X0 collapse to the single literal.
  assert_eq!(ctx.clauses.borrow().get(once).len(), 1);

  // A second pass finds nothing left to do.
  assert_eq!(composite.simplify(&ctx, once), ImmediateSimplificationResult::Unchanged);
}

// endregion

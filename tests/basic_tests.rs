use constrainedrandom::{RandObj, Value, VarSpec};

#[test]
fn test_sum_constraint_terminates_and_satisfies() {
    let mut obj = RandObj::new(0);
    obj.add_rand_var("a", VarSpec::range(0, 10)).unwrap();
    obj.add_rand_var("b", VarSpec::range(0, 10)).unwrap();
    obj.add_constraint(
        |args: &[Value]| args[0].as_int().unwrap() + args[1].as_int().unwrap() > 5,
        &["a", "b"],
    )
    .unwrap();

    obj.randomize().unwrap();
    let a = obj.get_int("a").unwrap();
    let b = obj.get_int("b").unwrap();
    assert!((0..10).contains(&a) && (0..10).contains(&b));
    assert!(a + b > 5);
}

#[test]
fn test_loose_multivar_problem_many_iterations() {
    let mut obj = RandObj::new(0);
    obj.add_rand_var("a", VarSpec::range(0, 10)).unwrap();
    obj.add_rand_var("b", VarSpec::range(0, 100)).unwrap();
    obj.add_rand_var("c", VarSpec::bits(8)).unwrap();
    obj.add_constraint(
        |args: &[Value]| args[0].as_int().unwrap() * args[1].as_int().unwrap() < 1000,
        &["a", "b"],
    )
    .unwrap();

    for _ in 0..100 {
        obj.randomize().unwrap();
        let results = obj.get_results();
        assert!(results["a"].as_int().unwrap() * results["b"].as_int().unwrap() < 1000);
        assert!((0..256).contains(&results["c"].as_int().unwrap()));
    }
}

#[test]
fn test_plus_one_default_orders() {
    let mut obj = RandObj::new(0);
    obj.add_rand_var("x", VarSpec::range(0, 100)).unwrap();
    obj.add_rand_var("y", VarSpec::range(0, 100)).unwrap();
    obj.add_constraint(
        |args: &[Value]| args[1].as_int().unwrap() == args[0].as_int().unwrap() + 1,
        &["x", "y"],
    )
    .unwrap();

    for _ in 0..5 {
        obj.randomize().unwrap();
        assert_eq!(
            obj.get_int("y").unwrap(),
            obj.get_int("x").unwrap() + 1
        );
    }
}

#[test]
fn test_plus_one_with_order_hints_and_no_naive() {
    let mut obj = RandObj::new(0);
    obj.set_solver_mode(Some(false), None, None);
    obj.add_rand_var("x", VarSpec::range(0, 100).order(0)).unwrap();
    obj.add_rand_var("y", VarSpec::range(0, 100).order(1)).unwrap();
    obj.add_constraint(
        |args: &[Value]| args[1].as_int().unwrap() == args[0].as_int().unwrap() + 1,
        &["x", "y"],
    )
    .unwrap();

    for _ in 0..5 {
        obj.randomize().unwrap();
        assert_eq!(
            obj.get_int("y").unwrap(),
            obj.get_int("x").unwrap() + 1
        );
    }
}

#[test]
fn test_bits_variable_with_scalar_constraint() {
    let mut obj = RandObj::new(0);
    obj.add_rand_var("twelve_bits", VarSpec::bits(12).constraint(|x| x != 0))
        .unwrap();
    for _ in 0..50 {
        obj.randomize().unwrap();
        let v = obj.get_int("twelve_bits").unwrap();
        assert!((1..4096).contains(&v));
    }
}

#[test]
fn test_values_domain_respected() {
    let primes = [1, 3, 5, 7, 11];
    let mut obj = RandObj::new(0);
    obj.add_rand_var("prime", VarSpec::values(&primes)).unwrap();
    for _ in 0..50 {
        obj.randomize().unwrap();
        assert!(primes.contains(&obj.get_int("prime").unwrap()));
    }
}

#[test]
fn test_thorough_only_mode() {
    let mut obj = RandObj::new(0);
    obj.set_solver_mode(Some(false), Some(false), Some(true));
    obj.add_rand_var("a", VarSpec::range(0, 10)).unwrap();
    obj.add_rand_var("b", VarSpec::range(0, 10)).unwrap();
    obj.add_constraint(
        |args: &[Value]| args[0].as_int().unwrap() + args[1].as_int().unwrap() > 5,
        &["a", "b"],
    )
    .unwrap();

    for _ in 0..10 {
        obj.randomize().unwrap();
        assert!(obj.get_int("a").unwrap() + obj.get_int("b").unwrap() > 5);
    }
}

#[test]
fn test_function_domain_variable() {
    let mut obj = RandObj::new(0);
    obj.add_rand_var("fn_based", VarSpec::func(|rng| 2 * rng.randrange(0, 10)))
        .unwrap();
    for _ in 0..20 {
        obj.randomize().unwrap();
        let v = obj.get_int("fn_based").unwrap();
        assert!(v % 2 == 0 && (0..20).contains(&v));
    }
}

#[test]
fn test_mixed_orders_with_dependent_constraints() {
    // A chain of dependencies solvable group by group.
    let mut obj = RandObj::new(0);
    obj.set_solver_mode(Some(false), None, None);
    obj.add_rand_var("a", VarSpec::range(1, 10).order(0)).unwrap();
    obj.add_rand_var("b", VarSpec::range(1, 100).order(1)).unwrap();
    obj.add_rand_var("c", VarSpec::range(1, 1000).order(2)).unwrap();
    obj.add_constraint(
        |args: &[Value]| args[1].as_int().unwrap() % args[0].as_int().unwrap() == 0,
        &["a", "b"],
    )
    .unwrap();
    obj.add_constraint(
        |args: &[Value]| args[1].as_int().unwrap() > args[0].as_int().unwrap(),
        &["b", "c"],
    )
    .unwrap();

    for _ in 0..5 {
        obj.randomize().unwrap();
        let (a, b, c) = (
            obj.get_int("a").unwrap(),
            obj.get_int("b").unwrap(),
            obj.get_int("c").unwrap(),
        );
        assert_eq!(b % a, 0);
        assert!(c > b);
    }
}

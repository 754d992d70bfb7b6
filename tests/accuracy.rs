use ddnum::{
    norm::{euclidean, euclidean2, euclidean3, manhattan},
    transform::{scalb, two_product, two_square, two_sum},
    DoubleDouble, Sum,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rug::{Float, Rational};

const SAMPLES: usize = 2000;

fn exact(x: f64) -> Rational {
    Rational::from_f64(x).unwrap()
}

fn exact_dd(x: &DoubleDouble) -> Rational {
    exact(x.hi()) + exact(x.lo())
}

/// Sample `±m * 2^e` with `m` in `[1, 2)` and `e` in the given range.
fn sample<R: Rng>(rng: &mut R, min_exp: i32, max_exp: i32) -> f64 {
    let m: f64 = rng.gen_range(1.0..2.0);
    let s = if rng.gen::<bool>() { -m } else { m };
    scalb(s, rng.gen_range(min_exp..=max_exp))
}

/// Sample a normalized double-double with a random low part.
fn sample_dd<R: Rng>(rng: &mut R, min_exp: i32, max_exp: i32) -> DoubleDouble {
    let hi = sample(rng, min_exp, max_exp);
    let lo = hi * rng.gen_range(-1.0..1.0) * f64::EPSILON / 2.;
    DoubleDouble::of_sum(hi, lo)
}

/// Check that `got` is within `units` of `2^-106` relative to `expected`.
fn within(got: &DoubleDouble, expected: &Rational, units: u32) -> bool {
    let diff = Rational::from(exact_dd(got) - expected).abs();
    let bound = Rational::from(expected.clone().abs() * units) * exact(DoubleDouble::EPSILON);
    diff <= bound
}

/// Check [within] with an additional absolute slack of the smallest sub-normal.
fn within_subnormal(got: &DoubleDouble, expected: &Rational, units: u32) -> bool {
    let diff = Rational::from(exact_dd(got) - expected).abs();
    let bound = Rational::from(expected.clone().abs() * units) * exact(DoubleDouble::EPSILON)
        + exact(f64::from_bits(1));
    diff <= bound
}

#[test]
fn exact_sums() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(1);
    for _ in 0..SAMPLES {
        let a = sample(&mut rng, -1000, 1000);
        let b = sample(&mut rng, -1000, 1000);
        let (s, e) = two_sum(a, b);
        assert_eq!(exact(s) + exact(e), exact(a) + exact(b));

        let x = DoubleDouble::of_sum(a, b);
        assert_eq!(exact_dd(&x), exact(a) + exact(b));

        let x = DoubleDouble::of_difference(a, b);
        assert_eq!(exact_dd(&x), exact(a) - exact(b));
    }
}

#[test]
fn exact_products() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(2);
    for _ in 0..SAMPLES {
        let a = sample(&mut rng, -500, 500);
        let b = sample(&mut rng, -500, 500);
        let (p, e) = two_product(a, b);
        assert_eq!(exact(p) + exact(e), exact(a) * exact(b));

        let x = DoubleDouble::of_product(a, b);
        assert_eq!(exact_dd(&x), exact(a) * exact(b));

        let c = sample(&mut rng, -510, 510);
        let (p, e) = two_square(c);
        assert_eq!(exact(p) + exact(e), exact(c) * exact(c));
        assert_eq!(exact_dd(&DoubleDouble::of_square(c)), exact(c) * exact(c));
    }
}

#[test]
fn addition_bound() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(3);
    for _ in 0..SAMPLES {
        let a = sample_dd(&mut rng, -996, 996);
        let b = sample_dd(&mut rng, -996, 996);
        let f = sample(&mut rng, -996, 996);

        assert!(within(&(a + b), &(exact_dd(&a) + exact_dd(&b)), 4));
        assert!(within(&(a - b), &(exact_dd(&a) - exact_dd(&b)), 4));
        assert!(within(&(a + f), &(exact_dd(&a) + exact(f)), 2));
        assert!(within(&(a - f), &(exact_dd(&a) - exact(f)), 2));
    }
}

#[test]
fn subnormal_addition_bound() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(8);
    for _ in 0..SAMPLES {
        let a = sample_dd(&mut rng, -1074, -990);
        let b = sample_dd(&mut rng, -1074, -990);
        let f = sample(&mut rng, -1074, -1000);

        assert!(within_subnormal(&(a + b), &(exact_dd(&a) + exact_dd(&b)), 4));
        assert!(within_subnormal(&(a - b), &(exact_dd(&a) - exact_dd(&b)), 4));
        assert!(within_subnormal(&(a + f), &(exact_dd(&a) + exact(f)), 2));

        // near cancellation across the normal boundary
        let c = DoubleDouble::of_sum(-a.hi(), sample(&mut rng, -1074, -1040));
        assert!(within_subnormal(&(a + c), &(exact_dd(&a) + exact_dd(&c)), 4));
        let d = sample(&mut rng, -1030, -1015);
        let g = DoubleDouble::of_sum(d, sample(&mut rng, -1074, -1060));
        assert!(within_subnormal(&(g - d), &(exact_dd(&g) - exact(d)), 2));
    }

    let min = DoubleDouble::from_f64(f64::MIN_POSITIVE);
    let tiny = DoubleDouble::from_f64(f64::from_bits(1));
    assert_eq!((min - tiny).hi(), f64::MIN_POSITIVE - f64::from_bits(1));
    assert_eq!(tiny - tiny, DoubleDouble::ZERO);
}

#[test]
fn multiplication_bound() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(4);
    for _ in 0..SAMPLES {
        let a = sample_dd(&mut rng, -250, 250);
        let b = sample_dd(&mut rng, -250, 250);
        let f = sample(&mut rng, -250, 250);

        assert!(within(&(a * b), &(exact_dd(&a) * exact_dd(&b)), 4));
        assert!(within(&(a * f), &(exact_dd(&a) * exact(f)), 4));
        assert!(within(&a.square(), &(exact_dd(&a) * exact_dd(&a)), 4));
        assert!(within(&(a / b), &(exact_dd(&a) / exact_dd(&b)), 4));
        assert!(within(&(a / f), &(exact_dd(&a) / exact(f)), 1));
        assert!(within(&a.reciprocal(), &exact_dd(&a).recip(), 4));
    }
}

#[test]
fn square_root_bound() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(5);
    for _ in 0..SAMPLES {
        let a = sample_dd(&mut rng, -1000, 1000).abs();
        let expected = Float::with_val(300, exact_dd(&a)).sqrt();
        assert!(within(&a.sqrt(), &expected.to_rational().unwrap(), 4));
    }
}

#[test]
fn compensated_sums() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(6);
    for _ in 0..100 {
        let terms: Vec<f64> = (0..50).map(|_| sample(&mut rng, -20, 20)).collect();
        let factors: Vec<f64> = (0..50).map(|_| sample(&mut rng, -20, 20)).collect();

        let sum: Rational = terms.iter().map(|t| exact(*t)).sum();
        let expected = Float::with_val(53, &sum).to_f64();
        let s = Sum::of_all(&terms);
        assert!((s.value() - expected).abs() <= expected.abs() * f64::EPSILON);

        let dot: Rational = terms
            .iter()
            .zip(&factors)
            .map(|(a, b)| exact(*a) * exact(*b))
            .sum();
        let s = Sum::of_products(&terms, &factors).unwrap();
        let expected = Float::with_val(53, &dot).to_f64();
        assert!((s.value() - expected).abs() <= expected.abs() * f64::EPSILON);

        let abs: Vec<f64> = terms.iter().map(|x| x.abs()).collect();
        assert_eq!(manhattan(&terms), Ok(Sum::of_all(&abs).value()));
    }
}

#[test]
fn euclidean_norms() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(7);
    let norm = |v: &[f64]| {
        let squares: Rational = v.iter().map(|x| exact(*x) * exact(*x)).sum();
        Float::with_val(300, squares).sqrt().to_f64()
    };

    for _ in 0..200 {
        let (lo, hi) = match rng.gen_range(0..3) {
            0 => (-1000, -600),
            1 => (-300, 300),
            _ => (600, 1000),
        };

        let x = sample(&mut rng, lo, hi);
        let y = sample(&mut rng, lo, hi);
        let z = sample(&mut rng, lo, hi);
        let v: Vec<f64> = (0..20).map(|_| sample(&mut rng, lo, hi)).collect();

        let ulp = |e: f64| e * f64::EPSILON;
        let e = norm(&[x, y]);
        assert!((euclidean2(x, y) - e).abs() <= ulp(e));
        let e = norm(&[x, y, z]);
        assert!((euclidean3(x, y, z) - e).abs() <= ulp(e));
        let e = norm(&v);
        assert!((euclidean(&v).unwrap() - e).abs() <= ulp(e));
    }
}

#[test]
fn mixed_range_euclidean_norms() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(9);
    let norm = |v: &[f64]| {
        let squares: Rational = v.iter().map(|x| exact(*x) * exact(*x)).sum();
        Float::with_val(300, squares).sqrt().to_f64()
    };
    // sub-normal norms are rounded to the sub-normal spacing
    let ulp = |e: f64| (e * f64::EPSILON).max(f64::from_bits(1));

    for _ in 0..300 {
        // around the large and small thresholds, or across the whole range
        let (lo, hi) = match rng.gen_range(0..3) {
            0 => (456, 536),
            1 => (-560, -470),
            _ => (-1074, 1000),
        };

        let v: Vec<f64> = (0..rng.gen_range(2..20))
            .map(|_| sample(&mut rng, lo, hi))
            .collect();
        let e = norm(&v);
        assert!((euclidean(&v).unwrap() - e).abs() <= ulp(e));

        let e = norm(&v[..2]);
        assert!((euclidean2(v[0], v[1]) - e).abs() <= ulp(e));

        let z = sample(&mut rng, lo, hi);
        let e = norm(&[v[0], v[1], z]);
        assert!((euclidean3(v[0], v[1], z) - e).abs() <= ulp(e));
    }

    // one entry in each bucket
    let v = [3e300, 4e10, 5e-300];
    let e = norm(&v);
    assert!((euclidean(&v).unwrap() - e).abs() <= ulp(e));
    let v = [3e-160, 4e-150, 5e-170];
    let e = norm(&v);
    assert!((euclidean(&v).unwrap() - e).abs() <= ulp(e));
}

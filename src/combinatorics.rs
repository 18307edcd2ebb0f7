//! Combinatorial utilities: weak compositions of an integer and the partial
//! Bell polynomials that drive the chain-rule expansions.

use crate::domains::rational::Rational;
use crate::domains::Ring;

/// An iterator that generates all weak compositions of `n` into `parts`
/// non-negative parts, in lexicographic order.
///
/// The iterator mutates its state and yields a reference instead of a copy.
pub struct CompositionIterator {
    n: usize,
    state: Vec<usize>,
    init: bool,
    done: bool,
}

impl CompositionIterator {
    pub fn new(n: usize, parts: usize) -> CompositionIterator {
        CompositionIterator {
            n,
            state: vec![0; parts],
            init: false,
            done: parts == 0 && n > 0,
        }
    }

    /// Return the next composition, or `None` when exhausted.
    pub fn next(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }

        if !self.init {
            // first composition: everything in the last part
            self.init = true;
            if let Some(l) = self.state.last_mut() {
                *l = self.n;
            } else if self.n > 0 {
                self.done = true;
                return None;
            }
            return Some(&self.state);
        }

        // move one unit from the tail into the rightmost position that can
        // still grow
        let k = self.state.len();
        if k == 0 {
            self.done = true;
            return None;
        }
        let mut tail = self.state[k - 1];
        for i in (0..k - 1).rev() {
            if tail > 0 {
                self.state[i] += 1;
                tail -= 1;
                self.state[k - 1] = tail;
                for j in i + 1..k - 1 {
                    self.state[k - 1] += self.state[j];
                    self.state[j] = 0;
                }
                return Some(&self.state);
            }
            tail += self.state[i];
            self.state[i] = 0;
        }

        self.done = true;
        None
    }
}

/// The partial (exponential) Bell polynomial `B_{n,k}` evaluated at the
/// arguments `x[0] = x_1, x[1] = x_2, ...`, through the recurrence
/// `B_{n,k} = sum_j binom(n-1, j-1) x_j B_{n-j,k-1}`.
pub fn partial_bell<R: Ring>(ring: &R, n: usize, k: usize, x: &[R::Element]) -> R::Element {
    assert!(
        x.len() >= n.saturating_sub(k) + 1 || n == 0,
        "Not enough arguments for the Bell polynomial"
    );

    if n == 0 && k == 0 {
        return ring.one();
    }
    if n == 0 || k == 0 || k > n {
        return ring.zero();
    }

    let mut r = ring.zero();
    for j in 1..=n - k + 1 {
        let b = Rational::binomial(n as u64 - 1, j as u64 - 1);
        let rec = partial_bell(ring, n - j, k - 1, x);
        let mut t = ring.mul(&x[j - 1], &rec);
        ring.mul_assign(&mut t, &ring.nth(b.to_i64().expect("Binomial overflows i64")));
        ring.add_assign(&mut r, &t);
    }
    r
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::rational::{Rational, Q};

    #[test]
    fn compositions() {
        let mut it = CompositionIterator::new(2, 3);
        let mut seen = vec![];
        while let Some(c) = it.next() {
            seen.push(c.to_vec());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 0, 2],
                vec![0, 1, 1],
                vec![0, 2, 0],
                vec![1, 0, 1],
                vec![1, 1, 0],
                vec![2, 0, 0],
            ]
        );
    }

    #[test]
    fn compositions_of_zero() {
        let mut it = CompositionIterator::new(0, 2);
        assert_eq!(it.next(), Some(&[0usize, 0][..]));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn bell_values() {
        let x: Vec<Rational> = (1..=6).map(Rational::from).collect();
        // B_{n,1} = x_n
        assert_eq!(partial_bell(&Q, 4, 1, &x), Rational::from(4));
        // B_{3,2} = 3 x_1 x_2
        assert_eq!(partial_bell(&Q, 3, 2, &x), Rational::from(6));
        // B_{4,2} = 3 x_2^2 + 4 x_1 x_3
        assert_eq!(partial_bell(&Q, 4, 2, &x), Rational::from(24));
        // B_{n,n} = x_1^n
        assert_eq!(partial_bell(&Q, 5, 5, &x), Rational::one());
    }
}

//! Dense matrices over a generic ring, with exact right-kernel extraction
//! over fields and a fraction-free determinant over integral domains.

use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use crate::domains::fraction::{Fraction, FractionField, FractionNormalization};
use crate::domains::{EuclideanDomain, Field, InternalOrdering, Ring};

#[derive(Debug, Eq, PartialEq)]
pub enum MatrixError {
    ShapeMismatch,
    NotSquare,
}

impl Display for MatrixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixError::ShapeMismatch => write!(f, "Matrix shapes are incompatible"),
            MatrixError::NotSquare => write!(f, "The matrix is not square"),
        }
    }
}

impl std::error::Error for MatrixError {}

/// A matrix with `nrows` rows and `ncols` columns, stored in row-major order.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Matrix<F: Ring> {
    data: Vec<F::Element>,
    nrows: u32,
    ncols: u32,
    field: F,
}

impl<F: Ring> Matrix<F> {
    /// Create a new zeroed matrix with `nrows` rows and `ncols` columns.
    pub fn new(nrows: u32, ncols: u32, field: F) -> Matrix<F> {
        Matrix {
            data: vec![field.zero(); nrows as usize * ncols as usize],
            nrows,
            ncols,
            field,
        }
    }

    /// Create a new identity matrix with `nrows` rows and columns.
    pub fn identity(nrows: u32, field: F) -> Matrix<F> {
        let mut m = Matrix::new(nrows, nrows, field);
        for i in 0..nrows as usize {
            m.data[i * nrows as usize + i] = m.field.one();
        }
        m
    }

    /// Convert a linear representation of a matrix to a `Matrix`.
    pub fn from_linear(
        data: Vec<F::Element>,
        nrows: u32,
        ncols: u32,
        field: F,
    ) -> Result<Matrix<F>, MatrixError> {
        if data.len() != nrows as usize * ncols as usize {
            return Err(MatrixError::ShapeMismatch);
        }
        Ok(Matrix {
            data,
            nrows,
            ncols,
            field,
        })
    }

    /// Convert a vector of rows to a `Matrix`.
    pub fn from_nested_vec(
        matrix: Vec<Vec<F::Element>>,
        field: F,
    ) -> Result<Matrix<F>, MatrixError> {
        let mut data = vec![];
        let nrows = matrix.len() as u32;
        let mut ncols = 0;

        for d in matrix {
            if ncols == 0 {
                ncols = d.len() as u32;
            } else if d.len() as u32 != ncols {
                return Err(MatrixError::ShapeMismatch);
            }
            data.extend(d);
        }

        Ok(Matrix {
            data,
            nrows,
            ncols,
            field,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows as usize
    }

    pub fn ncols(&self) -> usize {
        self.ncols as usize
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn row(&self, r: usize) -> &[F::Element] {
        &self.data[r * self.ncols as usize..(r + 1) * self.ncols as usize]
    }

    pub fn into_vec(self) -> Vec<F::Element> {
        self.data
    }

    /// Return the transposed matrix.
    pub fn transpose(&self) -> Matrix<F> {
        let mut m = Matrix::new(self.ncols, self.nrows, self.field.clone());
        for i in 0..self.nrows as usize {
            for j in 0..self.ncols as usize {
                m.data[j * self.nrows as usize + i] = self[(i as u32, j as u32)].clone();
            }
        }
        m
    }

    /// Apply a function to every entry.
    pub fn map<G: Ring>(&self, f: impl Fn(&F::Element) -> G::Element, field: G) -> Matrix<G> {
        Matrix {
            data: self.data.iter().map(f).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
            field,
        }
    }

    /// Multiply two matrices.
    pub fn mul(&self, rhs: &Matrix<F>) -> Result<Matrix<F>, MatrixError> {
        if self.ncols != rhs.nrows {
            return Err(MatrixError::ShapeMismatch);
        }

        let mut m = Matrix::new(self.nrows, rhs.ncols, self.field.clone());
        for i in 0..self.nrows as usize {
            for j in 0..rhs.ncols as usize {
                let mut e = self.field.zero();
                for k in 0..self.ncols as usize {
                    self.field.add_mul_assign(
                        &mut e,
                        &self.data[i * self.ncols as usize + k],
                        &rhs.data[k * rhs.ncols as usize + j],
                    );
                }
                m.data[i * rhs.ncols as usize + j] = e;
            }
        }
        Ok(m)
    }

    /// Compute the determinant with fraction-free Bareiss elimination. The
    /// interior divisions are exact by the Sylvester identity, so only
    /// [Ring::try_div] is required of the ring.
    pub fn det(&self) -> Result<F::Element, MatrixError> {
        if self.nrows != self.ncols {
            return Err(MatrixError::NotSquare);
        }

        let n = self.nrows as usize;
        if n == 0 {
            return Ok(self.field.one());
        }

        let f = self.field.clone();
        let mut m = self.data.clone();
        let mut sign_negative = false;
        let mut prev = f.one();

        for k in 0..n - 1 {
            if F::is_zero(&m[k * n + k]) {
                let Some(p) = (k + 1..n).find(|&r| !F::is_zero(&m[r * n + k])) else {
                    return Ok(f.zero());
                };
                for c in 0..n {
                    m.swap(k * n + c, p * n + c);
                }
                sign_negative = !sign_negative;
            }

            for i in k + 1..n {
                for j in k + 1..n {
                    let mut e = f.mul(&m[k * n + k], &m[i * n + j]);
                    f.sub_mul_assign(&mut e, &m[i * n + k], &m[k * n + j]);
                    m[i * n + j] = f
                        .try_div(&e, &prev)
                        .expect("Interior division in Bareiss elimination must be exact");
                }
                m[i * n + k] = f.zero();
            }
            prev = m[k * n + k].clone();
        }

        let det = m[n * n - 1].clone();
        Ok(if sign_negative { f.neg(&det) } else { det })
    }
}

impl<F: EuclideanDomain + FractionNormalization> Matrix<F> {
    /// A basis of the right kernel, the solutions of `M x = 0`, over the
    /// fraction field of the entry ring.
    ///
    /// The forward elimination is fraction-free (Bareiss): intermediate
    /// entries stay in the ring and only the back-substitution introduces
    /// denominators. Columns without a pivot are recorded as free; the basis
    /// vector for each free column carries a `1` at that column, which makes
    /// the output deterministic.
    pub fn right_kernel(&self) -> Vec<Vec<Fraction<F>>> {
        let f = &self.field;
        let frac = FractionField::new(f.clone());
        let nrows = self.nrows as usize;
        let ncols = self.ncols as usize;
        let mut m = self.data.clone();

        let mut pivot_cols = vec![];
        let mut row = 0;
        let mut prev = f.one();
        for col in 0..ncols {
            if row == nrows {
                break;
            }

            let Some(p) = (row..nrows).find(|&r| !F::is_zero(&m[r * ncols + col])) else {
                continue;
            };

            if p != row {
                for c in 0..ncols {
                    m.swap(row * ncols + c, p * ncols + c);
                }
            }

            for r in row + 1..nrows {
                for c in col + 1..ncols {
                    let mut e = f.mul(&m[row * ncols + col], &m[r * ncols + c]);
                    f.sub_mul_assign(&mut e, &m[r * ncols + col], &m[row * ncols + c]);
                    m[r * ncols + c] = f
                        .try_div(&e, &prev)
                        .expect("Interior division in Bareiss elimination must be exact");
                }
                m[r * ncols + col] = f.zero();
            }

            prev = m[row * ncols + col].clone();
            pivot_cols.push(col);
            row += 1;
        }

        // back-substitution per free column
        let mut basis = vec![];
        for free in 0..ncols {
            if pivot_cols.contains(&free) {
                continue;
            }

            let mut v = vec![frac.zero(); ncols];
            v[free] = frac.one();
            for (r, &pc) in pivot_cols.iter().enumerate().rev() {
                if pc > free {
                    continue;
                }

                let mut s = frac.zero();
                for c in pc + 1..=free {
                    if !F::is_zero(&m[r * ncols + c]) {
                        frac.add_mul_assign(&mut s, &frac.from_base(m[r * ncols + c].clone()), &v[c]);
                    }
                }
                v[pc] = frac.neg(&frac.div(&s, &frac.from_base(m[r * ncols + pc].clone())));
            }
            basis.push(v);
        }
        basis
    }
}

/// Canonicalize a kernel basis to a single representative vector over the
/// entry ring: repeatedly combine pairs of basis vectors to zero a trailing
/// coordinate until one vector remains, then clear denominators and divide
/// out the gcd of the entries. The choice of representative is a policy, not
/// a mathematical necessity; what matters is that it is deterministic.
pub fn canonical_kernel_vector<F: EuclideanDomain + FractionNormalization>(
    field: &F,
    mut basis: Vec<Vec<Fraction<F>>>,
) -> Option<Vec<F::Element>> {
    if basis.is_empty() {
        return None;
    }

    let frac = FractionField::new(field.clone());
    let n = basis[0].len();
    let mut pos = n;
    while basis.len() > 1 && pos > 0 {
        pos -= 1;
        let Some(current) = basis
            .iter()
            .position(|v| !FractionField::<F>::is_zero(&v[pos]))
        else {
            continue;
        };

        let cur = basis.remove(current);
        for v in &mut basis {
            if FractionField::<F>::is_zero(&v[pos]) {
                continue;
            }
            let vp = v[pos].clone();
            for (c, e) in v.iter_mut().enumerate() {
                let mut t = frac.mul(e, &cur[pos]);
                frac.sub_mul_assign(&mut t, &cur[c], &vp);
                *e = t;
            }
        }
    }

    let v = basis.swap_remove(0);

    // clear denominators by the product of all of them
    let mut den_product = field.one();
    for e in &v {
        den_product = field.mul(&den_product, e.denominator());
    }

    let mut cleared: Vec<F::Element> = v
        .iter()
        .map(|e| {
            let rest = field
                .try_div(&den_product, e.denominator())
                .expect("Denominator must divide the denominator product");
            field.mul(e.numerator(), &rest)
        })
        .collect();

    // divide out the content
    let mut content = field.zero();
    for e in &cleared {
        content = field.gcd(&content, e);
    }
    if !F::is_zero(&content) && !field.is_one(&content) {
        for e in &mut cleared {
            *e = field
                .try_div(e, &content)
                .expect("Content must divide every entry");
        }
    }

    Some(cleared)
}

impl<F: Ring> std::ops::Index<(u32, u32)> for Matrix<F> {
    type Output = F::Element;

    #[inline]
    fn index(&self, (i, j): (u32, u32)) -> &Self::Output {
        &self.data[i as usize * self.ncols as usize + j as usize]
    }
}

impl<F: Ring> InternalOrdering for Matrix<F> {
    fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.data.internal_cmp(&other.data)
    }
}

impl<F: Ring> Debug for Matrix<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<F: Ring> Display for Matrix<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, row) in self.data.chunks(self.ncols as usize).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str("{")?;
            for (j, e) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(",")?;
                }
                self.field.format(e, f)?;
            }
            f.write_str("}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::rational::{Rational, RationalField, Q};

    fn m(rows: Vec<Vec<i64>>) -> Matrix<RationalField> {
        Matrix::from_nested_vec(
            rows.into_iter()
                .map(|r| r.into_iter().map(Rational::from).collect())
                .collect(),
            Q,
        )
        .unwrap()
    }

    #[test]
    fn determinant() {
        let a = m(vec![vec![2, 1, 3], vec![0, 4, 1], vec![1, 1, 1]]);
        assert_eq!(a.det().unwrap(), Rational::from(-6));

        let singular = m(vec![vec![1, 2], vec![2, 4]]);
        assert_eq!(singular.det().unwrap(), Rational::zero());

        let rect = m(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(rect.det(), Err(MatrixError::NotSquare));
    }

    #[test]
    fn determinant_with_pivoting() {
        let a = m(vec![vec![0, 1], vec![1, 0]]);
        assert_eq!(a.det().unwrap(), Rational::from(-1));
    }

    #[test]
    fn kernel() {
        // rank 2, kernel spanned by (1, -2, 1)
        let a = m(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]);
        let k = a.right_kernel();
        assert_eq!(k.len(), 1);
        let v = canonical_kernel_vector(&Q, k).unwrap();
        assert_eq!(v, vec![Rational::one(), Rational::from(-2), Rational::one()]);

        // full rank: empty kernel
        let b = m(vec![vec![1, 0], vec![0, 1]]);
        assert!(b.right_kernel().is_empty());
        assert_eq!(canonical_kernel_vector(&Q, b.right_kernel()), None);
    }

    #[test]
    fn kernel_canonicalization_is_deterministic() {
        // rank 1, two-dimensional kernel
        let a = m(vec![vec![1, 1, 1]]);
        let k = a.right_kernel();
        assert_eq!(k.len(), 2);
        let v = canonical_kernel_vector(&Q, a.right_kernel()).unwrap();
        assert_eq!(v, canonical_kernel_vector(&Q, k).unwrap());
        // the survivor annihilates the row
        assert_eq!(&v[0] + &(&v[1] + &v[2]), Rational::zero());
        assert!(v.iter().any(|e| !e.is_zero()));
    }

    #[test]
    fn multiplication() {
        let a = m(vec![vec![1, 2], vec![3, 4]]);
        let b = m(vec![vec![0, 1], vec![1, 0]]);
        assert_eq!(a.mul(&b).unwrap(), m(vec![vec![2, 1], vec![4, 3]]));
        assert_eq!(
            Matrix::identity(2, Q).mul(&a).unwrap(),
            a
        );
    }
}

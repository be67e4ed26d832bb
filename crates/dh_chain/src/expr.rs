//! Symbolic scalar expressions
//!
//! A small expression tree used to keep transforms in exact, analytic form
//! when a caller asks for it. Construction goes through the smart
//! constructors ([`Expr::sum`], [`Expr::product`], [`Expr::sin_deg`], ...)
//! which fold constants so products of sparse homogeneous transforms stay
//! readable.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::{Error, Result};

/// Values bound to free symbols during evaluation
pub type Substitutions = HashMap<String, f64>;

/// A symbolic scalar expression
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric constant
    Const(f64),
    /// Free symbol, bound at evaluation time
    Symbol(String),
    /// Negation
    Neg(Box<Expr>),
    /// Sum of terms
    Sum(Vec<Expr>),
    /// Product of factors
    Product(Vec<Expr>),
    /// Sine of a radian-valued expression
    Sin(Box<Expr>),
    /// Cosine of a radian-valued expression
    Cos(Box<Expr>),
    /// Degrees converted to radians
    Radians(Box<Expr>),
}

impl Expr {
    pub fn zero() -> Self {
        Expr::Const(0.0)
    }

    pub fn one() -> Self {
        Expr::Const(1.0)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(v) if *v == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(v) if *v == 1.0)
    }

    /// Build a normalized sum: nested sums are flattened, constants folded
    /// into a single trailing term, and zeros dropped.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        let mut constant = 0.0;
        let mut flat = Vec::new();
        for term in terms {
            match term {
                Expr::Const(v) => constant += v,
                Expr::Sum(inner) => {
                    for t in inner {
                        match t {
                            Expr::Const(v) => constant += v,
                            other => flat.push(other),
                        }
                    }
                }
                other => flat.push(other),
            }
        }
        if constant != 0.0 {
            flat.push(Expr::Const(constant));
        }
        match flat.len() {
            0 => Expr::zero(),
            1 => flat.remove(0),
            _ => Expr::Sum(flat),
        }
    }

    /// Build a normalized product: nested products are flattened, negations
    /// and constants collected into one leading coefficient.
    pub fn product(factors: impl IntoIterator<Item = Expr>) -> Self {
        let mut coefficient = 1.0;
        let mut flat = Vec::new();
        let mut pending: Vec<Expr> = factors.into_iter().collect();
        while let Some(factor) = pending.pop() {
            match factor {
                Expr::Const(v) => coefficient *= v,
                Expr::Neg(inner) => {
                    coefficient = -coefficient;
                    pending.push(*inner);
                }
                Expr::Product(inner) => pending.extend(inner),
                other => flat.push(other),
            }
        }
        // popped in reverse
        flat.reverse();

        if coefficient == 0.0 {
            return Expr::zero();
        }
        if flat.is_empty() {
            return Expr::Const(coefficient);
        }
        let body = if flat.len() == 1 {
            flat.remove(0)
        } else {
            Expr::Product(flat)
        };
        if coefficient == 1.0 {
            body
        } else if coefficient == -1.0 {
            Expr::Neg(Box::new(body))
        } else {
            match body {
                Expr::Product(mut inner) => {
                    inner.insert(0, Expr::Const(coefficient));
                    Expr::Product(inner)
                }
                other => Expr::Product(vec![Expr::Const(coefficient), other]),
            }
        }
    }

    /// Sine of an angle given in degrees.
    ///
    /// Whole multiples of 90 degrees reduce to exact constants.
    pub fn sin_deg(degrees: Expr) -> Self {
        match quarter_turns(&degrees) {
            Some(q) => Expr::Const([0.0, 1.0, 0.0, -1.0][q]),
            None => Expr::Sin(Box::new(Expr::Radians(Box::new(degrees)))),
        }
    }

    /// Cosine of an angle given in degrees.
    ///
    /// Whole multiples of 90 degrees reduce to exact constants.
    pub fn cos_deg(degrees: Expr) -> Self {
        match quarter_turns(&degrees) {
            Some(q) => Expr::Const([1.0, 0.0, -1.0, 0.0][q]),
            None => Expr::Cos(Box::new(Expr::Radians(Box::new(degrees)))),
        }
    }

    /// Evaluate to a finite `f64`, binding free symbols from `subs`.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] for an unbound symbol or when any
    /// sub-expression evaluates to a non-finite value.
    pub fn evaluate(&self, subs: &Substitutions) -> Result<f64> {
        let value = match self {
            Expr::Const(v) => *v,
            Expr::Symbol(name) => {
                *subs
                    .get(name)
                    .ok_or_else(|| Error::InvalidParameter {
                        name: name.clone(),
                        reason: "unbound symbol".to_string(),
                    })?
            }
            Expr::Neg(inner) => -inner.evaluate(subs)?,
            Expr::Sum(terms) => terms
                .iter()
                .map(|t| t.evaluate(subs))
                .sum::<Result<f64>>()?,
            Expr::Product(factors) => factors
                .iter()
                .map(|f| f.evaluate(subs))
                .product::<Result<f64>>()?,
            Expr::Sin(inner) => inner.evaluate(subs)?.sin(),
            Expr::Cos(inner) => inner.evaluate(subs)?.cos(),
            Expr::Radians(inner) => inner.evaluate(subs)?.to_radians(),
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::InvalidParameter {
                name: self.label(),
                reason: format!("evaluates to non-finite value {value}"),
            })
        }
    }

    /// Short name for error messages: the constant or symbol itself, or the
    /// first free symbol of a compound expression
    fn label(&self) -> String {
        match self {
            Expr::Const(v) => v.to_string(),
            Expr::Symbol(name) => name.clone(),
            _ => match self.free_symbols().into_iter().next() {
                Some(symbol) => format!("expression in {symbol}"),
                None => "constant expression".to_string(),
            },
        }
    }

    /// Replace bound symbols with constants and re-normalize.
    ///
    /// Symbols missing from `subs` are left free.
    pub fn substitute(&self, subs: &Substitutions) -> Expr {
        match self {
            Expr::Const(v) => Expr::Const(*v),
            Expr::Symbol(name) => match subs.get(name) {
                Some(v) => Expr::Const(*v),
                None => self.clone(),
            },
            Expr::Neg(inner) => -inner.substitute(subs),
            Expr::Sum(terms) => Expr::sum(terms.iter().map(|t| t.substitute(subs))),
            Expr::Product(factors) => Expr::product(factors.iter().map(|f| f.substitute(subs))),
            Expr::Sin(inner) => match inner.as_ref() {
                Expr::Radians(deg) => Expr::sin_deg(deg.substitute(subs)),
                other => Expr::Sin(Box::new(other.substitute(subs))),
            },
            Expr::Cos(inner) => match inner.as_ref() {
                Expr::Radians(deg) => Expr::cos_deg(deg.substitute(subs)),
                other => Expr::Cos(Box::new(other.substitute(subs))),
            },
            Expr::Radians(inner) => Expr::Radians(Box::new(inner.substitute(subs))),
        }
    }

    /// [`substitute`](Self::substitute), then fold every constant
    /// trigonometric term into a number.
    ///
    /// Quarter turns still reduce exactly. Use this when the result is
    /// headed for numeric evaluation rather than display.
    pub fn reduce(&self, subs: &Substitutions) -> Expr {
        match self {
            Expr::Const(_) | Expr::Symbol(_) => self.substitute(subs),
            Expr::Neg(inner) => -inner.reduce(subs),
            Expr::Sum(terms) => Expr::sum(terms.iter().map(|t| t.reduce(subs))),
            Expr::Product(factors) => Expr::product(factors.iter().map(|f| f.reduce(subs))),
            Expr::Sin(inner) => match inner.as_ref() {
                Expr::Radians(deg) => match deg.reduce(subs) {
                    deg if quarter_turns(&deg).is_some() => Expr::sin_deg(deg),
                    Expr::Const(v) => Expr::Const(v.to_radians().sin()),
                    deg => Expr::sin_deg(deg),
                },
                other => match other.reduce(subs) {
                    Expr::Const(v) => Expr::Const(v.sin()),
                    arg => Expr::Sin(Box::new(arg)),
                },
            },
            Expr::Cos(inner) => match inner.as_ref() {
                Expr::Radians(deg) => match deg.reduce(subs) {
                    deg if quarter_turns(&deg).is_some() => Expr::cos_deg(deg),
                    Expr::Const(v) => Expr::Const(v.to_radians().cos()),
                    deg => Expr::cos_deg(deg),
                },
                other => match other.reduce(subs) {
                    Expr::Const(v) => Expr::Const(v.cos()),
                    arg => Expr::Cos(Box::new(arg)),
                },
            },
            Expr::Radians(inner) => match inner.reduce(subs) {
                Expr::Const(v) => Expr::Const(v.to_radians()),
                arg => Expr::Radians(Box::new(arg)),
            },
        }
    }

    /// Names of all free symbols, sorted
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Const(_) => {}
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) | Expr::Sin(inner) | Expr::Cos(inner) | Expr::Radians(inner) => {
                inner.collect_symbols(out)
            }
            Expr::Sum(items) | Expr::Product(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
        }
    }

    /// Render as LaTeX math (without surrounding `$` delimiters).
    pub fn to_latex(&self) -> String {
        match self {
            Expr::Const(v) => format!("{v}"),
            Expr::Symbol(name) => latex_symbol(name),
            Expr::Neg(inner) => format!("- {}", latex_factor(inner)),
            Expr::Sum(terms) => {
                let mut out = String::new();
                for (i, term) in terms.iter().enumerate() {
                    match term {
                        Expr::Neg(inner) if i > 0 => {
                            out.push_str(" - ");
                            out.push_str(&latex_factor(inner));
                        }
                        Expr::Const(v) if i > 0 && *v < 0.0 => {
                            out.push_str(&format!(" - {}", -v));
                        }
                        other => {
                            if i > 0 {
                                out.push_str(" + ");
                            }
                            out.push_str(&other.to_latex());
                        }
                    }
                }
                out
            }
            Expr::Product(factors) => factors
                .iter()
                .map(latex_factor)
                .collect::<Vec<_>>()
                .join(" "),
            Expr::Sin(inner) => format!("\\sin{{\\left({} \\right)}}", inner.to_latex()),
            Expr::Cos(inner) => format!("\\cos{{\\left({} \\right)}}", inner.to_latex()),
            Expr::Radians(inner) => format!("\\frac{{\\pi {}}}{{180}}", latex_factor(inner)),
        }
    }
}

/// Exact quarter-turn index in `0..4` when `degrees` is a constant whole
/// multiple of 90.
fn quarter_turns(degrees: &Expr) -> Option<usize> {
    match degrees {
        Expr::Const(v) if v.is_finite() && (v / 90.0).fract() == 0.0 => {
            Some((v / 90.0).rem_euclid(4.0) as usize)
        }
        _ => None,
    }
}

fn latex_factor(expr: &Expr) -> String {
    match expr {
        Expr::Sum(_) => format!("\\left({}\\right)", expr.to_latex()),
        _ => expr.to_latex(),
    }
}

/// `theta1` -> `\theta_{1}`, `a2` -> `a_{2}`, `d_tool` -> `d_{tool}`
fn latex_symbol(name: &str) -> String {
    let split = name
        .find(|c: char| c.is_ascii_digit() || c == '_')
        .unwrap_or(name.len());
    let (base, sub) = name.split_at(split);
    let sub = sub.trim_start_matches('_');

    let base = match base {
        "alfa" => "\\alpha".to_string(),
        "tita" => "\\theta".to_string(),
        "alpha" | "beta" | "gamma" | "delta" | "theta" | "phi" | "psi" | "omega" => {
            format!("\\{base}")
        }
        other => other.to_string(),
    };

    if sub.is_empty() {
        base
    } else {
        format!("{base}_{{{sub}}}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(v) => write!(f, "{v}"),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Neg(inner) => match inner.as_ref() {
                Expr::Sum(_) => write!(f, "-({inner})"),
                _ => write!(f, "-{inner}"),
            },
            Expr::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    match term {
                        Expr::Neg(inner) if i > 0 => write!(f, " - {inner}")?,
                        Expr::Const(v) if i > 0 && *v < 0.0 => write!(f, " - {}", -v)?,
                        other if i > 0 => write!(f, " + {other}")?,
                        other => write!(f, "{other}")?,
                    }
                }
                Ok(())
            }
            Expr::Product(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    match factor {
                        Expr::Sum(_) => write!(f, "({factor})")?,
                        _ => write!(f, "{factor}")?,
                    }
                }
                Ok(())
            }
            Expr::Sin(inner) => write!(f, "sin({inner})"),
            Expr::Cos(inner) => write!(f, "cos({inner})"),
            Expr::Radians(inner) => write!(f, "rad({inner})"),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::symbol(name)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::sum([self, rhs])
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::sum([self, -rhs])
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::product([self, rhs])
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Expr::Const(v) => Expr::Const(-v),
            Expr::Neg(inner) => *inner,
            other => Expr::Neg(Box::new(other)),
        }
    }
}
